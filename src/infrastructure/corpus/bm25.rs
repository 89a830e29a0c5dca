//! BM25 keyword index backed by an in-RAM tantivy index
//!
//! Passages are indexed with tantivy's default analyzer (Unicode word split,
//! lower-cased) and every stored document carries its position in the passage
//! list, so hits map straight back to passages.

use tantivy::collector::TopDocs;
use tantivy::query::BooleanQuery;
use tantivy::schema::{Field, Schema, Value, INDEXED, STORED, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use crate::domain::DomainError;

const WRITER_MEMORY_BYTES: usize = 50_000_000;

#[derive(Clone)]
pub struct Bm25Index {
    index: Index,
    reader: IndexReader,
    content: Field,
    position: Field,
    len: usize,
}

impl std::fmt::Debug for Bm25Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bm25Index").field("documents", &self.len).finish()
    }
}

fn index_error(e: tantivy::TantivyError) -> DomainError {
    DomainError::corpus(format!("Keyword index error: {}", e))
}

impl Bm25Index {
    pub fn new<S: AsRef<str>>(documents: &[S]) -> Result<Self, DomainError> {
        let mut schema_builder = Schema::builder();
        let content = schema_builder.add_text_field("content", TEXT);
        let position = schema_builder.add_u64_field("position", INDEXED | STORED);
        let index = Index::create_in_ram(schema_builder.build());

        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_MEMORY_BYTES)
            .map_err(index_error)?;
        for (i, document) in documents.iter().enumerate() {
            writer
                .add_document(doc!(
                    content => document.as_ref(),
                    position => i as u64,
                ))
                .map_err(index_error)?;
        }
        writer.commit().map_err(index_error)?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(index_error)?;

        Ok(Self {
            index,
            reader,
            content,
            position,
            len: documents.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Query terms as the index analyzer produces them
    fn terms(&self, query: &str) -> Result<Vec<Term>, DomainError> {
        let mut analyzer = self
            .index
            .tokenizer_for_field(self.content)
            .map_err(index_error)?;
        let mut terms = Vec::new();
        let mut stream = analyzer.token_stream(query);
        stream.process(&mut |token| {
            terms.push(Term::from_field_text(self.content, &token.text));
        });
        Ok(terms)
    }

    /// Top `k` passage positions with a positive score, best first
    ///
    /// Equal scores keep document order.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<(usize, f64)>, DomainError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let terms = self.terms(query)?;
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let query = BooleanQuery::new_multiterms_query(terms);
        let hits = searcher
            .search(&query, &TopDocs::with_limit(k))
            .map_err(index_error)?;

        let mut scored = Vec::with_capacity(hits.len());
        for (score, address) in hits {
            let document: TantivyDocument = searcher.doc(address).map_err(index_error)?;
            let position = document
                .get_first(self.position)
                .and_then(|value| value.as_u64())
                .ok_or_else(|| DomainError::corpus("Keyword hit without a passage position"))?;
            if score > 0.0 {
                scored.push((position as usize, f64::from(score)));
            }
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(scored)
    }
}
