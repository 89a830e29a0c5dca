//! OpenAI embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use super::HttpClientTrait;
use crate::domain::embedding::{
    Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage,
};
use crate::domain::DomainError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// OpenAI `/v1/embeddings` client
#[derive(Debug)]
pub struct OpenAiEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
}

impl<C: HttpClientTrait> OpenAiEmbeddingProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<EmbeddingResponse, DomainError> {
        let response: OpenAiEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("openai", format!("Failed to parse embedding response: {}", e))
        })?;

        let embeddings: Vec<Embedding> = response
            .data
            .into_iter()
            .map(|d| Embedding::new(d.index, d.embedding))
            .collect();

        let usage = response
            .usage
            .map(|u| EmbeddingUsage::new(u.prompt_tokens, u.total_tokens))
            .unwrap_or_default();

        Ok(EmbeddingResponse::new(response.model, embeddings, usage))
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for OpenAiEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        if request.is_empty() {
            return Ok(EmbeddingResponse::new(
                request.model(),
                Vec::new(),
                EmbeddingUsage::default(),
            ));
        }

        let body = serde_json::to_value(&request).map_err(|e| {
            DomainError::internal(format!("Failed to encode embedding request: {}", e))
        })?;

        let response = self
            .client
            .post_json(&self.embeddings_url(), self.headers(), &body)
            .await?;

        let parsed = self.parse_response(response)?;
        if parsed.embeddings().len() != request.len() {
            return Err(DomainError::provider(
                "openai",
                format!(
                    "Expected {} embeddings, got {}",
                    request.len(),
                    parsed.embeddings().len()
                ),
            ));
        }

        Ok(parsed)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

// OpenAI API types for embeddings

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    #[serde(default)]
    model: String,
    data: Vec<OpenAiEmbeddingData>,
    usage: Option<OpenAiEmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::{HttpClient, MockHttpClient};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_URL: &str = "https://api.openai.com/v1/embeddings";

    fn mock_response(count: usize, dimensions: usize) -> serde_json::Value {
        let data: Vec<serde_json::Value> = (0..count)
            .rev()
            .map(|i| {
                let embedding: Vec<f32> = (0..dimensions).map(|j| (i + j) as f32 * 0.001).collect();
                serde_json::json!({ "index": i, "embedding": embedding, "object": "embedding" })
            })
            .collect();

        serde_json::json!({
            "model": "text-embedding-3-small",
            "data": data,
            "usage": { "prompt_tokens": 8, "total_tokens": 8 }
        })
    }

    #[tokio::test]
    async fn test_embed_batch_in_index_order() {
        let client = MockHttpClient::new().with_response(TEST_URL, mock_response(3, 4));
        let provider = OpenAiEmbeddingProvider::new(client, "k");

        let request = EmbeddingRequest::new(
            "text-embedding-3-small",
            vec!["a".into(), "b".into(), "c".into()],
        );
        let response = provider.embed(request).await.unwrap();

        assert_eq!(response.embeddings().len(), 3);
        assert_eq!(response.embeddings()[0].index(), 0);
        assert_eq!(response.usage().total_tokens, 8);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_error() {
        let client = MockHttpClient::new().with_response(TEST_URL, mock_response(1, 4));
        let provider = OpenAiEmbeddingProvider::new(client, "k");

        let request = EmbeddingRequest::new("m", vec!["a".into(), "b".into()]);
        assert!(provider.embed(request).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_request_skips_http() {
        let provider = OpenAiEmbeddingProvider::new(MockHttpClient::new(), "k");
        let response = provider
            .embed(EmbeddingRequest::new("m", Vec::new()))
            .await
            .unwrap();

        assert!(response.embeddings().is_empty());
    }

    #[tokio::test]
    async fn test_default_model_override() {
        let provider =
            OpenAiEmbeddingProvider::new(MockHttpClient::new(), "k").with_model("custom-embed");
        assert_eq!(provider.default_model(), "custom-embed");
    }

    #[tokio::test]
    async fn test_against_http_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(serde_json::json!({"input": ["loftshøjde"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_response(1, 3)))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddingProvider::with_base_url(HttpClient::new(), "k", server.uri());
        let response = provider
            .embed(EmbeddingRequest::single("text-embedding-3-small", "loftshøjde"))
            .await
            .unwrap();

        assert_eq!(response.first().unwrap().dimensions(), 3);
    }
}
