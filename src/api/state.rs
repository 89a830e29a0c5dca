//! Application state shared by the handlers

use std::sync::Arc;

use crate::infrastructure::services::{CorpusService, QuestionService};

#[derive(Debug, Clone)]
pub struct AppState {
    pub questions: Arc<QuestionService>,
    pub corpus: Arc<CorpusService>,
}

impl AppState {
    pub fn new(questions: Arc<QuestionService>, corpus: Arc<CorpusService>) -> Self {
        Self { questions, corpus }
    }
}
