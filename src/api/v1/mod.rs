//! v1 question answering API

pub mod ask;
pub mod corpus;

use axum::{routing::post, Router};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/ask", post(ask::ask))
        .route("/corpus/reload", post(corpus::reload_corpus))
}
