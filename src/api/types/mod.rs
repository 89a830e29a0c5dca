//! Request and response bodies of the HTTP API

pub mod ask;
pub mod error;
pub mod json;

pub use ask::{AskRequest, ReloadResponse};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
