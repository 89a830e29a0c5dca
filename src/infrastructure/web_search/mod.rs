//! Web search provider implementations

mod duckduckgo;

pub use duckduckgo::{
    DuckDuckGoProvider, DEFAULT_DUCKDUCKGO_API_URL, DEFAULT_DUCKDUCKGO_HTML_URL,
    DEFAULT_PRIORITY_DOMAINS,
};
