use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;

    async fn get_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, DomainError>;

    async fn get_text(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        query: &[(&str, &str)],
    ) -> Result<String, DomainError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("regulation-rag-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, DomainError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DomainError::provider("http", format!("Request timed out: {}", e))
            } else {
                DomainError::provider("http", format!("Request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                "http",
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        Ok(response)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn with_headers(
    mut request: reqwest::RequestBuilder,
    headers: Vec<(&str, &str)>,
) -> reqwest::RequestBuilder {
    for (key, value) in headers {
        request = request.header(key, value);
    }
    request
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let request = with_headers(self.client.post(url), headers).json(body);
        let response = self.send(request).await?;

        response
            .json()
            .await
            .map_err(|e| DomainError::provider("http", format!("Failed to parse response: {}", e)))
    }

    async fn get_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, DomainError> {
        let request = with_headers(self.client.get(url), headers).query(query);
        let response = self.send(request).await?;

        // Some APIs answer JSON with a text/javascript content type
        let text = response
            .text()
            .await
            .map_err(|e| DomainError::provider("http", format!("Failed to read response: {}", e)))?;
        serde_json::from_str(&text)
            .map_err(|e| DomainError::provider("http", format!("Failed to parse response: {}", e)))
    }

    async fn get_text(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        query: &[(&str, &str)],
    ) -> Result<String, DomainError> {
        let request = with_headers(self.client.get(url), headers).query(query);
        let response = self.send(request).await?;

        response
            .text()
            .await
            .map_err(|e| DomainError::provider("http", format!("Failed to read response: {}", e)))
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// URL-keyed canned responses
    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        responses: RwLock<HashMap<String, serde_json::Value>>,
        texts: RwLock<HashMap<String, String>>,
        errors: RwLock<HashMap<String, String>>,
        bodies: RwLock<Vec<serde_json::Value>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: impl Into<String>, response: serde_json::Value) -> Self {
            self.responses.write().unwrap().insert(url.into(), response);
            self
        }

        pub fn with_text(self, url: impl Into<String>, text: impl Into<String>) -> Self {
            self.texts.write().unwrap().insert(url.into(), text.into());
            self
        }

        pub fn with_error(self, url: impl Into<String>, error: impl Into<String>) -> Self {
            self.errors.write().unwrap().insert(url.into(), error.into());
            self
        }

        /// Bodies of every POST received, in order
        pub fn sent_bodies(&self) -> Vec<serde_json::Value> {
            self.bodies.read().unwrap().clone()
        }

        fn check_error(&self, url: &str) -> Result<(), DomainError> {
            match self.errors.read().unwrap().get(url) {
                Some(error) => Err(DomainError::provider("mock", error)),
                None => Ok(()),
            }
        }

        fn json_for(&self, url: &str) -> Result<serde_json::Value, DomainError> {
            self.check_error(url)?;
            self.responses
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| DomainError::provider("mock", format!("No mock response for {}", url)))
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn post_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            body: &serde_json::Value,
        ) -> Result<serde_json::Value, DomainError> {
            self.bodies.write().unwrap().push(body.clone());
            self.json_for(url)
        }

        async fn get_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            _query: &[(&str, &str)],
        ) -> Result<serde_json::Value, DomainError> {
            self.json_for(url)
        }

        async fn get_text(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            _query: &[(&str, &str)],
        ) -> Result<String, DomainError> {
            self.check_error(url)?;
            self.texts
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| DomainError::provider("mock", format!("No mock text for {}", url)))
        }
    }
}
