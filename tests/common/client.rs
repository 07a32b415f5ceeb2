//! HTTP client testing utilities

use std::time::Duration;

use reqwest::{Client, Response};

/// HTTP testing client wrapper
pub struct TestClient {
    pub client: Client,
}

impl TestClient {
    /// Create a new test client
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        TestClient { client }
    }

    /// Perform a GET request
    pub async fn get(&self, url: &str) -> Result<Response, Box<dyn std::error::Error>> {
        let response = self.client.get(url).send().await?;
        Ok(response)
    }

    /// Perform a GET request with a single extra header
    pub async fn get_with_header(
        &self,
        url: &str,
        name: &str,
        value: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let response = self.client.get(url).header(name, value).send().await?;
        Ok(response)
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}
