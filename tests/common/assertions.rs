//! Response validation and assertion utilities

use reqwest::{Response, StatusCode};

/// Response validation helpers
pub trait ResponseAssertions {
    /// Assert response has expected status code
    fn assert_status(&self, expected: StatusCode) -> &Self;

    /// Get response text for further assertions
    async fn text_for_assertions(self) -> Result<String, Box<dyn std::error::Error>>;
}

impl ResponseAssertions for Response {
    fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status(),
            expected,
            "Expected status {}, got {}",
            expected,
            self.status()
        );
        self
    }

    async fn text_for_assertions(self) -> Result<String, Box<dyn std::error::Error>> {
        Ok(self.text().await?)
    }
}
