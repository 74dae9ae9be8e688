//! JSON helpers
//!
//! Thin wrappers over `serde_json` that turn encoding errors into attributed
//! failures, so test operations can use `?`.

use crate::assert::TestCase;
use crate::failure::Failure;
use crate::http::WebTestCase;
use serde::de::DeserializeOwned;
use serde::Serialize;

impl TestCase {
    /// Convert `value` to JSON; an error fails the test operation
    #[track_caller]
    pub fn marshal<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>, Failure> {
        match serde_json::to_vec(value) {
            Ok(body) => Ok(body),
            Err(e) => Err(self.fail(format!("Failed to marshal data: {}", e))),
        }
    }

    /// Parse JSON `bytes` into `V`; an error fails the test operation
    #[track_caller]
    pub fn unmarshal_bytes<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V, Failure> {
        match serde_json::from_slice(bytes) {
            Ok(value) => Ok(value),
            Err(e) => Err(self.fail(format!("Failed to unmarshal response body data: {}", e))),
        }
    }
}

impl WebTestCase {
    /// Parse the latest response body into `V`
    ///
    /// Fails with `Response is nil` when no response was captured.
    #[track_caller]
    pub fn unmarshal<V: DeserializeOwned>(&self) -> Result<V, Failure> {
        if self.response().is_none() {
            return Err(self.missing_response());
        }
        self.unmarshal_bytes(self.response_body())
    }
}
