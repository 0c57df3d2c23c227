//! Fetch Responses
//!
//! Response wrapper with status checks and body decoding.

use crate::{NetError, Response};

/// Fetch response with convenience methods
#[derive(Debug, Clone)]
pub struct FetchResponse {
    inner: Response,
}

impl FetchResponse {
    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.inner.status
    }

    /// Check if response is OK (2xx)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.inner.status)
    }

    /// Turn a non-2xx response into `NetError::HttpError`
    pub fn error_for_status(self) -> Result<Self, NetError> {
        if self.ok() {
            Ok(self)
        } else {
            Err(NetError::HttpError { status: self.status() })
        }
    }

    /// Get header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get body as text
    pub fn text(&self) -> Result<String, NetError> {
        String::from_utf8(self.inner.body.clone()).map_err(|e| NetError::Decode(e.to_string()))
    }

    /// Decode body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, NetError> {
        serde_json::from_slice(&self.inner.body).map_err(|e| NetError::Decode(e.to_string()))
    }

    /// Raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.inner.body
    }
}

impl From<Response> for FetchResponse {
    fn from(inner: Response) -> Self {
        Self { inner }
    }
}
