use std::borrow::Cow;

use crate::request::Headers;

/// A well-formed HTTP response, copied field for field from the engine.
///
/// Any status code lands here, 4xx and 5xx included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(code: u16, headers: Headers, body: Vec<u8>) -> Self {
        Response {
            code,
            headers,
            body,
        }
    }

    /// Whether the status code falls outside 2xx. Informational only.
    pub fn is_error(&self) -> bool {
        !(200..=299).contains(&self.code)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
