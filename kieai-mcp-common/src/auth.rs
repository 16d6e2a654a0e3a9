//! Static bearer credential for the kie.ai API.
//!
//! kie.ai authenticates every request with a single API key sent as an
//! `Authorization: Bearer` header. The key is wrapped so that it never shows
//! up in `Debug` output or structured log fields.

use std::fmt;

/// A kie.ai API key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key, rejecting empty or whitespace-only values.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The value of the `Authorization` header for this key.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
