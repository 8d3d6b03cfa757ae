//! Rejections of malformed requests.

use thiserror::Error;

/// A request that cannot be accepted as sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join("; "))]
pub struct ValidationError {
    /// Machine-readable reason, when one exists
    pub code: Option<&'static str>,

    /// Human-readable reasons, at least one
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            messages: vec![message.into()],
        }
    }

    pub fn with_code(message: impl Into<String>, code: &'static str) -> Self {
        Self {
            code: Some(code),
            messages: vec![message.into()],
        }
    }

    /// `Ok` when nothing was collected, otherwise every message at once
    pub fn check(messages: Vec<String>) -> Result<(), Self> {
        if messages.is_empty() {
            Ok(())
        } else {
            Err(Self {
                code: None,
                messages,
            })
        }
    }
}
