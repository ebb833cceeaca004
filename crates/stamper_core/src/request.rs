use std::fmt;

use serde::{Deserialize, Serialize};

/// Guidance shown when the target URL fails the validity gate.
pub const URL_GUIDANCE: &str = "Enter a valid URL";

/// Minute increment the backend uses when nothing else was entered.
pub const DEFAULT_MINUTE_INCREMENT: &str = "5";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Enter a valid URL")]
    InvalidUrl { input: String },
}

/// Opaque pass-through value; the client attaches no meaning to it.
///
/// Serialized untagged so `"5"` stays a JSON string and `5` a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinuteIncrement {
    Number(i64),
    Text(String),
}

impl Default for MinuteIncrement {
    fn default() -> Self {
        Self::Text(DEFAULT_MINUTE_INCREMENT.to_string())
    }
}

impl From<&str> for MinuteIncrement {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MinuteIncrement {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MinuteIncrement {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl fmt::Display for MinuteIncrement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinuteIncrement::Number(n) => write!(f, "{n}"),
            MinuteIncrement::Text(text) => f.write_str(text),
        }
    }
}

/// A job as entered by the caller. Fields are fixed once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    target_url: String,
    minute_increment: MinuteIncrement,
}

impl JobRequest {
    pub fn new(target_url: impl Into<String>, minute_increment: impl Into<MinuteIncrement>) -> Self {
        Self {
            target_url: target_url.into(),
            minute_increment: minute_increment.into(),
        }
    }

    /// The URL exactly as entered; this is what goes on the wire.
    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn minute_increment(&self) -> &MinuteIncrement {
        &self.minute_increment
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_target_url(&self.target_url)
    }
}

/// Scheme marker a target URL must carry somewhere in its text.
const SCHEME_MARKER: &str = "http";

/// Minimal validity gate: the input must contain the `http` scheme marker.
///
/// Syntax is not checked further; the backend decides what it can fetch.
pub fn validate_target_url(input: &str) -> Result<(), ValidationError> {
    if input.contains(SCHEME_MARKER) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl {
            input: input.to_string(),
        })
    }
}

/// Correlation key handed out by the backend for a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    request_id: String,
}

impl JobHandle {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.request_id)
    }
}
