use std::fmt;

use stamper_core::{JobHandle, JobId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    JobAccepted {
        job_id: JobId,
        handle: JobHandle,
    },
    /// Full accumulated text so far.
    Text {
        job_id: JobId,
        full: String,
    },
    ScrollToBottom {
        job_id: JobId,
    },
    Error {
        job_id: JobId,
        message: String,
    },
    JobCompleted {
        job_id: JobId,
        result: Result<JobOutcome, FailureKind>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub handle: JobHandle,
    pub chunks: usize,
    pub bytes: u64,
    pub chars: usize,
    pub outcome: StreamOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The stream was opened and ran until completion or cancellation.
    Streamed(StreamSummary),
    /// Cancelled before the backend handed out a request id.
    CancelledBeforeAccept,
}

impl JobOutcome {
    pub fn was_cancelled(&self) -> bool {
        match self {
            JobOutcome::Streamed(summary) => summary.outcome == StreamOutcome::Cancelled,
            JobOutcome::CancelledBeforeAccept => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidResponse,
    Decode,
    SessionClosed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::SessionClosed => write!(f, "session closed"),
        }
    }
}

/// Submission request failed; `message` is the human readable description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(map_reqwest_error(&err), err.to_string())
    }
}

/// Mid-stream failure; the session is terminal once this is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StreamError {
    pub kind: FailureKind,
    pub message: String,
}

impl StreamError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(map_reqwest_error(&err), err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SubmitError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SubmitError::Validation(_) => FailureKind::InvalidUrl,
            SubmitError::Transport(err) => err.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobFailure {
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl JobFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            JobFailure::Submit(err) => err.kind(),
            JobFailure::Stream(err) => err.kind.clone(),
        }
    }
}

fn map_reqwest_error(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        return FailureKind::Timeout;
    }
    if let Some(status) = err.status() {
        return FailureKind::HttpStatus(status.as_u16());
    }
    FailureKind::Network
}
