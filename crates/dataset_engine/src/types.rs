use std::fmt;

use dataset_core::{SourceTier, SplitKey, SplitReport, SplitStage};

/// One dataset example. Canonical datasets yield JSON objects.
pub type Record = serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitProgress {
    pub key: SplitKey,
    pub stage: SplitStage,
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(SplitProgress),
    /// A tier gave up; the fallback (if any) is tried next.
    TierFailed {
        key: SplitKey,
        tier: SourceTier,
        error: FetchError,
    },
    SplitCompleted(SplitReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    /// Server-declared type; informational only, decoding sniffs the bytes.
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    EmptyBody,
    InvalidResponse,
    TruncatedRows,
    PartialSplit,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::EmptyBody => write!(f, "empty body"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::TruncatedRows => write!(f, "truncated rows"),
            FailureKind::PartialSplit => write!(f, "partial split"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
