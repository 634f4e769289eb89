use std::fmt;

use thiserror::Error;

/// Lifecycle of a single dataset split through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitStage {
    #[default]
    NotStarted,
    Fetching,
    Fetched,
    FetchFailed,
    Decoding,
    Decoded,
    DecodeFailed,
    Normalizing,
    Normalized,
    NormalizeFailed,
    Persisting,
    Done,
    PersistFailed,
}

impl SplitStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, SplitStage::Done) || self.is_failure()
    }

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            SplitStage::FetchFailed
                | SplitStage::DecodeFailed
                | SplitStage::NormalizeFailed
                | SplitStage::PersistFailed
        )
    }

    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            SplitStage::Fetching
                | SplitStage::Decoding
                | SplitStage::Normalizing
                | SplitStage::Persisting
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            SplitStage::NotStarted => "not started",
            SplitStage::Fetching => "fetching",
            SplitStage::Fetched => "fetched",
            SplitStage::FetchFailed => "fetch failed",
            SplitStage::Decoding => "decoding",
            SplitStage::Decoded => "decoded",
            SplitStage::DecodeFailed => "decode failed",
            SplitStage::Normalizing => "normalizing",
            SplitStage::Normalized => "normalized",
            SplitStage::NormalizeFailed => "normalize failed",
            SplitStage::Persisting => "persisting",
            SplitStage::Done => "done",
            SplitStage::PersistFailed => "persist failed",
        }
    }
}

impl fmt::Display for SplitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMsg {
    /// Enter the next in-progress stage.
    Begin,
    /// The in-progress stage completed.
    Succeeded,
    /// The in-progress stage failed; terminal.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition from {from} on {msg:?}")]
pub struct InvalidTransition {
    pub from: SplitStage,
    pub msg: StageMsg,
}

/// Pure transition function: applies a message to a stage.
pub fn update(stage: SplitStage, msg: StageMsg) -> Result<SplitStage, InvalidTransition> {
    use SplitStage::*;
    use StageMsg::*;

    let next = match (stage, msg) {
        (NotStarted, Begin) => Fetching,
        (Fetching, Succeeded) => Fetched,
        (Fetching, Failed) => FetchFailed,
        (Fetched, Begin) => Decoding,
        (Decoding, Succeeded) => Decoded,
        (Decoding, Failed) => DecodeFailed,
        (Decoded, Begin) => Normalizing,
        (Normalizing, Succeeded) => Normalized,
        (Normalizing, Failed) => NormalizeFailed,
        (Normalized, Begin) => Persisting,
        (Persisting, Succeeded) => Done,
        (Persisting, Failed) => PersistFailed,
        (from, msg) => return Err(InvalidTransition { from, msg }),
    };
    Ok(next)
}
