use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Validation, Split::Test];

    /// Name used for hub queries and as the output file stem.
    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Split::ALL
            .into_iter()
            .find(|split| split.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared shape of a raw text source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// One JSON value holding an array of records.
    JsonArray,
    /// One JSON value per non-blank line.
    Ndjson,
    /// One record per non-blank line, either a JSON object or `<tag> ... </tag>` sections.
    DelimitedLinesAsJson,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// Plain GET against a URL; pre-signed query strings are passed through untouched.
    Http { url: String, format: SourceFormat },
    /// Dataset-hosting identifier loaded through the rows API.
    Hub { dataset: String, config: String },
}

impl Source {
    pub fn http(url: impl Into<String>, format: SourceFormat) -> Self {
        Source::Http {
            url: url.into(),
            format,
        }
    }

    pub fn hub(dataset: impl Into<String>, config: impl Into<String>) -> Self {
        Source::Hub {
            dataset: dataset.into(),
            config: config.into(),
        }
    }

    pub fn is_hub(&self) -> bool {
        matches!(self, Source::Hub { .. })
    }

    /// Short human-readable location, used in logs.
    pub fn describe(&self) -> String {
        match self {
            Source::Http { url, .. } => strip_query(url).to_string(),
            Source::Hub { dataset, config } => format!("hub:{dataset}[{config}]"),
        }
    }
}

// Pre-signed URLs carry credentials in the query string; keep them out of logs.
fn strip_query(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

/// One dataset split: where to get it and where it lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    pub split: Split,
    pub primary: Source,
    #[serde(default)]
    pub fallback: Option<Source>,
    /// Relative to the data directory.
    pub output_path: PathBuf,
}

impl DatasetSpec {
    pub fn new(name: impl Into<String>, split: Split, primary: Source) -> Self {
        let name = name.into();
        let output_path = default_output_path(&name, split);
        Self {
            name,
            split,
            primary,
            fallback: None,
            output_path,
        }
    }

    pub fn with_fallback(mut self, fallback: Source) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn key(&self) -> SplitKey {
        SplitKey {
            dataset: self.name.clone(),
            split: self.split,
        }
    }
}

pub fn default_output_path(name: &str, split: Split) -> PathBuf {
    PathBuf::from(name).join(format!("{}.json", split.as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SplitKey {
    pub dataset: String,
    pub split: Split,
}

impl fmt::Display for SplitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset, self.split)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
    Primary,
    Fallback,
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTier::Primary => f.write_str("primary"),
            SourceTier::Fallback => f.write_str("fallback"),
        }
    }
}
