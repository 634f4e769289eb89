use std::path::PathBuf;

use crate::spec::{SourceTier, SplitKey};
use crate::state::SplitStage;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSuccess {
    pub records: usize,
    pub bytes_written: u64,
    pub output_path: PathBuf,
    pub tier: SourceTier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFailure {
    /// Terminal `*Failed` stage the split ended in.
    pub stage: SplitStage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    pub key: SplitKey,
    pub outcome: Result<SplitSuccess, SplitFailure>,
}

impl SplitReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReport {
    pub name: String,
    pub title: String,
    pub homepage: Option<String>,
    pub splits: Vec<SplitReport>,
}

impl DatasetReport {
    /// True only when every split landed on disk.
    pub fn succeeded(&self) -> bool {
        !self.splits.is_empty() && self.splits.iter().all(SplitReport::succeeded)
    }

    pub fn record_count(&self) -> usize {
        self.splits
            .iter()
            .filter_map(|s| s.outcome.as_ref().ok())
            .map(|s| s.records)
            .sum()
    }

    pub fn failed_splits(&self) -> impl Iterator<Item = (&SplitKey, &SplitFailure)> {
        self.splits
            .iter()
            .filter_map(|s| s.outcome.as_ref().err().map(|f| (&s.key, f)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub datasets: Vec<DatasetReport>,
}

impl RunSummary {
    pub fn any_failed(&self) -> bool {
        self.datasets.iter().any(|d| !d.succeeded())
    }

    pub fn all_failed(&self) -> bool {
        !self.datasets.is_empty()
            && self
                .datasets
                .iter()
                .all(|d| d.splits.iter().all(|s| !s.succeeded()))
    }

    /// Human-readable summary, one entry per output line.
    pub fn render(&self) -> Vec<String> {
        let rule = "=".repeat(RULE_WIDTH);
        let width = self
            .datasets
            .iter()
            .map(|d| d.title.chars().count() + 1)
            .max()
            .unwrap_or(0);

        let mut lines = vec![rule.clone(), "DOWNLOAD SUMMARY".to_string(), rule.clone()];
        for dataset in &self.datasets {
            let status = if dataset.succeeded() {
                "✓ SUCCESS"
            } else {
                "✗ FAILED"
            };
            let label = format!("{}:", dataset.title);
            lines.push(format!("{label:<width$} {status}"));
        }
        lines.push(rule);

        for dataset in &self.datasets {
            let written: Vec<_> = dataset
                .splits
                .iter()
                .filter_map(|s| s.outcome.as_ref().ok())
                .collect();
            if !written.is_empty() {
                lines.push(String::new());
                lines.push(format!("{} files:", dataset.title));
                for success in written {
                    lines.push(format!(
                        "  - {} ({} records, {} tier)",
                        success.output_path.display(),
                        success.records,
                        success.tier
                    ));
                }
            }
            let failures: Vec<_> = dataset.failed_splits().collect();
            if !failures.is_empty() {
                lines.push(String::new());
                lines.push(format!("{} failures:", dataset.title));
                for (key, failure) in failures {
                    lines.push(format!("  - {key}: {} ({})", failure.message, failure.stage));
                }
            }
        }

        if self.all_failed() {
            lines.push(String::new());
            lines.push("⚠ All datasets failed to download.".to_string());
            let homepages: Vec<_> = self
                .datasets
                .iter()
                .filter_map(|d| d.homepage.as_deref())
                .collect();
            if !homepages.is_empty() {
                lines.push("Please try manual download from:".to_string());
                for homepage in homepages {
                    lines.push(format!("  - {homepage}"));
                }
            }
        }
        lines
    }
}
