//! Console progress output. Logging goes through `engine_logging`; this is the
//! human-facing narrative of a run.

use std::io::{self, Write};
use std::sync::Mutex;

use dataset_core::{DatasetDefinition, DatasetReport, SourceTier, SplitStage};
use dataset_engine::{EngineEvent, ProgressSink, SplitProgress};

const RULE_WIDTH: usize = 60;

pub struct ConsoleReporter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleReporter {
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn line(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{text}");
        }
    }

    pub fn dataset_started(&self, definition: &DatasetDefinition) {
        let rule = "=".repeat(RULE_WIDTH);
        self.line(&rule);
        self.line(&format!("Downloading {} dataset...", definition.title));
        self.line(&rule);
    }

    pub fn dataset_finished(&self, report: &DatasetReport) {
        if report.succeeded() {
            self.line(&format!(
                "✓ {} downloaded successfully ({} records)",
                report.title,
                report.record_count()
            ));
        } else {
            let failed = report.failed_splits().count();
            self.line(&format!(
                "✗ {}: {failed} of {} splits failed",
                report.title,
                report.splits.len()
            ));
        }
        self.line("");
    }
}

impl ProgressSink for ConsoleReporter {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::Progress(SplitProgress {
                key,
                stage: SplitStage::Fetching,
                bytes: None,
            }) => self.line(&format!("Downloading {}...", key.split)),
            EngineEvent::Progress(_) => {}
            EngineEvent::TierFailed { key, tier, error } => {
                self.line(&format!("✗ {key}: {tier} source failed: {error}"));
                if tier == SourceTier::Primary {
                    self.line("Trying alternative method...");
                }
            }
            EngineEvent::SplitCompleted(report) => match report.outcome {
                Ok(success) => self.line(&format!(
                    "✓ Saved {} records to {}",
                    success.records,
                    success.output_path.display()
                )),
                Err(failure) => self.line(&format!("✗ Failed {}: {}", report.key, failure.message)),
            },
        }
    }
}
