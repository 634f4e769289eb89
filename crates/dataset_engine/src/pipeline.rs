use std::path::{Path, PathBuf};

use dataset_core::{
    update, Catalog, DatasetDefinition, DatasetReport, DatasetSpec, RunSummary, SplitFailure,
    SplitKey, SplitReport, SplitStage, SplitSuccess, StageMsg,
};
use engine_logging::{engine_debug, engine_error, engine_info};

use crate::{
    decode_payload, normalize, write_records, DecodeError, EngineEvent, NormalizeError, Payload,
    PersistError, ProgressSink, SplitProgress, TieredFetchError, TieredFetcher,
};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] TieredFetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Runs fetch → decode → normalize → persist, one split at a time.
pub struct Pipeline {
    fetcher: TieredFetcher,
    data_dir: PathBuf,
}

impl Pipeline {
    pub fn new(fetcher: TieredFetcher, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Run every dataset in order. Failures stay local to their split.
    pub async fn run_catalog(&self, catalog: &Catalog, sink: &dyn ProgressSink) -> RunSummary {
        let mut datasets = Vec::with_capacity(catalog.datasets.len());
        for definition in &catalog.datasets {
            datasets.push(self.run_dataset(definition, sink).await);
        }
        RunSummary { datasets }
    }

    pub async fn run_dataset(
        &self,
        definition: &DatasetDefinition,
        sink: &dyn ProgressSink,
    ) -> DatasetReport {
        let mut splits = Vec::with_capacity(definition.specs.len());
        for spec in &definition.specs {
            splits.push(self.run_split(spec, sink).await);
        }
        DatasetReport {
            name: definition.name.clone(),
            title: definition.title.clone(),
            homepage: definition.homepage.clone(),
            splits,
        }
    }

    pub async fn run_split(&self, spec: &DatasetSpec, sink: &dyn ProgressSink) -> SplitReport {
        let key = spec.key();
        let mut tracker = StageTracker::new(&key, sink);
        let result = self.drive(spec, &mut tracker).await;

        let outcome = result.map_err(|err| {
            engine_error!("{}: {} ({})", key, err, tracker.stage);
            SplitFailure {
                stage: tracker.stage,
                message: err.to_string(),
            }
        });
        let report = SplitReport {
            key: key.clone(),
            outcome,
        };
        sink.emit(EngineEvent::SplitCompleted(report.clone()));
        report
    }

    async fn drive(
        &self,
        spec: &DatasetSpec,
        tracker: &mut StageTracker<'_>,
    ) -> Result<SplitSuccess, PipelineError> {
        tracker.step(StageMsg::Begin);
        let sink = tracker.sink;
        let fetched = tracker.finish(self.fetcher.fetch(spec, sink).await)?;

        let records = match fetched.payload {
            Payload::Structured(records) => {
                engine_debug!("{}: hub rows need no decoding", tracker.key);
                tracker.pass_through();
                tracker.pass_through();
                records
            }
            Payload::Raw { output, format } => {
                tracker.step(StageMsg::Begin);
                let decoded = tracker.finish(decode_payload(&output.bytes))?;
                if decoded.was_gzip {
                    engine_debug!("{}: payload was gzip compressed", tracker.key);
                }
                tracker.step(StageMsg::Begin);
                tracker.finish(normalize(&decoded.text, format))?
            }
        };

        tracker.step(StageMsg::Begin);
        let output_path = self.data_dir.join(&spec.output_path);
        let bytes_written = tracker.finish(write_records(&output_path, &records))?;
        engine_info!(
            "{}: saved {} records to {}",
            tracker.key,
            records.len(),
            output_path.display()
        );

        Ok(SplitSuccess {
            records: records.len(),
            bytes_written,
            output_path,
            tier: fetched.tier,
        })
    }
}

/// Walks one split through the stage machine and reports each transition.
struct StageTracker<'a> {
    key: &'a SplitKey,
    stage: SplitStage,
    sink: &'a dyn ProgressSink,
}

impl<'a> StageTracker<'a> {
    fn new(key: &'a SplitKey, sink: &'a dyn ProgressSink) -> Self {
        Self {
            key,
            stage: SplitStage::NotStarted,
            sink,
        }
    }

    fn step(&mut self, msg: StageMsg) {
        match update(self.stage, msg) {
            Ok(next) => {
                self.stage = next;
                self.sink.emit(EngineEvent::Progress(SplitProgress {
                    key: self.key.clone(),
                    stage: next,
                    bytes: None,
                }));
            }
            Err(err) => engine_error!("{}: {}", self.key, err),
        }
    }

    fn finish<T, E>(&mut self, result: Result<T, E>) -> Result<T, E> {
        self.step(if result.is_ok() {
            StageMsg::Succeeded
        } else {
            StageMsg::Failed
        });
        result
    }

    fn pass_through(&mut self) {
        self.step(StageMsg::Begin);
        self.step(StageMsg::Succeeded);
    }
}
