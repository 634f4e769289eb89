//! Dataset core: dataset descriptions, the per-split state machine and run reports.
mod catalog;
mod report;
mod spec;
mod state;

pub use catalog::{Catalog, CatalogError, DatasetDefinition};
pub use report::{DatasetReport, RunSummary, SplitFailure, SplitReport, SplitSuccess};
pub use spec::{DatasetSpec, Source, SourceFormat, SourceTier, Split, SplitKey};
pub use state::{update, InvalidTransition, SplitStage, StageMsg};
