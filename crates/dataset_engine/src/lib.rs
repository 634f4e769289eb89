//! Dataset engine: fetch, decode, normalize and persist dataset splits.
mod decode;
mod fetch;
mod hub;
mod normalize;
mod persist;
mod pipeline;
mod tiered;
mod types;

pub use decode::{decode_payload, DecodeError, DecodedText, GZIP_MAGIC};
pub use fetch::{FetchSettings, Fetcher, ProgressSink, ReqwestFetcher};
pub use hub::{DatasetsServerLoader, HubLoader, DEFAULT_HUB_ENDPOINT};
pub use normalize::{normalize, NormalizeError};
pub use persist::{ensure_output_dir, read_records, write_records, AtomicFileWriter, PersistError};
pub use pipeline::{Pipeline, PipelineError};
pub use tiered::{Fetched, Payload, TieredFetchError, TieredFetcher};
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, Record, SplitProgress,
};
