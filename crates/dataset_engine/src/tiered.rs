use std::fmt;
use std::sync::Arc;

use dataset_core::{DatasetSpec, Source, SourceFormat, SourceTier, SplitKey};
use engine_logging::{engine_info, engine_warn};

use crate::hub::DatasetsServerLoader;
use crate::{
    EngineEvent, FetchError, FetchOutput, FetchSettings, Fetcher, HubLoader, ProgressSink, Record,
    ReqwestFetcher,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Bytes from an HTTP source, still to be decoded and normalized.
    Raw {
        output: FetchOutput,
        format: SourceFormat,
    },
    /// Records already structured by the hub loader.
    Structured(Vec<Record>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub tier: SourceTier,
    pub payload: Payload,
}

/// Both tiers failed (or the primary failed with no fallback configured).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieredFetchError {
    pub primary: FetchError,
    pub fallback: Option<FetchError>,
}

impl TieredFetchError {
    /// The error from the last tier attempted.
    pub fn last(&self) -> &FetchError {
        self.fallback.as_ref().unwrap_or(&self.primary)
    }
}

impl fmt::Display for TieredFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fallback {
            Some(fallback) => write!(
                f,
                "primary failed ({}); fallback failed ({fallback})",
                self.primary
            ),
            None => write!(f, "primary failed ({}); no fallback configured", self.primary),
        }
    }
}

impl std::error::Error for TieredFetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.last())
    }
}

/// Primary, then at most one fallback attempt. Never retries a tier.
#[derive(Clone)]
pub struct TieredFetcher {
    http: Arc<dyn Fetcher>,
    hub: Arc<dyn HubLoader>,
}

impl TieredFetcher {
    pub fn new(http: Arc<dyn Fetcher>, hub: Arc<dyn HubLoader>) -> Self {
        Self { http, hub }
    }

    pub fn from_settings(settings: FetchSettings, hub_endpoint: impl Into<String>) -> Self {
        let hub = DatasetsServerLoader::new(hub_endpoint, settings.clone());
        Self::new(Arc::new(ReqwestFetcher::new(settings)), Arc::new(hub))
    }

    pub async fn fetch(
        &self,
        spec: &DatasetSpec,
        sink: &dyn ProgressSink,
    ) -> Result<Fetched, TieredFetchError> {
        let key = spec.key();
        engine_info!("{}: trying primary {}", key, spec.primary.describe());
        let primary = match self.attempt(&key, spec, &spec.primary, sink).await {
            Ok(payload) => {
                return Ok(Fetched {
                    tier: SourceTier::Primary,
                    payload,
                })
            }
            Err(err) => err,
        };
        self.report_tier_failure(&key, SourceTier::Primary, &primary, sink);

        let Some(fallback_source) = &spec.fallback else {
            return Err(TieredFetchError {
                primary,
                fallback: None,
            });
        };

        engine_info!("{}: trying fallback {}", key, fallback_source.describe());
        match self.attempt(&key, spec, fallback_source, sink).await {
            Ok(payload) => Ok(Fetched {
                tier: SourceTier::Fallback,
                payload,
            }),
            Err(fallback) => {
                self.report_tier_failure(&key, SourceTier::Fallback, &fallback, sink);
                Err(TieredFetchError {
                    primary,
                    fallback: Some(fallback),
                })
            }
        }
    }

    async fn attempt(
        &self,
        key: &SplitKey,
        spec: &DatasetSpec,
        source: &Source,
        sink: &dyn ProgressSink,
    ) -> Result<Payload, FetchError> {
        match source {
            Source::Http { url, format } => {
                let output = self.http.fetch(key, url, sink).await?;
                Ok(Payload::Raw {
                    output,
                    format: *format,
                })
            }
            Source::Hub { dataset, config } => {
                let records = self
                    .hub
                    .load_split(key, dataset, config, spec.split, sink)
                    .await?;
                Ok(Payload::Structured(records))
            }
        }
    }

    fn report_tier_failure(
        &self,
        key: &SplitKey,
        tier: SourceTier,
        error: &FetchError,
        sink: &dyn ProgressSink,
    ) {
        engine_warn!("{}: {} tier failed: {}", key, tier, error);
        sink.emit(EngineEvent::TierFailed {
            key: key.clone(),
            tier,
            error: error.clone(),
        });
    }
}
