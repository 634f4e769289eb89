//! RON configuration file plus command line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use dataset_core::{Catalog, DatasetDefinition};
use dataset_engine::{FetchSettings, DEFAULT_HUB_ENDPOINT};
use engine_logging::engine_info;
use serde::Deserialize;

use crate::cli::Cli;

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub hub_endpoint: Option<String>,
    pub fetch: FetchConfig,
    /// Replaces the built-in catalog when present.
    pub datasets: Option<Vec<DatasetDefinition>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub redirect_limit: Option<usize>,
    pub max_bytes: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        engine_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }
}

/// Everything a run needs, after merging file and flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub hub_endpoint: String,
    pub fetch: FetchSettings,
    pub catalog: Catalog,
    pub fail_on_error: bool,
}

impl RunConfig {
    pub fn resolve(cli: &Cli, file: FileConfig) -> anyhow::Result<Self> {
        let mut fetch = FetchSettings::default();
        if let Some(secs) = file.fetch.connect_timeout_secs {
            fetch.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = cli.timeout_secs.or(file.fetch.request_timeout_secs) {
            fetch.request_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = file.fetch.redirect_limit {
            fetch.redirect_limit = limit;
        }
        if let Some(max_bytes) = file.fetch.max_bytes {
            fetch.max_bytes = max_bytes;
        }

        let base = match file.datasets {
            Some(datasets) => Catalog::new(datasets),
            None => Catalog::builtin(),
        };
        base.validate().context("invalid dataset catalog")?;
        let mut catalog = base.filtered(&cli.datasets, &cli.splits)?;
        if cli.no_hub {
            catalog = catalog.without_hub_primaries();
        }

        Ok(Self {
            data_dir: cli
                .data_dir
                .clone()
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            hub_endpoint: cli
                .hub_endpoint
                .clone()
                .or(file.hub_endpoint)
                .unwrap_or_else(|| DEFAULT_HUB_ENDPOINT.to_string()),
            fetch,
            catalog,
            fail_on_error: cli.fail_on_error,
        })
    }
}
