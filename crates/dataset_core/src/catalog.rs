use std::collections::HashSet;
use std::path::{Component, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::{DatasetSpec, Source, SourceFormat, Split};

const COCOA_BASE: &str =
    "https://raw.githubusercontent.com/stanfordnlp/cocoa/master/craigslistbargain/data/";
const NEGOTIATOR_BASE: &str =
    "https://raw.githubusercontent.com/facebookresearch/end-to-end-negotiator/master/data/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDefinition {
    pub name: String,
    pub title: String,
    /// Where a user can fetch the data by hand when every tier fails.
    #[serde(default)]
    pub homepage: Option<String>,
    pub specs: Vec<DatasetSpec>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("dataset name must not be empty")]
    EmptyName,
    #[error("spec for {spec} listed under dataset {dataset}")]
    MismatchedName { dataset: String, spec: String },
    #[error("invalid url for {dataset}/{split}: {message}")]
    InvalidUrl {
        dataset: String,
        split: Split,
        message: String,
    },
    #[error("hub source for {dataset}/{split} needs a dataset id and a config")]
    EmptyHubIdentifier { dataset: String, split: Split },
    #[error("output path {0:?} must be relative and stay inside the data directory")]
    UnsafeOutputPath(PathBuf),
    #[error("output path {0:?} is used by more than one split")]
    DuplicateOutputPath(PathBuf),
    #[error("unknown dataset {0}")]
    UnknownDataset(String),
}

/// Ordered set of datasets to download.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub datasets: Vec<DatasetDefinition>,
}

impl Catalog {
    pub fn new(datasets: Vec<DatasetDefinition>) -> Self {
        Self { datasets }
    }

    /// Craigslist Bargains and Deal or No Dialog, hub first and GitHub raw files as fallback.
    pub fn builtin() -> Self {
        Self::new(vec![craigslist_bargains(), deal_or_no_dialog()])
    }

    pub fn find(&self, name: &str) -> Option<&DatasetDefinition> {
        self.datasets.iter().find(|d| d.name == name)
    }

    pub fn split_count(&self) -> usize {
        self.datasets.iter().map(|d| d.specs.len()).sum()
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if dataset.name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
            for spec in &dataset.specs {
                if spec.name != dataset.name {
                    return Err(CatalogError::MismatchedName {
                        dataset: dataset.name.clone(),
                        spec: spec.name.clone(),
                    });
                }
                validate_source(spec, &spec.primary)?;
                if let Some(fallback) = &spec.fallback {
                    validate_source(spec, fallback)?;
                }
                if !is_contained(&spec.output_path) {
                    return Err(CatalogError::UnsafeOutputPath(spec.output_path.clone()));
                }
                if !seen.insert(spec.output_path.clone()) {
                    return Err(CatalogError::DuplicateOutputPath(spec.output_path.clone()));
                }
            }
        }
        Ok(())
    }

    /// Keep only the named datasets and splits. Empty filters keep everything.
    pub fn filtered(&self, names: &[String], splits: &[Split]) -> Result<Catalog, CatalogError> {
        for name in names {
            if self.find(name).is_none() {
                return Err(CatalogError::UnknownDataset(name.clone()));
            }
        }
        let datasets = self
            .datasets
            .iter()
            .filter(|d| names.is_empty() || names.contains(&d.name))
            .map(|d| DatasetDefinition {
                specs: d
                    .specs
                    .iter()
                    .filter(|s| splits.is_empty() || splits.contains(&s.split))
                    .cloned()
                    .collect(),
                ..d.clone()
            })
            .filter(|d| !d.specs.is_empty())
            .collect();
        Ok(Catalog::new(datasets))
    }

    /// Promote fallbacks over hub primaries so no hub request is made.
    /// Specs without a fallback keep their hub primary.
    pub fn without_hub_primaries(mut self) -> Catalog {
        for spec in self.datasets.iter_mut().flat_map(|d| d.specs.iter_mut()) {
            if spec.primary.is_hub() {
                if let Some(fallback) = spec.fallback.take() {
                    spec.primary = fallback;
                }
            }
        }
        self
    }
}

fn validate_source(spec: &DatasetSpec, source: &Source) -> Result<(), CatalogError> {
    if let Source::Hub { dataset, config } = source {
        if dataset.trim().is_empty() || config.trim().is_empty() {
            return Err(CatalogError::EmptyHubIdentifier {
                dataset: spec.name.clone(),
                split: spec.split,
            });
        }
    }
    if let Source::Http { url, .. } = source {
        let parsed = url::Url::parse(url).map_err(|err| CatalogError::InvalidUrl {
            dataset: spec.name.clone(),
            split: spec.split,
            message: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CatalogError::InvalidUrl {
                dataset: spec.name.clone(),
                split: spec.split,
                message: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
    }
    Ok(())
}

fn is_contained(path: &std::path::Path) -> bool {
    path.file_name().is_some()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn craigslist_bargains() -> DatasetDefinition {
    let name = "craigslist_bargains";
    let files = [
        (Split::Train, "train.json"),
        (Split::Validation, "dev.json"),
        (Split::Test, "test.json"),
    ];
    DatasetDefinition {
        name: name.to_string(),
        title: "Craigslist Bargains".to_string(),
        homepage: Some("https://github.com/stanfordnlp/cocoa".to_string()),
        specs: files
            .into_iter()
            .map(|(split, file)| {
                DatasetSpec::new(
                    name,
                    split,
                    Source::hub("stanfordnlp/craigslist_bargains", "default"),
                )
                .with_fallback(Source::http(
                    format!("{COCOA_BASE}{file}"),
                    SourceFormat::JsonArray,
                ))
            })
            .collect(),
    }
}

fn deal_or_no_dialog() -> DatasetDefinition {
    let name = "deal_or_no_dialog";
    let files = [
        (Split::Train, "negotiate/train.txt"),
        (Split::Validation, "negotiate/val.txt"),
        (Split::Test, "negotiate/test.txt"),
    ];
    DatasetDefinition {
        name: name.to_string(),
        title: "Deal or No Dialog".to_string(),
        homepage: Some("https://github.com/facebookresearch/end-to-end-negotiator".to_string()),
        specs: files
            .into_iter()
            .map(|(split, file)| {
                DatasetSpec::new(
                    name,
                    split,
                    Source::hub("mikelewis0/deal_or_no_dialog", "dialogues"),
                )
                .with_fallback(Source::http(
                    format!("{NEGOTIATOR_BASE}{file}"),
                    SourceFormat::DelimitedLinesAsJson,
                ))
            })
            .collect(),
    }
}
