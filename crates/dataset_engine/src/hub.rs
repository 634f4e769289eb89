use std::sync::{atomic::AtomicUsize, Arc};

use dataset_core::{Split, SplitKey, SplitStage};
use engine_logging::{engine_debug, engine_info};
use serde::Deserialize;

use crate::fetch::{build_client, map_reqwest_error, read_capped};
use crate::{
    EngineEvent, FailureKind, FetchError, FetchSettings, ProgressSink, Record, SplitProgress,
};

pub const DEFAULT_HUB_ENDPOINT: &str = "https://datasets-server.huggingface.co";

/// Upper bound the rows API accepts for `length`.
const MAX_PAGE_SIZE: usize = 100;

/// Loads a whole split by dataset identifier, in row order.
#[async_trait::async_trait]
pub trait HubLoader: Send + Sync {
    async fn load_split(
        &self,
        key: &SplitKey,
        dataset: &str,
        config: &str,
        split: Split,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<Record>, FetchError>;
}

/// Pages through `GET {endpoint}/rows`.
#[derive(Debug, Clone)]
pub struct DatasetsServerLoader {
    endpoint: String,
    settings: FetchSettings,
    page_size: usize,
}

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
    num_rows_total: usize,
    /// Set when the server only exposes a prefix of the split.
    #[serde(default)]
    partial: bool,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row_idx: usize,
    row: Record,
    #[serde(default)]
    truncated_cells: Vec<String>,
}

impl DatasetsServerLoader {
    pub fn new(endpoint: impl Into<String>, settings: FetchSettings) -> Self {
        Self {
            endpoint: endpoint.into(),
            settings,
            page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    fn page_url(
        &self,
        dataset: &str,
        config: &str,
        split: Split,
        offset: usize,
    ) -> Result<url::Url, FetchError> {
        let base = format!("{}/rows", self.endpoint.trim_end_matches('/'));
        let mut url = url::Url::parse(&base)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("dataset", dataset)
            .append_pair("config", config)
            .append_pair("split", split.as_str())
            .append_pair("offset", &offset.to_string())
            .append_pair("length", &self.page_size.to_string());
        Ok(url)
    }

    async fn fetch_page(
        &self,
        client: &reqwest::Client,
        url: url::Url,
        bytes_read: u64,
    ) -> Result<(RowsPage, u64), FetchError> {
        let response = client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let body = read_capped(response, self.settings.max_bytes, bytes_read, |_| {}).await?;
        let page: RowsPage = serde_json::from_slice(&body).map_err(|err| {
            FetchError::new(
                FailureKind::InvalidResponse,
                format!("failed parsing rows page: {err}"),
            )
        })?;
        Ok((page, body.len() as u64))
    }
}

#[async_trait::async_trait]
impl HubLoader for DatasetsServerLoader {
    async fn load_split(
        &self,
        key: &SplitKey,
        dataset: &str,
        config: &str,
        split: Split,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<Record>, FetchError> {
        engine_info!("Loading {} from hub dataset {} [{}]", key, dataset, config);
        let client = build_client(&self.settings, Arc::new(AtomicUsize::new(0)))?;

        let mut records: Vec<Record> = Vec::new();
        let mut bytes_read = 0u64;
        loop {
            let url = self.page_url(dataset, config, split, records.len())?;
            let (page, page_bytes) = self.fetch_page(&client, url, bytes_read).await?;
            bytes_read += page_bytes;
            let total = page.num_rows_total;

            if page.partial {
                return Err(FetchError::new(
                    FailureKind::PartialSplit,
                    format!("server exposes only {total} rows of the split"),
                ));
            }

            if page.rows.is_empty() {
                if records.len() < total {
                    return Err(FetchError::new(
                        FailureKind::InvalidResponse,
                        format!("empty page at offset {} of {total}", records.len()),
                    ));
                }
                break;
            }

            for entry in page.rows {
                if entry.row_idx != records.len() {
                    return Err(FetchError::new(
                        FailureKind::InvalidResponse,
                        format!("expected row {}, got row {}", records.len(), entry.row_idx),
                    ));
                }
                if !entry.truncated_cells.is_empty() {
                    return Err(FetchError::new(
                        FailureKind::TruncatedRows,
                        format!(
                            "row {} has truncated cells: {}",
                            entry.row_idx,
                            entry.truncated_cells.join(", ")
                        ),
                    ));
                }
                records.push(entry.row);
            }

            sink.emit(EngineEvent::Progress(SplitProgress {
                key: key.clone(),
                stage: SplitStage::Fetching,
                bytes: Some(bytes_read),
            }));
            engine_debug!("{}: {} of {} rows", key, records.len(), total);

            if records.len() >= total {
                break;
            }
        }

        if records.is_empty() {
            return Err(FetchError::new(FailureKind::EmptyBody, "split has no rows"));
        }
        Ok(records)
    }
}
