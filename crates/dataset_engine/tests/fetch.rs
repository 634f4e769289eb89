use std::sync::{Arc, Mutex};
use std::time::Duration;

use dataset_core::{Split, SplitKey, SplitStage};
use dataset_engine::{
    EngineEvent, FailureKind, FetchSettings, Fetcher, ProgressSink, ReqwestFetcher, SplitProgress,
    GZIP_MAGIC,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn key() -> SplitKey {
    SplitKey {
        dataset: "demo".to_string(),
        split: Split::Train,
    }
}

#[tokio::test]
async fn fetcher_returns_body_and_emits_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/train.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"[{"a":1}]"#, "application/json"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let sink = TestSink::new();
    let url = format!("{}/train.json", server.uri());

    let output = fetcher.fetch(&key(), &url, &sink).await.expect("fetch ok");
    assert_eq!(output.metadata.original_url, url);
    assert_eq!(output.metadata.final_url, output.metadata.original_url);
    assert_eq!(output.metadata.redirect_count, 0);
    assert_eq!(output.metadata.byte_len, 9);
    assert!(output
        .metadata
        .content_type
        .unwrap()
        .starts_with("application/json"));
    assert_eq!(output.bytes, br#"[{"a":1}]"#);

    let progress = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Progress(SplitProgress { stage, bytes, .. }) => Some((stage, bytes)),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert!(progress.contains(&(SplitStage::Fetching, Some(9))));
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let sink = TestSink::new();
    let url = format!("{}/missing", server.uri());

    let err = fetcher.fetch(&key(), &url, &sink).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let sink = TestSink::new();
    let url = format!("{}/slow", server.uri());

    let err = fetcher.fetch(&key(), &url, &sink).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(ResponseTemplate::new(200).set_body_string("01234567890"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let sink = TestSink::new();
    let url = format!("{}/large", server.uri());

    let err = fetcher.fetch(&key(), &url, &sink).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn fetcher_treats_empty_body_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let sink = TestSink::new();
    let url = format!("{}/empty", server.uri());

    let err = fetcher.fetch(&key(), &url, &sink).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::EmptyBody);
}

#[tokio::test]
async fn fetcher_keeps_compressed_bytes_untouched() {
    let server = MockServer::start().await;
    let body = vec![GZIP_MAGIC[0], GZIP_MAGIC[1], 8, 0, 0];
    Mock::given(method("GET"))
        .and(path("/contents.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.clone(), "application/json"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let sink = TestSink::new();
    let url = format!("{}/contents.gz?se=2025-11-28&sig=abc%3D", server.uri());

    let output = fetcher.fetch(&key(), &url, &sink).await.unwrap();
    assert_eq!(output.bytes, body);
}

#[tokio::test]
async fn fetcher_rejects_unparseable_url() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let sink = TestSink::new();
    let err = fetcher.fetch(&key(), "not a url", &sink).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
