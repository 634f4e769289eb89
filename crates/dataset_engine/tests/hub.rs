use std::sync::Mutex;

use dataset_core::{Split, SplitKey};
use dataset_engine::{
    DatasetsServerLoader, EngineEvent, FailureKind, FetchSettings, HubLoader, ProgressSink,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn key() -> SplitKey {
    SplitKey {
        dataset: "craigslist_bargains".to_string(),
        split: Split::Train,
    }
}

fn row(idx: usize, title: &str) -> serde_json::Value {
    json!({"row_idx": idx, "row": {"title": title}, "truncated_cells": []})
}

async fn mount_page(server: &MockServer, offset: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rows"))
        .and(query_param("dataset", "stanfordnlp/craigslist_bargains"))
        .and(query_param("config", "default"))
        .and(query_param("split", "train"))
        .and(query_param("offset", offset))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

fn loader(server: &MockServer) -> DatasetsServerLoader {
    DatasetsServerLoader::new(server.uri(), FetchSettings::default()).with_page_size(2)
}

#[tokio::test]
async fn pages_are_collected_in_row_order() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "0",
        json!({"rows": [row(0, "bike"), row(1, "desk")], "num_rows_total": 3}),
    )
    .await;
    mount_page(
        &server,
        "2",
        json!({"rows": [row(2, "lamp")], "num_rows_total": 3}),
    )
    .await;

    let sink = TestSink::default();
    let records = loader(&server)
        .load_split(
            &key(),
            "stanfordnlp/craigslist_bargains",
            "default",
            Split::Train,
            &sink,
        )
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![
            json!({"title": "bike"}),
            json!({"title": "desk"}),
            json!({"title": "lamp"}),
        ]
    );
    assert_eq!(sink.events.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn truncated_rows_fail_the_load() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "0",
        json!({
            "rows": [{"row_idx": 0, "row": {"title": "bi"}, "truncated_cells": ["title"]}],
            "num_rows_total": 1
        }),
    )
    .await;

    let err = loader(&server)
        .load_split(
            &key(),
            "stanfordnlp/craigslist_bargains",
            "default",
            Split::Train,
            &TestSink::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::TruncatedRows);
}

#[tokio::test]
async fn out_of_order_rows_are_rejected() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "0",
        json!({"rows": [row(1, "desk"), row(0, "bike")], "num_rows_total": 2}),
    )
    .await;

    let err = loader(&server)
        .load_split(
            &key(),
            "stanfordnlp/craigslist_bargains",
            "default",
            Split::Train,
            &TestSink::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
}

#[tokio::test]
async fn short_listing_is_rejected() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "0",
        json!({"rows": [row(0, "bike"), row(1, "desk")], "num_rows_total": 5}),
    )
    .await;
    mount_page(&server, "2", json!({"rows": [], "num_rows_total": 5})).await;

    let err = loader(&server)
        .load_split(
            &key(),
            "stanfordnlp/craigslist_bargains",
            "default",
            Split::Train,
            &TestSink::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
}

#[tokio::test]
async fn missing_split_is_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rows"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = loader(&server)
        .load_split(
            &key(),
            "stanfordnlp/craigslist_bargains",
            "default",
            Split::Train,
            &TestSink::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn empty_split_is_a_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "0", json!({"rows": [], "num_rows_total": 0})).await;

    let err = loader(&server)
        .load_split(
            &key(),
            "stanfordnlp/craigslist_bargains",
            "default",
            Split::Train,
            &TestSink::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::EmptyBody);
}

#[tokio::test]
async fn partial_split_is_rejected() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "0",
        json!({"rows": [row(0, "bike")], "num_rows_total": 1, "partial": true}),
    )
    .await;

    let err = loader(&server)
        .load_split(
            &key(),
            "stanfordnlp/craigslist_bargains",
            "default",
            Split::Train,
            &TestSink::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::PartialSplit);
}

#[tokio::test]
async fn size_cap_covers_all_pages_of_a_split() {
    let server = MockServer::start().await;
    let first = serde_json::to_vec(
        &json!({"rows": [row(0, "bike"), row(1, "desk")], "num_rows_total": 3}),
    )
    .unwrap();
    let second =
        serde_json::to_vec(&json!({"rows": [row(2, "lamp")], "num_rows_total": 3})).unwrap();
    for (offset, body) in [("0", first.clone()), ("2", second.clone())] {
        Mock::given(method("GET"))
            .and(path("/rows"))
            .and(query_param("offset", offset))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let total = (first.len() + second.len()) as u64;
    let settings = FetchSettings {
        max_bytes: total - 1,
        ..FetchSettings::default()
    };
    let err = DatasetsServerLoader::new(server.uri(), settings)
        .with_page_size(2)
        .load_split(
            &key(),
            "stanfordnlp/craigslist_bargains",
            "default",
            Split::Train,
            &TestSink::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: total - 1,
            actual: Some(total),
        }
    );
}
