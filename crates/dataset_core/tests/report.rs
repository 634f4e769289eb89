use std::path::PathBuf;

use dataset_core::{
    DatasetReport, RunSummary, SourceTier, Split, SplitFailure, SplitKey, SplitReport,
    SplitStage, SplitSuccess,
};

fn key(dataset: &str, split: Split) -> SplitKey {
    SplitKey {
        dataset: dataset.to_string(),
        split,
    }
}

fn ok(dataset: &str, split: Split, records: usize) -> SplitReport {
    SplitReport {
        key: key(dataset, split),
        outcome: Ok(SplitSuccess {
            records,
            bytes_written: 10,
            output_path: PathBuf::from(format!("data/{dataset}/{split}.json")),
            tier: SourceTier::Fallback,
        }),
    }
}

fn failed(dataset: &str, split: Split) -> SplitReport {
    SplitReport {
        key: key(dataset, split),
        outcome: Err(SplitFailure {
            stage: SplitStage::FetchFailed,
            message: "http status 404".to_string(),
        }),
    }
}

fn dataset(name: &str, splits: Vec<SplitReport>) -> DatasetReport {
    DatasetReport {
        name: name.to_string(),
        title: name.to_string(),
        homepage: Some(format!("https://example.com/{name}")),
        splits,
    }
}

#[test]
fn partial_dataset_is_not_a_success() {
    let report = dataset(
        "a",
        vec![ok("a", Split::Train, 3), failed("a", Split::Test)],
    );
    assert!(!report.succeeded());
    assert_eq!(report.record_count(), 3);
    assert_eq!(report.failed_splits().count(), 1);
}

#[test]
fn summary_lists_files_and_failures() {
    let summary = RunSummary {
        datasets: vec![
            dataset("a", vec![ok("a", Split::Train, 3)]),
            dataset("b", vec![failed("b", Split::Test)]),
        ],
    };
    assert!(summary.any_failed());
    assert!(!summary.all_failed());

    let lines = summary.render();
    assert!(lines.contains(&"a: ✓ SUCCESS".to_string()));
    assert!(lines.contains(&"b: ✗ FAILED".to_string()));
    assert!(lines
        .iter()
        .any(|l| l.contains("data/a/train.json (3 records, fallback tier)")));
    assert!(lines
        .iter()
        .any(|l| l == "  - b/test: http status 404 (fetch failed)"));
    assert!(!lines.iter().any(|l| l.contains("manual download")));
}

#[test]
fn all_failed_summary_points_to_homepages() {
    let summary = RunSummary {
        datasets: vec![
            dataset("a", vec![failed("a", Split::Train)]),
            dataset("b", vec![failed("b", Split::Test)]),
        ],
    };
    assert!(summary.all_failed());
    let lines = summary.render();
    assert!(lines.contains(&"⚠ All datasets failed to download.".to_string()));
    assert!(lines.contains(&"  - https://example.com/a".to_string()));
    assert!(lines.contains(&"  - https://example.com/b".to_string()));
}

#[test]
fn empty_summary_is_neither_failed_nor_all_failed() {
    let summary = RunSummary::default();
    assert!(!summary.any_failed());
    assert!(!summary.all_failed());
}
