use std::path::PathBuf;

use clap::{ArgAction, Parser};
use dataset_core::Split;
use engine_logging::LogDestination;

/// Download negotiation dialogue datasets and store each split as a JSON array.
#[derive(Debug, Parser)]
#[command(name = "fetch-datasets", version)]
pub struct Cli {
    /// RON configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory that receives `<dataset>/<split>.json` (default: ./data).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Only download this dataset; repeatable.
    #[arg(long = "dataset", value_name = "NAME")]
    pub datasets: Vec<String>,

    /// Only download this split; repeatable.
    #[arg(long = "split", value_name = "SPLIT", value_parser = parse_split)]
    pub splits: Vec<Split>,

    /// Whole-request timeout for every HTTP call.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Base URL of the dataset rows API.
    #[arg(long, value_name = "URL")]
    pub hub_endpoint: Option<String>,

    /// Skip hub primaries and go straight to the raw file sources.
    #[arg(long)]
    pub no_hub: bool,

    /// Exit with status 1 when any split failed.
    #[arg(long)]
    pub fail_on_error: bool,

    /// Print the datasets that would be fetched and exit.
    #[arg(long)]
    pub list: bool,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Keep log records off the terminal and write them to --log-file only.
    #[arg(long, requires = "log_file")]
    pub log_file_only: bool,
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        match (&self.log_file, self.log_file_only) {
            (Some(path), true) => LogDestination::File(path.clone()),
            (Some(path), false) => LogDestination::Both(path.clone()),
            (None, _) => LogDestination::Terminal,
        }
    }
}

fn parse_split(value: &str) -> Result<Split, String> {
    Split::parse(value).ok_or_else(|| {
        format!("unknown split {value:?} (expected train, validation or test)")
    })
}
