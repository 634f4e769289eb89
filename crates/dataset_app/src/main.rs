mod cli;
mod config;
mod reporter;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dataset_core::{Catalog, RunSummary};
use dataset_engine::{Pipeline, TieredFetcher};
use engine_logging::{engine_info, engine_warn, LogSettings};

use cli::Cli;
use config::{FileConfig, RunConfig};
use reporter::ConsoleReporter;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    engine_logging::initialize(LogSettings {
        level: engine_logging::level_for_verbosity(cli.verbose),
        destination: cli.log_destination(),
    });

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = RunConfig::resolve(&cli, file)?;
    let reporter = ConsoleReporter::stdout();

    if cli.list {
        list_catalog(&reporter, &config.catalog);
        return Ok(ExitCode::SUCCESS);
    }

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let summary = runtime.block_on(run(&config, &reporter));

    for line in summary.render() {
        reporter.line(&line);
    }
    if summary.any_failed() {
        engine_warn!("Some splits failed; see the summary above");
    }

    if config.fail_on_error && summary.any_failed() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn run(config: &RunConfig, reporter: &ConsoleReporter) -> RunSummary {
    let fetcher = TieredFetcher::from_settings(config.fetch.clone(), config.hub_endpoint.clone());
    let pipeline = Pipeline::new(fetcher, config.data_dir.clone());
    engine_info!(
        "Fetching {} splits into {}",
        config.catalog.split_count(),
        pipeline.data_dir().display()
    );

    let mut datasets = Vec::with_capacity(config.catalog.datasets.len());
    for definition in &config.catalog.datasets {
        reporter.dataset_started(definition);
        let report = pipeline.run_dataset(definition, reporter).await;
        reporter.dataset_finished(&report);
        datasets.push(report);
    }
    RunSummary { datasets }
}

fn list_catalog(reporter: &ConsoleReporter, catalog: &Catalog) {
    for definition in &catalog.datasets {
        reporter.line(&format!("{} ({})", definition.title, definition.name));
        for spec in &definition.specs {
            let fallback = spec
                .fallback
                .as_ref()
                .map(|source| source.describe())
                .unwrap_or_else(|| "none".to_string());
            reporter.line(&format!(
                "  {:<10} primary {}  fallback {}  -> {}",
                spec.split.as_str(),
                spec.primary.describe(),
                fallback,
                spec.output_path.display()
            ));
        }
    }
}
