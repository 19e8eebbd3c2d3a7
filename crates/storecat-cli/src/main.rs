mod output;

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::Serialize;
use storecat_core::{AppConfig, ProductCard, VariantRecord};
use storecat_scraper::{
    CancelFlag, CatalogError, CatalogPipeline, CatalogRun, HttpPageSource, PipelineSettings,
    RunSummary,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "storecat")]
#[command(about = "Scrape a paginated storefront catalog into CSV")]
struct Cli {
    /// CSV file to write (defaults to STORECAT_OUTPUT_PATH)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// What to emit: one row per variant, or one row per listing card
    #[arg(long, value_enum, env = "STORECAT_FLAVOR", default_value_t = Flavor::Variants)]
    flavor: Flavor,

    /// Stop after this many listing pages (defaults to STORECAT_MAX_LISTING_PAGES)
    #[arg(long)]
    max_pages: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Flavor {
    Variants,
    Cards,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = storecat_core::load_app_config_from_env()?;
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(max_pages) = cli.max_pages {
        anyhow::ensure!(max_pages >= 1, "--max-pages must be at least 1");
        config.max_listing_pages = Some(max_pages);
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancelFlag::default();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    tracing::info!(
        base_url = %config.base_url,
        flavor = ?cli.flavor,
        output = %config.output_path.display(),
        "starting catalog run"
    );

    run(&config, cli.flavor, cancel).await
}

/// Runs one flavor end to end. Setup failures take the same path as a failed
/// first page, so the output file always exists afterwards.
async fn run(config: &AppConfig, flavor: Flavor, cancel: CancelFlag) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config, cancel);
    match flavor {
        Flavor::Variants => {
            let outcome = match pipeline {
                Ok(pipeline) => pipeline.run().await,
                Err(err) => Err(err),
            };
            finish(outcome, &config.output_path, &VariantRecord::HEADERS)
        }
        Flavor::Cards => {
            let outcome = match pipeline {
                Ok(pipeline) => pipeline.run_cards().await,
                Err(err) => Err(err),
            };
            finish::<ProductCard>(outcome, &config.output_path, &ProductCard::HEADERS)
        }
    }
}

fn build_pipeline(
    config: &AppConfig,
    cancel: CancelFlag,
) -> Result<CatalogPipeline<HttpPageSource>, CatalogError> {
    let settings = PipelineSettings::from_config(config)?;
    let source = HttpPageSource::from_config(config)?;
    Ok(CatalogPipeline::new(source, settings).with_cancel_flag(cancel))
}

/// Writes the run's records (or a header-only file on fatal failure) and
/// reports the final count.
fn finish<T: Serialize>(
    outcome: Result<CatalogRun<T>, CatalogError>,
    path: &Path,
    headers: &[&str],
) -> anyhow::Result<()> {
    match outcome {
        Ok(run) => {
            output::write_csv(path, headers, &run.records)?;
            report(&run.summary);
            println!("{} records written to {}", run.records.len(), path.display());
            Ok(())
        }
        Err(err) => {
            output::write_csv::<T>(path, headers, &[])?;
            println!("0 records written to {}", path.display());
            Err(err.into())
        }
    }
}

fn report(summary: &RunSummary) {
    if summary.aborted {
        tracing::warn!(records = summary.records, "run cancelled, partial results kept");
    }
    for diagnostic in &summary.diagnostics {
        tracing::debug!("{diagnostic}");
    }
}

/// Sets `cancel` on Ctrl-C or SIGTERM. The run stops before its next request.
async fn cancel_on_signal(cancel: CancelFlag) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping after the current request");
    cancel.cancel();
}

#[cfg(test)]
mod tests;
