use std::collections::HashSet;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sabi::cli::{Cli, Command};
use sabi::config::Config;
use sabi::db::connector::PgCatalog;
use sabi::error::FingerprintError;
use sabi::orchestrator::{self, default_extensions};
use sabi::tester;

fn install_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    install_logging();

    let cli = Cli::parse();
    let cfg = Config::from_env();

    match run(cli, cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cfg: Config) -> Result<(), FingerprintError> {
    match cli.command {
        Command::Ingest {
            dir,
            ext,
            workers,
            duration_limit,
        } => {
            let mut cfg = cfg;
            if let Some(workers) = workers {
                cfg.worker_count = workers;
            }

            let extensions: HashSet<String> = if ext.is_empty() {
                default_extensions()
            } else {
                ext.into_iter().map(|e| e.to_lowercase()).collect()
            };

            let catalog = Arc::new(Mutex::new(PgCatalog::connect_from_env()?));
            let summary = orchestrator::ingest_dir(catalog, &dir, &extensions, cfg, duration_limit).await?;

            println!(
                "{} fingerprinted, {} skipped (already fingerprinted), {} failed",
                summary.fingerprinted, summary.skipped, summary.failed
            );
            Ok(())
        }

        Command::Identify { file, duration_limit } => {
            let mut catalog = PgCatalog::connect_from_env()?;
            match orchestrator::identify(&mut catalog, &file, &cfg, duration_limit)? {
                Some(recognition) => {
                    println!("RECORD_ID: {}", recognition.record_id);
                    println!("RECORD_NAME: {}", recognition.record_name);
                    println!("CONFIDENCE: {}", recognition.confidence);
                    println!("OFFSET: {}", recognition.offset);
                    println!("OFFSET_SECS: {}", recognition.offset_seconds);
                    println!("FIELD_FILE_SHA1: {}", recognition.file_sha1);
                }
                None => println!("NO MATCH"),
            }
            Ok(())
        }

        Command::AccuracyTest { dir } => {
            let mut catalog = PgCatalog::connect_from_env()?;
            let report = tester::run_accuracy_test(&mut catalog, &dir, &cfg)?;
            println!(
                "{}/{} correct ({:.2}%), {} no-match",
                report.correct,
                report.total,
                report.accuracy() * 100.0,
                report.no_match
            );
            Ok(())
        }
    }
}
