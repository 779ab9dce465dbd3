//! Command-line surface: `ingest`, `identify`, `accuracy-test`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sabi", version, about = "Acoustic landmark fingerprinting and recognition")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fingerprint every matching file under a directory and add it to the
    /// catalog.
    Ingest {
        /// Directory to walk.
        dir: PathBuf,

        /// File extensions to consider (repeatable). Defaults to `wav`.
        #[arg(long = "ext")]
        ext: Vec<String>,

        /// Number of blocking worker tasks. Defaults to available parallelism.
        #[arg(long)]
        workers: Option<usize>,

        /// Truncate each file to its first N seconds before fingerprinting.
        #[arg(long = "duration-limit")]
        duration_limit: Option<f64>,
    },

    /// Identify an unknown audio file against the catalog.
    Identify {
        /// File to identify.
        file: PathBuf,

        /// Truncate the file to its first N seconds before fingerprinting.
        #[arg(long = "duration-limit")]
        duration_limit: Option<f64>,
    },

    /// Re-identify every file under a directory and report hit rate.
    AccuracyTest {
        /// Directory of already-ingested files to re-identify.
        dir: PathBuf,
    },
}
