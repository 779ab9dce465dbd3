//! Accuracy harness backing the `accuracy-test` CLI subcommand: re-identifies
//! every already-ingested file under a directory and reports how often the
//! aligner's guess matches the file's own name.

use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::FingerprintError;
use crate::orchestrator;

#[derive(Debug, Default, Clone, Copy)]
pub struct AccuracyReport {
    pub total: usize,
    pub correct: usize,
    pub no_match: usize,
}

impl AccuracyReport {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Re-identify every `.wav` file under `dir` against `catalog` and compare
/// the recognized record name with the file's own stem.
pub fn run_accuracy_test<C: Catalog>(
    catalog: &mut C,
    dir: &Path,
    cfg: &Config,
) -> Result<AccuracyReport, FingerprintError> {
    let mut report = AccuracyReport::default();

    let files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();

    for path in files {
        let expected_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        report.total += 1;

        match orchestrator::identify(catalog, &path, cfg, None) {
            Ok(Some(recognition)) => {
                if recognition.record_name == expected_name {
                    report.correct += 1;
                    info!(file = %path.display(), "correct match");
                } else {
                    warn!(
                        file = %path.display(),
                        expected = %expected_name,
                        matched = %recognition.record_name,
                        "incorrect match"
                    );
                }
            }
            Ok(None) => {
                report.no_match += 1;
                warn!(file = %path.display(), "no match");
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "identify failed during accuracy test");
                report.no_match += 1;
            }
        }
    }

    Ok(report)
}
