//! Ingest orchestrator: parallel fingerprinting of a directory.
//!
//! State machine of one file:
//! `discovered → queued → decoding → fingerprinting → inserted_record →
//! hashes_written → marked_fingerprinted`, with terminal failure states
//! `decode_failed`, `insert_failed`, `worker_crashed`. Only
//! `marked_fingerprinted` adds the file's digest to the skip set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::aligner::{self, Recognition};
use crate::catalog::{Catalog, Offset};
use crate::config::Config;
use crate::digest::{FileDigest, LandmarkHash};
use crate::error::FingerprintError;
use crate::hashing;
use crate::peaks;
use crate::spectrogram;
use crate::{decoder, decoder::DecodedAudio};

#[derive(Debug, Default, Clone, Copy)]
pub struct IngestSummary {
    pub fingerprinted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Default extension set: `{"wav"}`.
pub fn default_extensions() -> HashSet<String> {
    ["wav".to_string()].into_iter().collect()
}

fn record_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn matches_extension(path: &Path, extensions: &HashSet<String>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_lowercase()))
        .unwrap_or(false)
}

fn find_candidate_files(dir: &Path, extensions: &HashSet<String>) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| matches_extension(path, extensions))
        .collect()
}

/// CPU/IO-bound pipeline for one file: decode → per-channel spectrogram →
/// peaks → hashes, deduplicated across channels. Runs inside
/// `spawn_blocking`.
fn fingerprint_file(
    path: &Path,
    cfg: &Config,
    limit_secs: Option<f64>,
) -> Result<(String, Vec<(LandmarkHash, Offset)>, FileDigest, u32), FingerprintError> {
    let DecodedAudio {
        channels,
        sample_rate,
        file_sha1,
    } = decoder::decode_file(path, limit_secs)?;

    let mut all_hashes = Vec::new();
    for channel in &channels {
        // Shorter-than-NFFT channels naturally produce zero frames, zero
        // peaks, and zero hashes, no special case needed.
        let spec = spectrogram::compute(channel, sample_rate, cfg);
        let channel_peaks = peaks::find_peaks(&spec, cfg);
        all_hashes.extend(hashing::generate_hashes(&channel_peaks, cfg));
    }

    let deduped = hashing::dedup(all_hashes);
    let hash_offsets = deduped
        .into_iter()
        .map(|h| (h.hash, h.anchor_time as Offset))
        .collect();

    Ok((record_name_from_path(path), hash_offsets, file_sha1, sample_rate))
}

/// Fingerprint every candidate file under `dir` not already present in the
/// fingerprinted-digest set, fanned out across `cfg.worker_count` blocking
/// tasks.
pub async fn ingest_dir<C>(
    catalog: Arc<Mutex<C>>,
    dir: &Path,
    extensions: &HashSet<String>,
    cfg: Config,
    limit_secs: Option<f64>,
) -> Result<IngestSummary, FingerprintError>
where
    C: Catalog + Send + 'static,
{
    enforce_config(&catalog, &cfg)?;

    let mut seen_digests: HashSet<FileDigest> = {
        let mut cat = catalog.lock().unwrap();
        cat.list_fingerprinted_records()?
            .into_iter()
            .map(|(_, _, digest)| digest)
            .collect()
    };

    let candidates = find_candidate_files(dir, extensions);
    let mut summary = IngestSummary::default();

    // "queued": pre-filter by digest before paying for a decode.
    let mut to_fingerprint = Vec::new();
    for path in candidates {
        match decoder::hash_file(&path) {
            Ok(digest) if seen_digests.contains(&digest) => {
                summary.skipped += 1;
            }
            Ok(_) => to_fingerprint.push(path),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to hash candidate file, skipping");
                summary.failed += 1;
            }
        }
    }

    let worker_count = cfg.worker_count.max(1);
    let results = stream::iter(to_fingerprint.into_iter().map(|path| {
        let cfg = cfg;
        tokio::task::spawn_blocking(move || fingerprint_file(&path, &cfg, limit_secs))
    }))
    .buffer_unordered(worker_count)
    .collect::<Vec<_>>()
    .await;

    for joined in results {
        match joined {
            Ok(Ok((name, hashes, digest, _sample_rate))) => {
                if seen_digests.contains(&digest) {
                    // Raced with another file that fingerprinted to the same
                    // digest during this same run.
                    summary.skipped += 1;
                    continue;
                }

                let catalog = catalog.clone();
                let batch_size = cfg.ingest_batch;
                let insert_result = tokio::task::spawn_blocking(move || {
                    let mut cat = catalog.lock().unwrap();
                    let record_id = cat.insert_record(&name, digest)?;
                    cat.insert_hashes(record_id, &hashes, batch_size)?;
                    cat.mark_fingerprinted(record_id)?;
                    Ok::<_, FingerprintError>(record_id)
                })
                .await;

                match insert_result {
                    Ok(Ok(record_id)) => {
                        info!(record_id, record_name = %name, "marked_fingerprinted");
                        seen_digests.insert(digest);
                        summary.fingerprinted += 1;
                    }
                    Ok(Err(e)) => {
                        warn!(record_name = %name, error = %e, "insert_failed");
                        summary.failed += 1;
                    }
                    Err(e) => {
                        warn!(record_name = %name, error = %e, "worker_crashed during insert");
                        summary.failed += 1;
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "decode_failed");
                summary.failed += 1;
            }
            Err(e) => {
                warn!(error = %e, "worker_crashed");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Ingest a single file, short-circuiting if its digest is already
/// fingerprinted.
pub fn ingest_file<C: Catalog>(
    catalog: &mut C,
    path: &Path,
    cfg: &Config,
    limit_secs: Option<f64>,
) -> Result<Option<i32>, FingerprintError> {
    cfg_check(catalog, cfg)?;

    let digest = decoder::hash_file(path)?;
    let already_fingerprinted = catalog
        .list_fingerprinted_records()?
        .into_iter()
        .any(|(_, _, d)| d == digest);

    if already_fingerprinted {
        info!(path = %path.display(), "already fingerprinted, skipping");
        return Ok(None);
    }

    let (name, hashes, digest, _sample_rate) = fingerprint_file(path, cfg, limit_secs)?;
    let record_id = catalog.insert_record(&name, digest)?;
    catalog.insert_hashes(record_id, &hashes, cfg.ingest_batch)?;
    catalog.mark_fingerprinted(record_id)?;
    info!(record_id, record_name = %name, "marked_fingerprinted");

    Ok(Some(record_id))
}

/// Identify an unknown file against the catalog: fingerprint it the same
/// way as ingestion, then align the resulting hashes' stored offsets into a
/// best (record, offset) guess.
pub fn identify<C: Catalog>(
    catalog: &mut C,
    path: &Path,
    cfg: &Config,
    limit_secs: Option<f64>,
) -> Result<Option<Recognition>, FingerprintError> {
    cfg_check(catalog, cfg)?;

    let (_, queries, _, sample_rate) = fingerprint_file(path, cfg, limit_secs)?;
    let matches = catalog.lookup_matches(&queries, cfg.ingest_batch)?;
    aligner::align(matches, sample_rate, cfg, catalog)
}

fn cfg_check<C: Catalog>(catalog: &mut C, cfg: &Config) -> Result<(), FingerprintError> {
    match catalog.get_stored_params()? {
        Some(stored) => cfg.check_against_stored(&stored),
        None => catalog.set_stored_params(cfg.to_stored()),
    }
}

fn enforce_config<C: Catalog>(catalog: &Arc<Mutex<C>>, cfg: &Config) -> Result<(), FingerprintError> {
    let mut cat = catalog.lock().unwrap();
    cfg_check(&mut *cat, cfg)
}
