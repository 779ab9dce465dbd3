//! Aligner: offset-difference histogram over a noisy bag of hash matches,
//! resolved to a best (record, offset) with a first-seen tie-break.

use std::collections::HashMap;

use crate::catalog::{Catalog, RecordId};
use crate::config::Config;
use crate::digest::FileDigest;
use crate::error::FingerprintError;

#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub record_id: RecordId,
    pub record_name: String,
    pub confidence: usize,
    pub offset: i64,
    pub offset_seconds: f64,
    pub file_sha1: FileDigest,
}

/// `offset_seconds = round((delta / fs) * NFFT * OVERLAP, 5)`.
fn offset_to_seconds(delta: i64, fs: u32, cfg: &Config) -> f64 {
    let raw = (delta as f64 / fs as f64) * cfg.nfft as f64 * cfg.overlap_ratio;
    (raw * 100_000.0).round() / 100_000.0
}

/// Find the best (record, offset) by voting. `matches` is `(record_id,
/// delta)`; ties at the argmax are broken by first-seen in iteration order.
pub fn align(
    matches: impl IntoIterator<Item = (RecordId, i64)>,
    fs: u32,
    cfg: &Config,
    catalog: &mut dyn Catalog,
) -> Result<Option<Recognition>, FingerprintError> {
    let mut counts: HashMap<(i64, RecordId), usize> = HashMap::new();
    let mut best_key: Option<(i64, RecordId)> = None;
    let mut best_count = 0usize;

    for (record_id, delta) in matches {
        let key = (delta, record_id);
        let count = counts.entry(key).or_insert(0);
        *count += 1;

        if *count > best_count {
            best_count = *count;
            best_key = Some(key);
        }
    }

    let Some((delta, record_id)) = best_key else {
        return Ok(None);
    };

    let Some((record_name, file_sha1)) = catalog.get_record(record_id)? else {
        return Ok(None);
    };

    Ok(Some(Recognition {
        record_id,
        record_name,
        confidence: best_count,
        offset: delta,
        offset_seconds: offset_to_seconds(delta, fs, cfg),
        file_sha1,
    }))
}
