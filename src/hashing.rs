//! Landmark hash generator: combinatorial fan-out over sorted peaks,
//! truncated-SHA-1 hashing of the `"{freq1}, {freq2}, {delta}"` token.

use sha1::{Digest as _, Sha1};
use std::collections::HashSet;

use crate::config::Config;
use crate::digest::LandmarkHash;
use crate::peaks::Peak;

/// One emitted hash and the anchor frame it was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashedLandmark {
    pub hash: LandmarkHash,
    pub anchor_time: usize,
}

/// Generate landmark hashes from a peak set. Peaks are sorted by ascending
/// time_frame (stable, ties broken by freq_bin) before fan-out.
pub fn generate_hashes(peaks: &[Peak], cfg: &Config) -> Vec<HashedLandmark> {
    let mut sorted = peaks.to_vec();
    sorted.sort_by(|a, b| {
        a.time_frame
            .cmp(&b.time_frame)
            .then(a.freq_bin.cmp(&b.freq_bin))
    });

    let mut hashes = Vec::new();

    for i in 0..sorted.len() {
        let anchor = &sorted[i];
        for j in 1..cfg.fan_value {
            let Some(target) = sorted.get(i + j) else {
                break;
            };

            let delta = target.time_frame as i64 - anchor.time_frame as i64;
            if delta < cfg.min_delta || delta > cfg.max_delta {
                continue;
            }

            let token = format!("{}, {}, {}", anchor.freq_bin, target.freq_bin, delta);
            let digest = Sha1::digest(token.as_bytes());
            // First 20 hex chars of the SHA-1 digest == its first 10 raw bytes.
            // `LandmarkHash` is fixed at that width, so the truncation isn't a
            // tunable and can't produce a malformed hash.
            let mut bytes = [0u8; 10];
            bytes.copy_from_slice(&digest[..10]);
            let hash = LandmarkHash::from_bytes(bytes);

            hashes.push(HashedLandmark {
                hash,
                anchor_time: anchor.time_frame,
            });
        }
    }

    hashes
}

/// Deduplicate (hash, offset) pairs produced across all channels of one
/// file.
pub fn dedup(hashes: impl IntoIterator<Item = HashedLandmark>) -> Vec<HashedLandmark> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for h in hashes {
        if seen.insert((h.hash, h.anchor_time)) {
            out.push(h);
        }
    }
    out
}
