//! Tunable fingerprinting parameters.
//!
//! Changing any of the first eight fields below invalidates existing catalog
//! data; [`Config::check_against_stored`] is how the orchestrator enforces
//! that before touching a populated catalog.

use std::env;

use diesel::prelude::Queryable;

use crate::error::FingerprintError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub sample_rate_default: u32,
    pub nfft: usize,
    pub overlap_ratio: f64,
    pub amp_min: f32,
    pub peak_neighborhood: i32,
    pub fan_value: usize,
    pub min_delta: i64,
    pub max_delta: i64,
    pub ingest_batch: usize,
    pub worker_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate_default: 44_100,
            nfft: 4096,
            overlap_ratio: 0.5,
            amp_min: 10.0,
            peak_neighborhood: 20,
            fan_value: 15,
            min_delta: 0,
            max_delta: 200,
            ingest_batch: 1000,
            worker_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl Config {
    pub fn hop(&self) -> usize {
        (self.nfft as f64 * (1.0 - self.overlap_ratio)) as usize
    }

    /// Overlay `SABI_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = env::var("SABI_SAMPLE_RATE_DEFAULT") {
            if let Ok(v) = v.parse() {
                cfg.sample_rate_default = v;
            }
        }
        if let Ok(v) = env::var("SABI_NFFT") {
            if let Ok(v) = v.parse() {
                cfg.nfft = v;
            }
        }
        if let Ok(v) = env::var("SABI_OVERLAP_RATIO") {
            if let Ok(v) = v.parse() {
                cfg.overlap_ratio = v;
            }
        }
        if let Ok(v) = env::var("SABI_AMP_MIN") {
            if let Ok(v) = v.parse() {
                cfg.amp_min = v;
            }
        }
        if let Ok(v) = env::var("SABI_PEAK_NEIGHBORHOOD") {
            if let Ok(v) = v.parse() {
                cfg.peak_neighborhood = v;
            }
        }
        if let Ok(v) = env::var("SABI_FAN_VALUE") {
            if let Ok(v) = v.parse() {
                cfg.fan_value = v;
            }
        }
        if let Ok(v) = env::var("SABI_MIN_DELTA") {
            if let Ok(v) = v.parse() {
                cfg.min_delta = v;
            }
        }
        if let Ok(v) = env::var("SABI_MAX_DELTA") {
            if let Ok(v) = v.parse() {
                cfg.max_delta = v;
            }
        }
        if let Ok(v) = env::var("SABI_INGEST_BATCH") {
            if let Ok(v) = v.parse() {
                cfg.ingest_batch = v;
            }
        }
        if let Ok(v) = env::var("SABI_WORKER_COUNT") {
            if let Ok(v) = v.parse() {
                cfg.worker_count = v;
            }
        }

        cfg
    }

    /// Compare the fingerprint-format-affecting fields against a row
    /// previously persisted by the catalog. `worker_count` and
    /// `ingest_batch` are runtime/throughput knobs, not part of the hash
    /// format, and are intentionally excluded.
    pub fn check_against_stored(&self, stored: &StoredParams) -> Result<(), FingerprintError> {
        macro_rules! check {
            ($field:ident, $name:literal) => {
                if self.$field as f64 != stored.$field as f64 {
                    return Err(FingerprintError::ConfigMismatch {
                        field: $name,
                        stored: stored.$field.to_string(),
                        current: self.$field.to_string(),
                    });
                }
            };
        }

        check!(sample_rate_default, "sample_rate_default");
        check!(nfft, "nfft");
        check!(overlap_ratio, "overlap_ratio");
        check!(amp_min, "amp_min");
        check!(peak_neighborhood, "peak_neighborhood");
        check!(fan_value, "fan_value");
        check!(min_delta, "min_delta");
        check!(max_delta, "max_delta");

        Ok(())
    }

    pub fn to_stored(self) -> StoredParams {
        StoredParams {
            sample_rate_default: self.sample_rate_default as i32,
            nfft: self.nfft as i32,
            overlap_ratio: self.overlap_ratio,
            amp_min: self.amp_min as f64,
            peak_neighborhood: self.peak_neighborhood,
            fan_value: self.fan_value as i32,
            min_delta: self.min_delta as i32,
            max_delta: self.max_delta as i32,
        }
    }
}

/// The row persisted in `fingerprint_params`, mirroring [`Config`]'s eight
/// hash-format fields at SQL-friendly widths. `hash_hex_prefix` is
/// deliberately absent: the landmark hash width is fixed by
/// [`crate::digest::LandmarkHash`], not a tunable, so there is nothing to
/// persist or compare for it (see `hashing::generate_hashes`).
#[derive(Debug, Clone, Copy, Queryable)]
pub struct StoredParams {
    pub sample_rate_default: i32,
    pub nfft: i32,
    pub overlap_ratio: f64,
    pub amp_min: f64,
    pub peak_neighborhood: i32,
    pub fan_value: i32,
    pub min_delta: i32,
    pub max_delta: i32,
}
