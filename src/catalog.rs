//! Catalog interface: the trait-shaped repository boundary between the
//! fingerprinting pipeline and whatever indexed store backs it.
//! [`db::connector::PgCatalog`](crate::db::connector::PgCatalog) is the
//! reference Postgres implementation; [`InMemoryCatalog`] is a test double
//! used by the unit and integration tests so the pipeline is exercisable
//! without a live database.

use std::collections::HashMap;

use crate::config::StoredParams;
use crate::digest::{FileDigest, LandmarkHash};
use crate::error::FingerprintError;

pub type RecordId = i32;
pub type Offset = i32;

/// Abstract repository contract. All methods are blocking, since the
/// orchestrator runs catalog calls inside `spawn_blocking` so a synchronous
/// trait composes cleanly with the async worker pool.
pub trait Catalog {
    /// Records with `fingerprinted = true` only.
    fn list_fingerprinted_records(
        &mut self,
    ) -> Result<Vec<(RecordId, String, FileDigest)>, FingerprintError>;

    /// Creates a record with `fingerprinted = false`.
    fn insert_record(&mut self, name: &str, file_sha1: FileDigest) -> Result<RecordId, FingerprintError>;

    /// Bulk insert, chunked into batches of `batch_size`. If any batch
    /// fails the record must remain not-fingerprinted.
    fn insert_hashes(
        &mut self,
        record_id: RecordId,
        hashes: &[(LandmarkHash, Offset)],
        batch_size: usize,
    ) -> Result<(), FingerprintError>;

    /// Idempotent.
    fn mark_fingerprinted(&mut self, record_id: RecordId) -> Result<(), FingerprintError>;

    fn get_record(&mut self, record_id: RecordId) -> Result<Option<(String, FileDigest)>, FingerprintError>;

    /// `(record_id, stored_offset - query_offset)` for every stored hash
    /// matching one of `queries`. Implementations must chunk IN-queries to
    /// at most `batch_size` hashes.
    fn lookup_matches(
        &mut self,
        queries: &[(LandmarkHash, Offset)],
        batch_size: usize,
    ) -> Result<Vec<(RecordId, i64)>, FingerprintError>;

    /// The fingerprint-format parameters baked into the catalog's existing
    /// data, if any has ever been written.
    fn get_stored_params(&mut self) -> Result<Option<StoredParams>, FingerprintError>;

    fn set_stored_params(&mut self, params: StoredParams) -> Result<(), FingerprintError>;
}

/// HashMap-backed [`Catalog`] with no external dependencies, for tests.
#[derive(Default)]
pub struct InMemoryCatalog {
    next_id: RecordId,
    records: HashMap<RecordId, (String, FileDigest, bool)>,
    // hash -> Vec<(record_id, offset)>
    hashes: HashMap<LandmarkHash, Vec<(RecordId, Offset)>>,
    params: Option<StoredParams>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }
}

impl Catalog for InMemoryCatalog {
    fn list_fingerprinted_records(
        &mut self,
    ) -> Result<Vec<(RecordId, String, FileDigest)>, FingerprintError> {
        Ok(self
            .records
            .iter()
            .filter(|(_, (_, _, fp))| *fp)
            .map(|(id, (name, digest, _))| (*id, name.clone(), *digest))
            .collect())
    }

    fn insert_record(&mut self, name: &str, file_sha1: FileDigest) -> Result<RecordId, FingerprintError> {
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(id, (name.to_string(), file_sha1, false));
        Ok(id)
    }

    fn insert_hashes(
        &mut self,
        record_id: RecordId,
        hashes: &[(LandmarkHash, Offset)],
        batch_size: usize,
    ) -> Result<(), FingerprintError> {
        for batch in hashes.chunks(batch_size.max(1)) {
            for &(hash, offset) in batch {
                self.hashes.entry(hash).or_default().push((record_id, offset));
            }
        }
        Ok(())
    }

    fn mark_fingerprinted(&mut self, record_id: RecordId) -> Result<(), FingerprintError> {
        if let Some(entry) = self.records.get_mut(&record_id) {
            entry.2 = true;
        }
        Ok(())
    }

    fn get_record(&mut self, record_id: RecordId) -> Result<Option<(String, FileDigest)>, FingerprintError> {
        Ok(self.records.get(&record_id).map(|(name, digest, _)| (name.clone(), *digest)))
    }

    fn lookup_matches(
        &mut self,
        queries: &[(LandmarkHash, Offset)],
        batch_size: usize,
    ) -> Result<Vec<(RecordId, i64)>, FingerprintError> {
        let mut out = Vec::new();
        for batch in queries.chunks(batch_size.max(1)) {
            for &(hash, query_offset) in batch {
                if let Some(stored) = self.hashes.get(&hash) {
                    for &(record_id, stored_offset) in stored {
                        out.push((record_id, stored_offset as i64 - query_offset as i64));
                    }
                }
            }
        }
        Ok(out)
    }

    fn get_stored_params(&mut self) -> Result<Option<StoredParams>, FingerprintError> {
        Ok(self.params)
    }

    fn set_stored_params(&mut self, params: StoredParams) -> Result<(), FingerprintError> {
        self.params = Some(params);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn insert_then_lookup_round_trips() {
        let mut cat = InMemoryCatalog::new();
        let digest = FileDigest::from_bytes([1u8; 20]);
        let rid = cat.insert_record("tone", digest).unwrap();

        let h = LandmarkHash::from_bytes([2u8; 10]);
        cat.insert_hashes(rid, &[(h, 100)], 1000).unwrap();
        cat.mark_fingerprinted(rid).unwrap();

        assert!(cat.list_fingerprinted_records().unwrap().len() == 1);

        let matches = cat.lookup_matches(&[(h, 40)], 1000).unwrap();
        assert_eq!(matches, vec![(rid, 60)]);
    }

    #[test]
    fn not_yet_fingerprinted_record_is_hidden_from_listing() {
        let mut cat = InMemoryCatalog::new();
        let digest = FileDigest::from_bytes([3u8; 20]);
        cat.insert_record("unfinished", digest).unwrap();
        assert!(cat.list_fingerprinted_records().unwrap().is_empty());
    }

    #[test]
    fn stored_params_round_trip() {
        let mut cat = InMemoryCatalog::new();
        assert!(cat.get_stored_params().unwrap().is_none());
        let cfg = Config::default();
        cat.set_stored_params(cfg.to_stored()).unwrap();
        assert!(cat.get_stored_params().unwrap().is_some());
    }
}
