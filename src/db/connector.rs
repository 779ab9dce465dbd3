//! Reference [`Catalog`] implementation backed by Postgres via `diesel`.
//! A B-tree index on `fingerprints.hash` (see `migrations/`) keeps lookup
//! sub-linear in catalog size.

use std::collections::HashMap;

use diesel::{dsl::insert_into, prelude::*, upsert::on_constraint};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use dotenvy::dotenv;
use std::env;

use crate::catalog::{Catalog, Offset, RecordId};
use crate::config::StoredParams;
use crate::db::bindings::{Fingerprint, FingerprintMatch, NewParams, NewRecord, Record};
use crate::digest::{FileDigest, LandmarkHash};
use crate::error::FingerprintError;
use crate::schema::{fingerprint_params, fingerprints, records};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub struct PgCatalog {
    pub connection: PgConnection,
}

impl PgCatalog {
    pub fn connect(database_url: &str) -> Result<Self, FingerprintError> {
        let mut connection = PgConnection::establish(database_url)?;
        connection
            .run_pending_migrations(MIGRATIONS)
            .map_err(FingerprintError::Migration)?;
        Ok(Self { connection })
    }

    /// Connect using `DATABASE_URL` from the environment/`.env`, per the
    /// teacher's existing `dotenvy` convention.
    pub fn connect_from_env() -> Result<Self, FingerprintError> {
        dotenv().ok();
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| FingerprintError::Catalog("DATABASE_URL must be set".into()))?;
        Self::connect(&database_url)
    }
}

impl Catalog for PgCatalog {
    fn list_fingerprinted_records(
        &mut self,
    ) -> Result<Vec<(RecordId, String, FileDigest)>, FingerprintError> {
        let rows: Vec<Record> = records::table
            .select(Record::as_select())
            .filter(records::fingerprinted.eq(true))
            .load(&mut self.connection)?;

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let arr: [u8; 20] = r.file_sha1.try_into().ok()?;
                Some((r.id, r.record_name, FileDigest::from_bytes(arr)))
            })
            .collect())
    }

    fn insert_record(&mut self, name: &str, file_sha1: FileDigest) -> Result<RecordId, FingerprintError> {
        let new_record = NewRecord {
            record_name: name.to_string(),
            fingerprinted: false,
            file_sha1: file_sha1.as_bytes().to_vec(),
        };

        let inserted: Record = insert_into(records::table)
            .values(&new_record)
            .returning(Record::as_select())
            .get_result(&mut self.connection)?;

        Ok(inserted.id)
    }

    fn insert_hashes(
        &mut self,
        record_id: RecordId,
        hashes: &[(LandmarkHash, Offset)],
        batch_size: usize,
    ) -> Result<(), FingerprintError> {
        let rows: Vec<Fingerprint> = hashes
            .iter()
            .map(|&(hash, offset)| Fingerprint {
                hash: hash.as_bytes().to_vec(),
                offset,
                record_id,
            })
            .collect();

        // Partial-failure policy: wrap every batch in one transaction so a
        // failing batch leaves the record not-fingerprinted.
        self.connection.transaction(|conn| {
            for batch in rows.chunks(batch_size.max(1)) {
                insert_into(fingerprints::table).values(batch).execute(conn)?;
            }
            Ok::<_, diesel::result::Error>(())
        })?;

        Ok(())
    }

    fn mark_fingerprinted(&mut self, record_id: RecordId) -> Result<(), FingerprintError> {
        diesel::update(records::table.filter(records::id.eq(record_id)))
            .set(records::fingerprinted.eq(true))
            .execute(&mut self.connection)?;
        Ok(())
    }

    fn get_record(&mut self, record_id: RecordId) -> Result<Option<(String, FileDigest)>, FingerprintError> {
        let row: Option<Record> = records::table
            .select(Record::as_select())
            .filter(records::id.eq(record_id))
            .first(&mut self.connection)
            .optional()?;

        Ok(row.and_then(|r| {
            let arr: [u8; 20] = r.file_sha1.try_into().ok()?;
            Some((r.record_name, FileDigest::from_bytes(arr)))
        }))
    }

    fn lookup_matches(
        &mut self,
        queries: &[(LandmarkHash, Offset)],
        batch_size: usize,
    ) -> Result<Vec<(RecordId, i64)>, FingerprintError> {
        // Group query offsets by hash so one DB row fans out to a match per
        // anchor that produced that hash.
        let mut by_hash: HashMap<LandmarkHash, Vec<Offset>> = HashMap::new();
        for &(hash, offset) in queries {
            by_hash.entry(hash).or_default().push(offset);
        }

        let unique_hashes: Vec<Vec<u8>> = by_hash.keys().map(|h| h.as_bytes().to_vec()).collect();
        let mut rows: Vec<FingerprintMatch> = Vec::new();

        for batch in unique_hashes.chunks(batch_size.max(1)) {
            let found: Vec<Fingerprint> = fingerprints::table
                .select(Fingerprint::as_select())
                .filter(fingerprints::hash.eq_any(batch))
                .load(&mut self.connection)?;
            rows.extend(found.into_iter().map(|f| FingerprintMatch {
                hash: f.hash,
                record_id: f.record_id,
                offset: f.offset,
            }));
        }

        let mut out = Vec::new();
        for row in rows {
            let arr: [u8; 10] = row
                .hash
                .clone()
                .try_into()
                .expect("stored hash is always 10 bytes");
            let hash = LandmarkHash::from_bytes(arr);

            if let Some(query_offsets) = by_hash.get(&hash) {
                for &query_offset in query_offsets {
                    out.push((row.record_id, row.offset as i64 - query_offset as i64));
                }
            }
        }

        Ok(out)
    }

    fn get_stored_params(&mut self) -> Result<Option<StoredParams>, FingerprintError> {
        let row: Option<StoredParams> = fingerprint_params::table
            .select((
                fingerprint_params::sample_rate_default,
                fingerprint_params::nfft,
                fingerprint_params::overlap_ratio,
                fingerprint_params::amp_min,
                fingerprint_params::peak_neighborhood,
                fingerprint_params::fan_value,
                fingerprint_params::min_delta,
                fingerprint_params::max_delta,
            ))
            .filter(fingerprint_params::id.eq(1))
            .first(&mut self.connection)
            .optional()?;
        Ok(row)
    }

    fn set_stored_params(&mut self, params: StoredParams) -> Result<(), FingerprintError> {
        let new_params = NewParams {
            id: 1,
            sample_rate_default: params.sample_rate_default,
            nfft: params.nfft,
            overlap_ratio: params.overlap_ratio,
            amp_min: params.amp_min,
            peak_neighborhood: params.peak_neighborhood,
            fan_value: params.fan_value,
            min_delta: params.min_delta,
            max_delta: params.max_delta,
        };

        insert_into(fingerprint_params::table)
            .values(&new_params)
            .on_conflict(on_constraint("fingerprint_params_pkey"))
            .do_update()
            .set(&new_params)
            .execute(&mut self.connection)?;

        Ok(())
    }
}
