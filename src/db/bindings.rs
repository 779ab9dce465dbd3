use diesel::prelude::*;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Record {
    pub id: i32,
    pub record_name: String,
    pub fingerprinted: bool,
    pub file_sha1: Vec<u8>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::records)]
pub struct NewRecord {
    pub record_name: String,
    pub fingerprinted: bool,
    pub file_sha1: Vec<u8>,
}

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = crate::schema::fingerprints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Fingerprint {
    pub hash: Vec<u8>,
    pub offset: i32,
    pub record_id: i32,
}

/// Plain carrier for a matched row, assembled from [`Fingerprint`] rows.
/// Not queried directly, so it derives nothing diesel-specific.
#[derive(Debug)]
pub struct FingerprintMatch {
    pub hash: Vec<u8>,
    pub record_id: i32,
    pub offset: i32,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::fingerprint_params)]
pub struct NewParams {
    pub id: i32,
    pub sample_rate_default: i32,
    pub nfft: i32,
    pub overlap_ratio: f64,
    pub amp_min: f64,
    pub peak_neighborhood: i32,
    pub fan_value: i32,
    pub min_delta: i32,
    pub max_delta: i32,
}
