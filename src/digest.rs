//! Fixed-size byte types for file digests and landmark hashes. Both render
//! as uppercase ASCII hex; both are stored and compared as raw bytes
//! end-to-end, keeping hash casing consistent between insert and lookup.

use std::fmt;

/// SHA-1 digest of a file's raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileDigest([u8; 20]);

impl FileDigest {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn from_hex(hex_str: &str) -> Option<Self> {
        let bytes = hex::decode(hex_str).ok()?;
        let arr: [u8; 20] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

/// Truncated-SHA-1 landmark hash: 10 raw bytes, the first 20 hex characters
/// of a SHA-1 digest of the `"{freq1}, {freq2}, {delta}"` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LandmarkHash([u8; 10]);

impl LandmarkHash {
    pub fn from_bytes(bytes: [u8; 10]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 10] {
        &self.0
    }

    pub fn from_hex(hex_str: &str) -> Option<Self> {
        let bytes = hex::decode(hex_str).ok()?;
        let arr: [u8; 10] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Display for LandmarkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_hash_round_trips_through_hex() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let h = LandmarkHash::from_bytes(bytes);
        let rendered = h.to_string();
        assert_eq!(rendered.len(), 20);
        let parsed = LandmarkHash::from_hex(&rendered).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn digest_renders_uppercase_40_chars() {
        let d = FileDigest::from_bytes([0xab; 20]);
        let s = d.to_string();
        assert_eq!(s.len(), 40);
        assert_eq!(s, s.to_uppercase());
    }
}
