//! Object identifiers: SHA-256 digests rendered as lowercase hex.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of an abbreviated id in human output.
pub const SHORT_LEN: usize = 7;

/// The id of a stored object (blob or commit).
///
/// Serialized as a plain string. Deserializing validates the string, so a
/// malformed id in a stored commit or index is a JSON error rather than a
/// bad path later on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Hash `data` into its content id.
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        ObjectId(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Wrap an id read back from disk (a ref file, an object file name).
    ///
    /// Returns `None` unless `s` is 64 lowercase hex characters.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| ObjectId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first [`SHORT_LEN`] characters.
    pub fn short(&self) -> &str {
        &self.0[..SHORT_LEN]
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("invalid object id: {s:?}"))
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(ObjectId::of(b"hello world"), ObjectId::of(b"hello world"));
    }

    #[test]
    fn test_hash_different_inputs() {
        assert_ne!(ObjectId::of(b"hello"), ObjectId::of(b"world"));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            ObjectId::of(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let id = ObjectId::of(b"x");
        assert_eq!(ObjectId::parse(id.as_str()), Some(id.clone()));
        assert!(ObjectId::parse("deadbeef").is_none());
        assert!(ObjectId::parse(&id.as_str().to_uppercase()).is_none());
    }

    #[test]
    fn test_short() {
        let id = ObjectId::of(b"abc");
        assert_eq!(id.short().len(), SHORT_LEN);
        assert!(id.as_str().starts_with(id.short()));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ObjectId::of(b"abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_deserialize_validates() {
        let id = ObjectId::of(b"abc");
        let back: ObjectId = serde_json::from_str(&format!("\"{id}\"")).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ObjectId>("\"zz\"").is_err());
        assert!(serde_json::from_str::<ObjectId>("\"\"").is_err());
    }
}
