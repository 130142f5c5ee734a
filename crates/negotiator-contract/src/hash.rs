//! Definition hashes
//!
//! Provides [`DefinitionHash`], the `algorithm:sum` string under which signed
//! definitions are addressed, and [`HashDigest`], its wire representation.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Number of sum characters shown in short descriptions
const SHORT_LEN: usize = 14;

/// Wire form of a hash: `{"algorithm": "...", "sum": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm name (e.g. `SHA-256`)
    pub algorithm: String,
    /// Encoded digest
    pub sum: String,
}

impl HashDigest {
    /// Create new digest
    #[inline]
    #[must_use]
    pub fn new(algorithm: impl Into<String>, sum: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            sum: sum.into(),
        }
    }
}

/// Hash identifying a signed definition, rendered as `algorithm:sum`
///
/// Cheap to compare and usable as a map key; lookups accept plain `&str`
/// since contract arguments carry hashes as untyped strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionHash(String);

impl DefinitionHash {
    /// Build from wire digest
    #[inline]
    #[must_use]
    pub fn from_digest(digest: &HashDigest) -> Self {
        Self(format!("{}:{}", digest.algorithm, digest.sum))
    }

    /// Full `algorithm:sum` string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Algorithm part, if the hash carries one
    #[inline]
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.0.split_once(':').map(|(algorithm, _)| algorithm)
    }

    /// Sum part (everything after the first `:`, or the whole string)
    #[inline]
    #[must_use]
    pub fn sum(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(_, sum)| sum)
    }

    /// Short sum prefix used in human-readable descriptions
    #[must_use]
    pub fn short(&self) -> String {
        self.sum().chars().take(SHORT_LEN).collect()
    }
}

impl Display for DefinitionHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DefinitionHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(HashError::Empty);
        }
        match s.split_once(':') {
            Some((algorithm, sum)) if !algorithm.is_empty() && !sum.is_empty() => {
                Ok(Self(s.to_string()))
            }
            _ => Err(HashError::Malformed(s.to_string())),
        }
    }
}

impl From<&HashDigest> for DefinitionHash {
    fn from(digest: &HashDigest) -> Self {
        Self::from_digest(digest)
    }
}

impl Borrow<str> for DefinitionHash {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DefinitionHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing definition hashes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    /// Empty hash string
    #[error("empty definition hash")]
    Empty,

    /// Missing algorithm or sum
    #[error("malformed definition hash '{0}': expected 'algorithm:sum'")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_from_digest_joins_parts() {
        let hash = DefinitionHash::from_digest(&HashDigest::new("SHA-256", "abcdef"));
        assert_eq!(hash.as_str(), "SHA-256:abcdef");
        assert_eq!(hash.algorithm(), Some("SHA-256"));
        assert_eq!(hash.sum(), "abcdef");
    }

    #[test]
    fn hash_short_takes_fourteen_sum_chars() {
        let hash: DefinitionHash = "SHA-256:0123456789abcdefghij".parse().unwrap();
        assert_eq!(hash.short(), "0123456789abcd");
    }

    #[test]
    fn hash_short_of_short_sum() {
        let hash: DefinitionHash = "md5:abc".parse().unwrap();
        assert_eq!(hash.short(), "abc");
    }

    #[test]
    fn hash_parse_rejects_malformed() {
        assert_eq!("".parse::<DefinitionHash>(), Err(HashError::Empty));
        assert!(matches!(
            "nocolon".parse::<DefinitionHash>(),
            Err(HashError::Malformed(_))
        ));
        assert!(matches!(
            ":sum".parse::<DefinitionHash>(),
            Err(HashError::Malformed(_))
        ));
    }

    #[test]
    fn hash_serde_is_plain_string() {
        let hash: DefinitionHash = "SHA-256:ff".parse().unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, "\"SHA-256:ff\"");
    }

    #[test]
    fn digest_deserializes_from_wire() {
        let digest: HashDigest =
            serde_json::from_str(r#"{"algorithm":"SHA-256","sum":"aa"}"#).unwrap();
        assert_eq!(digest, HashDigest::new("SHA-256", "aa"));
    }
}
