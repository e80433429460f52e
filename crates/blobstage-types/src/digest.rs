use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Hash algorithm a [`Digest`] was computed with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// SHA-256, the canonical algorithm for OCI content.
    #[default]
    Sha256,
    Sha512,
    Blake3,
}

impl Algorithm {
    /// The canonical algorithm used when none is specified.
    pub const CANONICAL: Self = Self::Sha256;

    /// Name as it appears before the `:` of a digest string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Length of the raw hash output in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Sha256 | Self::Blake3 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Length of the hex-encoded portion of a digest string.
    pub fn encoded_len(&self) -> usize {
        self.size() * 2
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            "blake3" => Ok(Self::Blake3),
            other => Err(TypeError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Algorithm-tagged content identifier, e.g. `sha256:2cf24dba...`.
///
/// A `Digest` is always well formed: the algorithm is known and the encoded
/// part is lower-case hex of the algorithm's output length. Construction goes
/// through [`Digest::from_raw`] (from hash output) or parsing.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    algorithm: Algorithm,
    encoded: String,
}

impl Digest {
    /// Build a digest from raw hash output.
    pub fn from_raw(algorithm: Algorithm, hash: &[u8]) -> Result<Self, TypeError> {
        if hash.len() != algorithm.size() {
            return Err(TypeError::InvalidLength {
                algorithm: algorithm.to_string(),
                expected: algorithm.encoded_len(),
                actual: hash.len() * 2,
            });
        }
        Ok(Self {
            algorithm,
            encoded: hex::encode(hash),
        })
    }

    /// Build a digest from an algorithm and its hex-encoded hash.
    pub fn new(algorithm: Algorithm, encoded: &str) -> Result<Self, TypeError> {
        if encoded.len() != algorithm.encoded_len() {
            return Err(TypeError::InvalidLength {
                algorithm: algorithm.to_string(),
                expected: algorithm.encoded_len(),
                actual: encoded.len(),
            });
        }
        // Upper-case hex decodes fine but would break string equality.
        if encoded.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(TypeError::InvalidHex(encoded.to_string()));
        }
        hex::decode(encoded).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self {
            algorithm,
            encoded: encoded.to_string(),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The hex-encoded hash, without the algorithm prefix.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Short representation (first 12 hex characters).
    pub fn short(&self) -> &str {
        &self.encoded[..12]
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.algorithm, self.short())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

impl FromStr for Digest {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, encoded) = s
            .split_once(':')
            .ok_or_else(|| TypeError::InvalidDigest(s.to_string()))?;
        Self::new(algorithm.parse()?, encoded)
    }
}

impl TryFrom<String> for Digest {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HELLO_SHA256: &str =
        "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn parses_canonical_digest() {
        let digest: Digest = HELLO_SHA256.parse().unwrap();
        assert_eq!(digest.algorithm(), Algorithm::Sha256);
        assert_eq!(digest.encoded().len(), 64);
        assert_eq!(digest.to_string(), HELLO_SHA256);
    }

    #[test]
    fn rejects_missing_separator() {
        let err = "sha256".parse::<Digest>().unwrap_err();
        assert!(matches!(err, TypeError::InvalidDigest(_)));
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let err = "md5:d41d8cd98f00b204e9800998ecf8427e"
            .parse::<Digest>()
            .unwrap_err();
        assert_eq!(err, TypeError::UnsupportedAlgorithm("md5".into()));
    }

    #[test]
    fn rejects_wrong_length() {
        let err = "sha256:abcd".parse::<Digest>().unwrap_err();
        assert!(matches!(
            err,
            TypeError::InvalidLength {
                expected: 64,
                actual: 4,
                ..
            }
        ));
    }

    #[test]
    fn rejects_uppercase_hex() {
        let upper = HELLO_SHA256.to_uppercase().replace("SHA256", "sha256");
        assert!(matches!(
            upper.parse::<Digest>().unwrap_err(),
            TypeError::InvalidHex(_)
        ));
    }

    #[test]
    fn rejects_non_hex() {
        let bad = format!("sha256:{}", "z".repeat(64));
        assert!(matches!(
            bad.parse::<Digest>().unwrap_err(),
            TypeError::InvalidHex(_)
        ));
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(Digest::from_raw(Algorithm::Sha256, &[0u8; 32]).is_ok());
        assert!(Digest::from_raw(Algorithm::Sha512, &[0u8; 32]).is_err());
    }

    #[test]
    fn serializes_as_string() {
        let digest: Digest = HELLO_SHA256.parse().unwrap();
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{HELLO_SHA256}\""));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn deserialize_rejects_garbage() {
        assert!(serde_json::from_str::<Digest>("\"not-a-digest\"").is_err());
    }

    #[test]
    fn debug_is_short() {
        let digest: Digest = HELLO_SHA256.parse().unwrap();
        assert_eq!(format!("{digest:?}"), "Digest(sha256:2cf24dba5fb0)");
    }

    #[test]
    fn canonical_is_sha256() {
        assert_eq!(Algorithm::CANONICAL, Algorithm::Sha256);
        assert_eq!(Algorithm::default(), Algorithm::Sha256);
    }

    proptest! {
        #[test]
        fn parsing_arbitrary_input_never_panics(s in ".*") {
            let _ = s.parse::<Digest>();
        }

        #[test]
        fn raw_bytes_always_produce_valid_digest(bytes in proptest::collection::vec(any::<u8>(), 64)) {
            let digest = Digest::from_raw(Algorithm::Sha512, &bytes).unwrap();
            prop_assert_eq!(digest.to_string().parse::<Digest>().unwrap(), digest);
        }
    }
}
