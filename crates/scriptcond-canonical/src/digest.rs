use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;

use crate::validation::ValidationError;

/// Supported digest algorithms for condition fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlg {
    /// SHA-256, the hash behind every `*-sha-256` condition type.
    #[serde(rename = "sha-256")]
    Sha256,
}

impl DigestAlg {
    /// Name used in `ni:` URIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlg::Sha256 => "sha-256",
        }
    }

    /// Digest size in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlg::Sha256 => 32,
        }
    }
}

/// Algorithm + bytes digest, encoded as base64url without padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest {
    /// Digest algorithm (currently always `sha-256`).
    pub alg: DigestAlg,
    /// Base64URL (no padding) digest bytes.
    #[serde(rename = "b64")]
    pub b64: String,
}

impl Digest {
    /// Constructs a validated digest.
    pub fn new(alg: DigestAlg, b64: impl Into<String>) -> Result<Self, ValidationError> {
        let b64 = b64.into();
        let re = Regex::new(r"^[A-Za-z0-9_-]{43,44}$").expect("invalid regex");
        if !re.is_match(&b64) {
            return Err(ValidationError::PatternMismatch {
                field: "digest",
                value: b64,
            });
        }
        Ok(Digest { alg, b64 })
    }

    /// Hashes `bytes` with SHA-256.
    pub fn sha256(bytes: &[u8]) -> Self {
        let hash = Sha256::digest(bytes);
        Digest {
            alg: DigestAlg::Sha256,
            b64: URL_SAFE_NO_PAD.encode(hash),
        }
    }

    /// Wraps raw digest bytes, which must have the algorithm's size.
    pub fn from_bytes(alg: DigestAlg, bytes: &[u8]) -> Result<Self, ValidationError> {
        check_len(alg, bytes.len())?;
        Ok(Digest {
            alg,
            b64: URL_SAFE_NO_PAD.encode(bytes),
        })
    }

    /// Parses `sha-256;<b64>` or a bare base64url value.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let alg = DigestAlg::Sha256;
        let b64 = text
            .strip_prefix(alg.as_str())
            .and_then(|rest| rest.strip_prefix(';'))
            .unwrap_or(text);
        let digest = Self::new(alg, b64)?;
        digest.to_bytes()?;
        Ok(digest)
    }

    /// Decodes the raw digest bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ValidationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(&self.b64)
            .map_err(|_| ValidationError::PatternMismatch {
                field: "digest",
                value: self.b64.clone(),
            })?;
        check_len(self.alg, bytes.len())?;
        Ok(bytes)
    }
}

fn check_len(alg: DigestAlg, actual: usize) -> Result<(), ValidationError> {
    if actual != alg.output_len() {
        return Err(ValidationError::LengthMismatch {
            field: "digest",
            expected: alg.output_len(),
            actual,
        });
    }
    Ok(())
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.alg.as_str(), self.b64)
    }
}
