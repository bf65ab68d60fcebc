use canonical_json::to_string;
use serde_json::Value;

use crate::identifiers::ProfileId;
use std::fmt;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Provided JSON could not be canonicalized.
    #[error("invalid JSON structure: {0}")]
    InvalidStructure(String),
    /// Non-finite number (NaN/Infinity) detected.
    #[error("non-finite number detected at {0}")]
    NonFiniteNumber(String),
    /// Generic failure from the underlying RFC 8785 encoder.
    #[error("other error: {0}")]
    Other(String),
}

/// Canonical bytes for a JSON value plus shape metrics gathered on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalForm {
    /// Canonical UTF-8 bytes for the input value.
    pub bytes: Vec<u8>,
    /// Maximum nesting depth (scalars are depth 0).
    pub depth: usize,
    /// Total number of object members at every depth.
    pub members: usize,
    /// Profile that produced the bytes.
    pub profile_id: ProfileId,
}

impl CanonicalForm {
    /// Canonical bytes as a string slice.
    pub fn as_str(&self) -> &str {
        // Bytes always come from a `String`.
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }
}

/// Helper for building JSON paths during validation.
#[derive(Debug, Clone)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn push_field(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(field.to_string());
        Self { segments }
    }

    fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(format!("[{}]", index));
        Self { segments }
    }

    fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}

#[derive(Default)]
struct Shape {
    depth: usize,
    members: usize,
}

/// Canonicalizer that emits deterministic bytes for JSON-equivalent values.
///
/// Two values with the same members at every depth serialize identically,
/// whatever the insertion order of their keys.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    profile: ProfileId,
}

impl Canonicalizer {
    /// Creates a new canonicalizer for the provided profile.
    pub fn new(profile: ProfileId) -> Self {
        Self { profile }
    }

    /// Profile this canonicalizer stamps on its output.
    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    /// Produces canonical bytes and shape metrics.
    pub fn canonicalize(&self, value: &Value) -> Result<CanonicalForm, CanonicalizationError> {
        let mut shape = Shape::default();
        self.walk(value, Path::root(), &mut shape)?;

        // RFC 8785 canonicalization
        let canonical =
            to_string(value).map_err(|err| CanonicalizationError::Other(err.to_string()))?;

        Ok(CanonicalForm {
            bytes: canonical.into_bytes(),
            depth: shape.depth,
            members: shape.members,
            profile_id: self.profile.clone(),
        })
    }

    /// Canonical string form of `value`.
    pub fn serialize(&self, value: &Value) -> Result<String, CanonicalizationError> {
        let form = self.canonicalize(value)?;
        String::from_utf8(form.bytes)
            .map_err(|err| CanonicalizationError::InvalidStructure(err.to_string()))
    }

    /// Returns true when both values have identical canonical bytes.
    pub fn equivalent(&self, left: &Value, right: &Value) -> Result<bool, CanonicalizationError> {
        let left = self.canonicalize(left)?;
        let right = self.canonicalize(right)?;
        Ok(left.bytes == right.bytes)
    }

    #[allow(clippy::only_used_in_recursion)]
    fn walk(
        &self,
        value: &Value,
        path: Path,
        shape: &mut Shape,
    ) -> Result<(), CanonicalizationError> {
        shape.depth = shape.depth.max(path.depth());
        match value {
            Value::Object(map) => {
                shape.members += map.len();
                for (key, child) in map {
                    self.walk(child, path.push_field(key), shape)?;
                }
                Ok(())
            }
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    self.walk(item, path.push_index(idx), shape)?;
                }
                Ok(())
            }
            Value::Number(num) => {
                if let Some(f) = num.as_f64() {
                    if num.is_f64() && !f.is_finite() {
                        return Err(CanonicalizationError::NonFiniteNumber(path.to_string()));
                    }
                }
                Ok(())
            }
            Value::String(_) | Value::Bool(_) | Value::Null => Ok(()),
        }
    }
}
