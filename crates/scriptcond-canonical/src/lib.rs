//! Canonical JSON and digest primitives for scriptable conditions.
//!
//! Script results are compared through their RFC 8785 canonical form, so two
//! results that hold the same members at every depth compare equal regardless
//! of key order. Digests are the SHA-256 values that condition identifiers
//! are built from.
//!
#![deny(missing_docs)]

/// Canonicalization helpers for deterministic comparison.
pub mod canonicalizer;
/// Digest primitives.
pub mod digest;
/// Identifier newtypes.
pub mod identifiers;
/// Validation errors used by canonical types.
pub mod validation;

pub use canonicalizer::{CanonicalForm, CanonicalizationError, Canonicalizer};
pub use digest::{Digest, DigestAlg};
pub use identifiers::{ProfileId, TypeName, DEFAULT_PROFILE};
pub use validation::ValidationError;
