//! Condition type identity and the derived condition encodings.

use scriptcond_canonical::{Digest, TypeName};
use serde::{Deserialize, Serialize};

use crate::der;
use crate::errors::ConditionError;

/// Category of a condition type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    /// Self-contained condition without subconditions.
    Simple,
    /// Condition built from subconditions.
    Compound,
}

/// Identity and fingerprinting surface shared by SHA-256 based condition types.
///
/// Implementors supply the fingerprint contents and cost; the condition
/// identifier, URI and binary encoding follow from those.
pub trait ConditionType {
    /// Registry type id.
    const TYPE_ID: u8;
    /// Type name used in condition URIs.
    const TYPE_NAME: &'static str;
    /// ASN.1 choice name of the condition.
    const TYPE_ASN1_CONDITION: &'static str;
    /// ASN.1 choice name of the fulfillment.
    const TYPE_ASN1_FULFILLMENT: &'static str;
    /// Type category.
    const TYPE_CATEGORY: TypeCategory;

    /// Encoded bytes hashed into the fingerprint.
    fn fingerprint_contents(&self) -> Result<Vec<u8>, ConditionError>;

    /// Cost of fulfilling this condition.
    fn calculate_cost(&self) -> u64;

    /// [`TYPE_NAME`](Self::TYPE_NAME), checked against the type name pattern.
    fn type_name() -> Result<TypeName, ConditionError> {
        TypeName::parse(Self::TYPE_NAME).map_err(|err| ConditionError::Validation(err.to_string()))
    }

    /// SHA-256 of the fingerprint contents.
    fn fingerprint(&self) -> Result<Digest, ConditionError> {
        Ok(Digest::sha256(&self.fingerprint_contents()?))
    }

    /// `ni:` URI naming the condition.
    fn condition_uri(&self) -> Result<String, ConditionError> {
        let fingerprint = self.fingerprint()?;
        Ok(format!(
            "ni:///{};{}?fpt={}&cost={}",
            fingerprint.alg.as_str(),
            fingerprint.b64,
            Self::type_name()?,
            self.calculate_cost()
        ))
    }

    /// Binary condition: `[TYPE_ID] { fingerprint [0], cost [1] }`.
    fn condition_binary(&self) -> Result<Vec<u8>, ConditionError> {
        let fingerprint = self
            .fingerprint()?
            .to_bytes()
            .map_err(|err| ConditionError::Validation(err.to_string()))?;
        let mut body = Vec::new();
        der::encode_tlv(der::context(0), &fingerprint, &mut body);
        der::encode_tlv(
            der::context(1),
            &der::encode_unsigned(self.calculate_cost()),
            &mut body,
        );
        let mut out = Vec::with_capacity(body.len() + 4);
        der::encode_tlv(der::context_constructed(Self::TYPE_ID), &body, &mut out);
        Ok(out)
    }
}
