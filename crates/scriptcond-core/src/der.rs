//! Minimal definite-length DER for the structures this condition type emits.
//!
//! Only what the fingerprint, condition, and fulfillment encodings need:
//! SEQUENCE, context-specific tags, and non-negative INTEGER contents.

use crate::errors::ConditionError;

/// Universal constructed SEQUENCE.
pub const TAG_SEQUENCE: u8 = 0x30;

/// Context-specific primitive tag `[n]`.
pub const fn context(n: u8) -> u8 {
    0x80 | n
}

/// Context-specific constructed tag `[n]`.
pub const fn context_constructed(n: u8) -> u8 {
    0xa0 | n
}

/// Encodes a DER length prefix.
pub fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = &bytes[skip..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}

/// Encodes one tag-length-value triple.
pub fn encode_tlv(tag: u8, content: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    encode_length(content.len(), out);
    out.extend_from_slice(content);
}

/// Minimal two's-complement contents for a non-negative integer.
pub fn encode_unsigned(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes
        .iter()
        .take_while(|b| **b == 0)
        .count()
        .min(bytes.len() - 1);
    let mut out = Vec::with_capacity(bytes.len() - skip + 1);
    if bytes[skip] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[skip..]);
    out
}

/// Decodes INTEGER contents produced by [`encode_unsigned`].
pub fn decode_unsigned(content: &[u8]) -> Result<u64, ConditionError> {
    match content {
        [] => Err(ConditionError::Parse("empty INTEGER".into())),
        [first, ..] if first & 0x80 != 0 => {
            Err(ConditionError::Parse("negative INTEGER".into()))
        }
        [0, second, ..] if second & 0x80 == 0 => {
            Err(ConditionError::Parse("non-minimal INTEGER".into()))
        }
        _ => {
            let trimmed = if content[0] == 0 { &content[1..] } else { content };
            if trimmed.len() > 8 {
                return Err(ConditionError::Parse("INTEGER exceeds 64 bits".into()));
            }
            Ok(trimmed
                .iter()
                .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
        }
    }
}

/// Cursor over DER bytes.
pub struct DerReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    /// Starts reading at the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Reads a TLV with the expected tag and returns its contents.
    pub fn read(&mut self, expected_tag: u8) -> Result<&'a [u8], ConditionError> {
        let offset = self.pos;
        let tag = self.next_byte()?;
        if tag != expected_tag {
            return Err(ConditionError::Parse(format!(
                "unexpected tag 0x{:02x} at offset {}, expected 0x{:02x}",
                tag, offset, expected_tag
            )));
        }
        let len = self.read_length()?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                ConditionError::Parse(format!("truncated value at offset {}", offset))
            })?;
        let content = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(content)
    }

    /// Fails if unread bytes remain.
    pub fn finish(&self) -> Result<(), ConditionError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ConditionError::Parse(format!(
                "{} trailing bytes",
                self.bytes.len() - self.pos
            )))
        }
    }

    fn next_byte(&mut self) -> Result<u8, ConditionError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| ConditionError::Parse("unexpected end of input".into()))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_length(&mut self) -> Result<usize, ConditionError> {
        let first = self.next_byte()?;
        if first < 0x80 {
            return Ok(usize::from(first));
        }
        let count = usize::from(first & 0x7f);
        if count == 0 {
            return Err(ConditionError::Parse("indefinite length".into()));
        }
        if count > std::mem::size_of::<usize>() {
            return Err(ConditionError::Parse("length too large".into()));
        }
        let mut len = 0usize;
        for i in 0..count {
            let byte = self.next_byte()?;
            if i == 0 && byte == 0 {
                return Err(ConditionError::Parse("non-minimal length".into()));
            }
            len = (len << 8) | usize::from(byte);
        }
        if len < 0x80 {
            return Err(ConditionError::Parse("non-minimal length".into()));
        }
        Ok(len)
    }
}
