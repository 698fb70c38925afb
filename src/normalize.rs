//! Caseless, NFD-normalized comparison keys for block codes, frame codes and
//! data names (§4.1).
//!
//! Loop categories and table keys are compared literally and never go
//! through this module.

use crate::error::CifError;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// CIF's physical line limit, in UTF-16 code units (§6).
pub const LINE_LIMIT: usize = 2048;

/// The normalization key used to test block/frame/data-name equality.
///
/// Built by NFD-decomposing the input and folding the result to lowercase.
/// Two names collide iff their keys are bit-identical (idempotent: running
/// normalization again on a key returns the same key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormKey(String);

impl NormKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NormKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the normalization key for `s` (§4.1 steps 1-2: NFD then
/// locale-independent lowercase fold).
pub fn normalize(s: &str) -> NormKey {
    let decomposed: String = s.nfd().collect();
    NormKey(decomposed.to_lowercase())
}

fn is_control(c: char) -> bool {
    c.is_control()
}

/// A code point this grammar never allows inside a name: quotes, brackets,
/// braces, or whitespace.
fn is_disallowed_in_name(c: char) -> bool {
    matches!(c, '\'' | '"' | '[' | ']' | '{' | '}') || c.is_whitespace()
}

/// A disallowed Unicode code point for block/frame codes: unpaired
/// surrogates (unrepresentable as `char` so excluded by construction) and
/// noncharacters.
fn is_disallowed_unicode(c: char) -> bool {
    let cp = c as u32;
    let low_plane_noncharacter = (0xFDD0..=0xFDEF).contains(&cp);
    let trailing_noncharacter = (cp & 0xFFFE) == 0xFFFE;
    low_plane_noncharacter || trailing_noncharacter
}

/// Validate a data name: must start with `_`, contain no whitespace,
/// control characters, quote/bracket/brace characters, and fit the line
/// limit.
pub fn validate_item_name(name: &str) -> Result<(), CifError> {
    if !name.starts_with('_') {
        return Err(CifError::InvalidItemName { name: name.to_string(), at: None });
    }
    if name.encode_utf16().count() > LINE_LIMIT {
        return Err(CifError::InvalidItemName { name: name.to_string(), at: None });
    }
    if name.chars().any(|c| is_control(c) || is_disallowed_in_name(c)) {
        return Err(CifError::InvalidItemName { name: name.to_string(), at: None });
    }
    Ok(())
}

/// Validate a block or frame code: non-empty, no whitespace, no control
/// characters, no disallowed Unicode, and within the line limit.
pub fn validate_container_code(code: &str) -> Result<(), CifError> {
    if code.is_empty() {
        return Err(CifError::InvalidBlockCode { code: code.to_string(), at: None });
    }
    if code.encode_utf16().count() > LINE_LIMIT {
        return Err(CifError::InvalidBlockCode { code: code.to_string(), at: None });
    }
    if code
        .chars()
        .any(|c| c.is_whitespace() || is_control(c) || is_disallowed_unicode(c))
    {
        return Err(CifError::InvalidBlockCode { code: code.to_string(), at: None });
    }
    Ok(())
}
