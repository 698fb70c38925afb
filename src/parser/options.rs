//! Parser configuration (§6 "Configuration options").

use crate::encoding::Encoding;

/// Options recognized by the parser.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// `default_to_cif2`: when the version cannot be detected from a BOM
    /// or the CIF 2.0 magic, treat the input as CIF 2.0.
    pub default_to_cif2: bool,
    /// `default_encoding_name` / `force_default_encoding`.
    pub default_encoding: Option<Encoding>,
    pub force_default_encoding: bool,
    /// `line_folding_modifier`: force on (`Some(true)`), force off
    /// (`Some(false)`), or default by version (`None`).
    pub line_folding_modifier: Option<bool>,
    pub text_prefixing_modifier: Option<bool>,
    /// `max_frame_depth`: maximum nesting of save frames. Negative means
    /// unlimited.
    pub max_frame_depth: i64,
    /// Strict mode: the first recoverable error aborts the parse instead
    /// of being recovered from (§7 "User-visible behavior").
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_to_cif2: false,
            default_encoding: None,
            force_default_encoding: false,
            line_folding_modifier: None,
            text_prefixing_modifier: None,
            max_frame_depth: -1,
            strict: false,
        }
    }
}
