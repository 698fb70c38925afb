//! The predictive recursive-descent parser (§4.4): one token of lookahead,
//! built directly on [`crate::scanner::Scanner`].
//!
//! Errors are recoverable by default: a problem is logged and the parser
//! keeps going per the recovery policy documented on each production. The
//! `strict` option, or a caller-supplied [`ErrorCallback`] returning
//! `false`, turns the next recoverable error into a hard stop instead.

pub mod container;
pub mod document;
pub mod loop_parser;
pub mod number;
pub mod options;
pub mod value;

pub use options::ParseOptions;

use crate::encoding::{CharSource, EncodingOptions, EOF};
use crate::error::{CifError, Position};
use crate::model::Cif;
use crate::scanner::{Scanner, ScannerOptions, Token};

const CIF2_MAGIC: &str = "#\\#CIF_2.0";

/// Called for every recoverable problem found while parsing. Returning
/// `false` aborts the parse at that point (§7).
pub type ErrorCallback<'a> = dyn FnMut(&CifError, Position) -> bool + 'a;

pub struct Parser<'a> {
    scanner: Scanner,
    current: Token,
    cif2_mode: bool,
    options: ParseOptions,
    callback: Option<&'a mut ErrorCallback<'a>>,
    errors: Vec<CifError>,
    aborted: bool,
}

impl<'a> Parser<'a> {
    pub fn new(input: &str, options: ParseOptions) -> Self {
        Self::new_inner(input, options, None)
    }

    pub fn with_callback(
        input: &str,
        options: ParseOptions,
        callback: &'a mut ErrorCallback<'a>,
    ) -> Self {
        Self::new_inner(input, options, Some(callback))
    }

    fn new_inner(
        input: &str,
        options: ParseOptions,
        callback: Option<&'a mut ErrorCallback<'a>>,
    ) -> Self {
        let cif2_mode = detect_cif2(input, &options);
        let scanner_options = ScannerOptions {
            cif2_mode,
            force_folding: options.line_folding_modifier,
            force_prefixing: options.text_prefixing_modifier,
        };
        let scanner = Scanner::new(strip_magic(input, cif2_mode), scanner_options);
        let mut parser = Self {
            scanner,
            current: Token { kind: crate::scanner::TokenKind::End, pos: Position::default() },
            cif2_mode,
            options,
            callback,
            errors: Vec::new(),
            aborted: false,
        };
        parser.current = parser.scanner.next_token(false);
        parser.drain_scanner_errors();
        parser
    }

    fn bump(&mut self, in_table: bool) {
        self.current = self.scanner.next_token(in_table);
        self.drain_scanner_errors();
    }

    fn drain_scanner_errors(&mut self) {
        let pending = self.scanner.take_errors();
        for (err, _pos) in pending {
            self.error(err);
        }
    }

    /// Log a recoverable problem, filling in the current position if the
    /// error doesn't already carry one, and apply the abort policy.
    fn error(&mut self, err: CifError) {
        let err = if err.position().is_none() {
            crate::scanner::attach_position(err, self.current.pos)
        } else {
            err
        };
        let keep_going = match &mut self.callback {
            Some(cb) => cb(&err, self.current.pos),
            None => !self.options.strict,
        };
        self.errors.push(err);
        if !keep_going {
            self.aborted = true;
        }
    }

    fn aborted(&self) -> bool {
        self.aborted
    }
}

fn detect_cif2(input: &str, options: &ParseOptions) -> bool {
    let body = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    body.starts_with(CIF2_MAGIC) || options.default_to_cif2
}

fn strip_magic(input: &str, cif2_mode: bool) -> &str {
    let body = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    if cif2_mode && body.starts_with(CIF2_MAGIC) {
        match body.find('\n') {
            Some(i) => &body[i + 1..],
            None => "",
        }
    } else {
        body
    }
}

/// Everything a parse produces: the model built so far (complete even when
/// errors were recovered from), the errors logged along the way in order,
/// and whether the parse was aborted before reaching the end of input.
#[derive(Debug)]
pub struct ParseOutcome {
    pub cif: Cif,
    pub errors: Vec<CifError>,
    pub aborted: bool,
}

/// Parse with a custom error callback instead of the `strict` option.
pub fn parse_with_callback(
    input: &str,
    options: ParseOptions,
    callback: &mut ErrorCallback<'_>,
) -> ParseOutcome {
    let mut parser = Parser::with_callback(input, options, callback);
    let cif = parser.parse_document();
    ParseOutcome { cif, errors: parser.errors, aborted: parser.aborted }
}

/// Parse and report every recoverable problem found, rather than stopping
/// at the first one (unless `options.strict` is set).
pub fn parse_with_options(input: &str, options: ParseOptions) -> ParseOutcome {
    let mut parser = Parser::new(input, options);
    let cif = parser.parse_document();
    ParseOutcome { cif, errors: parser.errors, aborted: parser.aborted }
}

/// Parse `input`, failing on the first error only if the parse was aborted
/// (strict mode, or a callback that declined to continue). Otherwise
/// recoverable problems are silently absorbed into the best-effort model;
/// use [`parse_with_options`] to inspect them.
pub fn parse(input: &str, options: &ParseOptions) -> Result<Cif, CifError> {
    let outcome = parse_with_options(input, options.clone());
    if outcome.aborted {
        if let Some(err) = outcome.errors.into_iter().next_back() {
            return Err(err);
        }
    }
    Ok(outcome.cif)
}

/// Decode `bytes` per the encoding-detection rules (§4.2) before parsing.
pub fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> Result<Cif, CifError> {
    let enc_opts = EncodingOptions {
        force_default_encoding: options.force_default_encoding,
        default_encoding: options.default_encoding,
        default_to_cif2: options.default_to_cif2,
    };
    let cif2_substitution = bytes.starts_with(CIF2_MAGIC.as_bytes()) || options.default_to_cif2;
    let mut source = CharSource::decode(bytes, &enc_opts, cif2_substitution, |_problem| {
        crate::encoding::OnError::Continue
    });
    let mut units = Vec::new();
    loop {
        let u = source.next();
        if u == EOF {
            break;
        }
        units.push(u as u16);
    }
    let text = String::from_utf16_lossy(&units);
    parse(&text, options)
}
