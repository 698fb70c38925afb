//! The scanner (§4.3): classifies an input stream into tokens, tracking
//! 1-based line/column and running the text-block folding/prefixing
//! protocols.
//!
//! The input is materialized as a `Vec<char>` up front rather than pulled
//! lazily code-unit-by-code-unit from [`crate::encoding::CharSource`] — a
//! deliberate simplification noted in `DESIGN.md`: this crate has no
//! streaming byte-source contract to preserve, and random-access lookahead
//! makes triple-quote and reserved-word detection much simpler to get
//! right. Line/column accounting still follows the spec exactly: each
//! `char` (so each surrogate pair, once decoded) advances the column by
//! one, and line length is measured in UTF-16 code units.

pub mod classes;
pub mod text_block;

use crate::error::{CifError, Position};
use crate::normalize::LINE_LIMIT;
use classes::{classify, CharClass};

/// One scanned token, exactly one of the categories in §4.3.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    BlockHead(String),
    FrameHead(String),
    FrameTerm,
    LoopKw,
    Name(String),
    OList,
    CList,
    OTable,
    CTable,
    /// Only produced while the parser is scanning inside a table.
    KvSep,
    Value(String),
    /// Content between matching quotes, with the delimiter used (so the
    /// writer-facing model can tell single- from double- from
    /// triple-quoted on round trips that care).
    QValue(String, QuoteStyle),
    TValue(String),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    Single,
    Double,
    TripleSingle,
    TripleDouble,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

/// Options steering text-block decoding (§4.3).
#[derive(Debug, Clone, Copy)]
pub struct ScannerOptions {
    pub cif2_mode: bool,
    /// `Some(true)`/`Some(false)` forces folding on/off; `None` defaults by
    /// version (`line_folding_modifier` in §6).
    pub force_folding: Option<bool>,
    pub force_prefixing: Option<bool>,
}

impl ScannerOptions {
    fn folding_enabled(&self) -> bool {
        self.force_folding.unwrap_or(self.cif2_mode)
    }

    fn prefixing_enabled(&self) -> bool {
        self.force_prefixing.unwrap_or(self.cif2_mode)
    }
}

pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    options: ScannerOptions,
    /// Recoverable problems found while scanning, in order. The scanner
    /// never decides to abort on its own — it has no notion of a "strict
    /// mode" — it just logs; the parser drains this after every token and
    /// applies the error-callback abort policy uniformly across scanner-
    /// and parser-originated errors.
    errors: Vec<(CifError, Position)>,
    /// Column at which the current physical line started being measured,
    /// used for the >2048-code-unit long-line check.
    line_units: usize,
    /// True exactly when the scan cursor sits at column 1 of a new line
    /// (i.e. a `;` seen right now would open/close a text block).
    at_line_start: bool,
    /// Comment spans skipped since the last [`Scanner::take_comments`]
    /// call, for callers that want the `whitespace_callback`-style
    /// comment-preservation hook from §6.
    comments: Vec<(String, Position)>,
    /// Kind of the token returned by the previous `next_token` call, used
    /// by the missing-whitespace check (§4.3); `None` before the first
    /// token.
    last_kind: Option<TokenKind>,
}

impl Scanner {
    pub fn new(input: &str, options: ScannerOptions) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            options,
            errors: Vec::new(),
            line_units: 0,
            at_line_start: true,
            comments: Vec::new(),
            last_kind: None,
        }
    }

    /// Drain comments skipped since the last call.
    pub fn take_comments(&mut self) -> Vec<(String, Position)> {
        std::mem::take(&mut self.comments)
    }

    /// Drain recoverable problems logged since the last call, in order.
    pub fn take_errors(&mut self) -> Vec<(CifError, Position)> {
        std::mem::take(&mut self.errors)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn report(&mut self, err: CifError) {
        let pos = self.position();
        let err = attach_position(err, pos);
        self.errors.push((err, pos));
    }

    /// Consume one char, updating line/column and the long-line check.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.finish_line();
        } else if c == '\r' {
            // CRLF counts as a single EOL; bare CR also ends the line.
            if self.peek() == Some('\n') {
                self.pos += 1;
            }
            self.finish_line();
        } else {
            self.column += 1;
            self.line_units += c.len_utf16();
            self.at_line_start = false;
        }
        Some(c)
    }

    fn finish_line(&mut self) {
        if self.line_units > LINE_LIMIT {
            self.report(CifError::OverlengthLine {
                length: self.line_units,
                limit: LINE_LIMIT,
                at: None,
            });
        }
        self.line += 1;
        self.column = 1;
        self.line_units = 0;
        self.at_line_start = true;
    }

    /// Skip whitespace/EOL/comments, returning whether anything was
    /// actually skipped (used by the missing-whitespace check).
    fn skip_whitespace_and_comments(&mut self) -> bool {
        let mut skipped = false;
        loop {
            match self.peek() {
                Some(c) if classify(c) == CharClass::Whitespace => {
                    self.advance();
                    skipped = true;
                }
                Some(c) if classify(c) == CharClass::Eol => {
                    self.advance();
                    skipped = true;
                }
                Some('#') => {
                    let start = self.position();
                    let mut text = String::new();
                    while !matches!(self.peek(), None | Some('\n') | Some('\r')) {
                        text.push(self.peek().unwrap());
                        self.advance();
                    }
                    self.comments.push((text, start));
                    skipped = true;
                }
                _ => break,
            }
        }
        skipped
    }

    /// Produce the next token. The scanner never stops on its own; callers
    /// that want strict-mode abort semantics drain [`Scanner::take_errors`]
    /// after each token and decide for themselves.
    pub fn next_token(&mut self, in_table: bool) -> Token {
        let had_whitespace = self.skip_whitespace_and_comments();
        let start = self.position();
        let Some(c) = self.peek() else {
            self.last_kind = Some(TokenKind::End);
            return Token { kind: TokenKind::End, pos: start };
        };

        let kind = match classify(c) {
            CharClass::Semicolon if self.at_line_start => self.scan_text_block(),
            CharClass::Quote => self.scan_quoted(),
            CharClass::OBracket => {
                self.advance();
                TokenKind::OList
            }
            CharClass::CBracket => {
                self.advance();
                TokenKind::CList
            }
            CharClass::OBrace => {
                self.advance();
                TokenKind::OTable
            }
            CharClass::CBrace => {
                self.advance();
                TokenKind::CTable
            }
            CharClass::Colon if in_table => {
                self.advance();
                TokenKind::KvSep
            }
            _ => self.scan_word_impl(in_table),
        };
        if !had_whitespace && self.needs_whitespace_before(&kind) {
            self.report(CifError::MissingWhitespace(None));
        }
        self.last_kind = Some(kind.clone());
        Token { kind, pos: start }
    }

    /// Whether the gap between `self.last_kind` and `kind` needed
    /// whitespace to separate them (§4.3: "everywhere else two adjacent
    /// tokens must be whitespace-separated").
    ///
    /// The two carved-out cases are a value fresh out of an opening
    /// `[`/`{` (e.g. `{atom_id`), and either side of `KV_SEP` (e.g.
    /// `atom_id:1`) — both are unambiguous, self-delimiting boundaries, so
    /// requiring a space there would flag ordinary, already-round-tripping
    /// list/table syntax. What remains — a closing `]`/`}` or a value/
    /// quoted/text token directly followed by another value/quoted/text
    /// token (`]1`, `'quoted'abc`, `}1`) — is genuinely ambiguous to a
    /// reader and is what this reports.
    fn needs_whitespace_before(&self, kind: &TokenKind) -> bool {
        if !matches!(kind, TokenKind::Value(_) | TokenKind::QValue(_, _) | TokenKind::TValue(_)) {
            return false;
        }
        !matches!(
            self.last_kind,
            None | Some(TokenKind::OList) | Some(TokenKind::OTable) | Some(TokenKind::KvSep)
        )
    }

    fn scan_quoted(&mut self) -> TokenKind {
        let delim = self.peek().unwrap();
        let triple = self.peek_at(1) == Some(delim) && self.peek_at(2) == Some(delim);
        if triple {
            self.advance();
            self.advance();
            self.advance();
            self.scan_triple_quoted(delim)
        } else {
            self.advance();
            self.scan_single_quoted(delim)
        }
    }

    fn scan_single_quoted(&mut self, delim: char) -> TokenKind {
        let start = self.position();
        let mut content = String::new();
        loop {
            match self.peek() {
                None => {
                    self.report(CifError::UnterminatedString(Some(start)));
                    break;
                }
                Some(c) if classify(c) == CharClass::Eol => {
                    self.report(CifError::UnterminatedString(Some(start)));
                    break;
                }
                Some(c) if c == delim => {
                    // CIF 1.x doubled-quote escaping: `''` inside a
                    // `'...'` string is a literal quote, not a terminator.
                    if self.peek_at(1) == Some(delim) && !self.options.cif2_mode {
                        content.push(delim);
                        self.advance();
                        self.advance();
                        continue;
                    }
                    // The delimiter only terminates the string when followed
                    // by whitespace/EOL/EOF; an embedded delimiter directly
                    // abutting other content is literal (matches the writer's
                    // `safe_inline_quote` safety rule, §4.3).
                    let closes = match self.peek_at(1) {
                        None => true,
                        Some(next) => matches!(classify(next), CharClass::Whitespace | CharClass::Eol),
                    };
                    if closes {
                        self.advance();
                        break;
                    }
                    content.push(delim);
                    self.advance();
                }
                Some(c) => {
                    content.push(c);
                    self.advance();
                }
            }
        }
        let style = if delim == '\'' { QuoteStyle::Single } else { QuoteStyle::Double };
        TokenKind::QValue(content, style)
    }

    fn scan_triple_quoted(&mut self, delim: char) -> TokenKind {
        let start = self.position();
        let mut content = String::new();
        loop {
            if self.peek().is_none() {
                self.report(CifError::UnterminatedString(Some(start)));
                break;
            }
            if self.peek() == Some(delim)
                && self.peek_at(1) == Some(delim)
                && self.peek_at(2) == Some(delim)
            {
                self.advance();
                self.advance();
                self.advance();
                break;
            }
            content.push(self.peek().unwrap());
            self.advance();
        }
        let style = if delim == '\'' { QuoteStyle::TripleSingle } else { QuoteStyle::TripleDouble };
        TokenKind::QValue(content, style)
    }

    fn scan_text_block(&mut self) -> TokenKind {
        let start = self.position();
        self.advance(); // consume the opening ';'
        let mut lines = vec![self.scan_to_eol()];
        loop {
            match self.peek() {
                None => {
                    self.report(CifError::UnterminatedTextBlock(Some(start)));
                    break;
                }
                Some(';') if self.at_line_start => {
                    self.advance();
                    break;
                }
                _ => {
                    lines.push(self.scan_to_eol());
                }
            }
        }
        let (content, errors) = text_block::decode(
            &lines,
            self.options.folding_enabled(),
            self.options.prefixing_enabled(),
        );
        for err in errors {
            self.report(err);
        }
        TokenKind::TValue(content)
    }

    /// Consume through (but not including) the line terminator, returning
    /// the line's content. Consumes the terminator itself.
    fn scan_to_eol(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if classify(c) == CharClass::Eol {
                break;
            }
            s.push(c);
            self.advance();
        }
        if self.peek().is_some() {
            self.advance();
        }
        s
    }

    /// Scan an unquoted word: everything up to the next whitespace, EOL,
    /// or a character with special single-char meaning ('[' ']' '{' '}',
    /// and ':' only while in a table).
    fn scan_word_impl(&mut self, in_table: bool) -> TokenKind {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            let class = classify(c);
            let stops = matches!(
                class,
                CharClass::Whitespace
                    | CharClass::Eol
                    | CharClass::OBracket
                    | CharClass::CBracket
                    | CharClass::OBrace
                    | CharClass::CBrace
            ) || (class == CharClass::Colon && in_table);
            if stops {
                break;
            }
            s.push(c);
            self.advance();
        }
        classify_word(&s)
    }
}

pub(crate) fn attach_position(err: CifError, pos: Position) -> CifError {
    use CifError::*;
    match err {
        DuplicateBlockCode { code, at: None } => DuplicateBlockCode { code, at: Some(pos) },
        DuplicateDataName { name, at: None } => DuplicateDataName { name, at: Some(pos) },
        InvalidBlockCode { code, at: None } => InvalidBlockCode { code, at: Some(pos) },
        InvalidFrameCode { code, at: None } => InvalidFrameCode { code, at: Some(pos) },
        InvalidItemName { name, at: None } => InvalidItemName { name, at: Some(pos) },
        InvalidNumber { text, at: None } => InvalidNumber { text, at: Some(pos) },
        OverlengthLine { length, limit, at: None } => {
            OverlengthLine { length, limit, at: Some(pos) }
        }
        UnmappedChar { at: None } => UnmappedChar { at: Some(pos) },
        InvalidChar { at: None } => InvalidChar { at: Some(pos) },
        MissingWhitespace(None) => MissingWhitespace(Some(pos)),
        UnexpectedToken { found, at: None } => UnexpectedToken { found, at: Some(pos) },
        UnterminatedString(None) => UnterminatedString(Some(pos)),
        UnterminatedTextBlock(None) => UnterminatedTextBlock(Some(pos)),
        UnterminatedList(None) => UnterminatedList(Some(pos)),
        UnterminatedTable(None) => UnterminatedTable(Some(pos)),
        FrameReferenceUnsupported(None) => FrameReferenceUnsupported(Some(pos)),
        StopOrGlobalDropped(None) => StopOrGlobalDropped(Some(pos)),
        EmptyLoopHeader(None) => EmptyLoopHeader(Some(pos)),
        PartialPacket { expected, got, at: None } => {
            PartialPacket { expected, got, at: Some(pos) }
        }
        DisallowedCompositeValue(None) => DisallowedCompositeValue(Some(pos)),
        other => other,
    }
}

/// Classify a raw unquoted word token: reserved words are recognized
/// case-insensitively on this text (§4.3); everything else is a `NAME`
/// (leading `_`) or a plain `VALUE`.
fn classify_word(s: &str) -> TokenKind {
    let lower = s.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("data_") {
        let original_rest = &s[5..];
        let _ = rest;
        return TokenKind::BlockHead(original_rest.to_string());
    }
    if lower == "save_" {
        return TokenKind::FrameTerm;
    }
    if let Some(_rest) = lower.strip_prefix("save_") {
        let original_rest = &s[5..];
        return TokenKind::FrameHead(original_rest.to_string());
    }
    if lower == "loop_" {
        return TokenKind::LoopKw;
    }
    if lower == "stop_" || lower == "global_" {
        // Recovered-and-dropped per §4.4; the parser sees this as a
        // dedicated kind so it can report and skip it.
        return TokenKind::Value(s.to_string());
    }
    if let Some(c) = s.chars().next() {
        if classify(c) == CharClass::Underscore {
            return TokenKind::Name(s.to_string());
        }
    }
    TokenKind::Value(s.to_string())
}
