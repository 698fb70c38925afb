//! Error and traversal-control types.
//!
//! CIF parsing recovers from most syntax problems rather than aborting, so
//! [`CifError`] doubles as both a hard-failure type (returned from
//! constructors and data-model mutators) and the payload handed to the
//! parser's error callback for recoverable problems (see
//! [`crate::parser::ErrorCallback`]).
//!
//! Traversal steering (`Continue` / `SkipChildren` / ...) is deliberately a
//! separate enum, [`Traverse`], rather than additional `CifError` variants:
//! a handler returning "skip this subtree" is not failing.

use std::fmt;

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The full CIF error taxonomy (§7 of the design).
///
/// Variants are grouped, in source order, into: structural errors raised by
/// data-model mutation, syntactic errors raised while scanning/parsing,
/// structural-empty errors (a loop or header with no names), and
/// environment errors (I/O, allocation reported by the caller).
#[derive(Debug, Clone, PartialEq)]
pub enum CifError {
    // ---- structural ----
    /// A block or frame code collides with one already present.
    DuplicateBlockCode { code: String, at: Option<Position> },
    /// A data name collides with one already present in the same container.
    DuplicateDataName { name: String, at: Option<Position> },
    /// Lookup of a name that does not exist in the addressed scope.
    NoSuchItem(String),
    /// A packet update referenced a name that is not part of the loop.
    WrongLoop(String),
    /// An iterator method was called out of its valid sequence.
    Misuse(&'static str),
    /// A data name exists in more than one loop that could satisfy a query.
    AmbiguousItem(String),

    // ---- syntactic ----
    InvalidBlockCode { code: String, at: Option<Position> },
    InvalidFrameCode { code: String, at: Option<Position> },
    InvalidItemName { name: String, at: Option<Position> },
    InvalidNumber { text: String, at: Option<Position> },
    InvalidIndex(String),
    InvalidKey(String),
    /// A list/table value appeared in a CIF 1.x context.
    DisallowedCompositeValue(Option<Position>),
    OverlengthLine { length: usize, limit: usize, at: Option<Position> },
    UnmappedChar { at: Option<Position> },
    InvalidChar { at: Option<Position> },
    MissingWhitespace(Option<Position>),
    UnexpectedToken { found: String, at: Option<Position> },
    UnterminatedString(Option<Position>),
    UnterminatedTextBlock(Option<Position>),
    UnterminatedList(Option<Position>),
    UnterminatedTable(Option<Position>),
    /// `$name` frame references are not part of this grammar.
    FrameReferenceUnsupported(Option<Position>),
    StopOrGlobalDropped(Option<Position>),

    // ---- structural-empty ----
    EmptyLoopHeader(Option<Position>),
    PartialPacket { expected: usize, got: usize, at: Option<Position> },

    // ---- environment ----
    Io(String),
    Allocation(&'static str),
}

impl CifError {
    /// The source position this error was reported at, if any.
    pub fn position(&self) -> Option<Position> {
        use CifError::*;
        match self {
            DuplicateBlockCode { at, .. }
            | DuplicateDataName { at, .. }
            | InvalidBlockCode { at, .. }
            | InvalidFrameCode { at, .. }
            | InvalidItemName { at, .. }
            | InvalidNumber { at, .. }
            | OverlengthLine { at, .. }
            | UnmappedChar { at }
            | InvalidChar { at }
            | MissingWhitespace(at)
            | UnexpectedToken { at, .. }
            | UnterminatedString(at)
            | UnterminatedTextBlock(at)
            | UnterminatedList(at)
            | UnterminatedTable(at)
            | FrameReferenceUnsupported(at)
            | StopOrGlobalDropped(at)
            | EmptyLoopHeader(at)
            | PartialPacket { at, .. }
            | DisallowedCompositeValue(at) => *at,
            _ => None,
        }
    }

    /// True for errors the default (non-strict) recovery policy can survive.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CifError::Io(_) | CifError::Allocation(_))
    }
}

impl fmt::Display for CifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CifError::*;
        match self {
            DuplicateBlockCode { code, .. } => write!(f, "duplicate block or frame code '{code}'"),
            DuplicateDataName { name, .. } => write!(f, "duplicate data name '{name}'"),
            NoSuchItem(name) => write!(f, "no such item '{name}'"),
            WrongLoop(name) => write!(f, "'{name}' is not a name of this loop"),
            Misuse(msg) => write!(f, "iterator misuse: {msg}"),
            AmbiguousItem(name) => write!(f, "'{name}' is ambiguous across loops"),
            InvalidBlockCode { code, .. } => write!(f, "invalid block code '{code}'"),
            InvalidFrameCode { code, .. } => write!(f, "invalid frame code '{code}'"),
            InvalidItemName { name, .. } => write!(f, "invalid data name '{name}'"),
            InvalidNumber { text, .. } => write!(f, "invalid number '{text}'"),
            InvalidIndex(msg) => write!(f, "invalid index: {msg}"),
            InvalidKey(msg) => write!(f, "invalid table key: {msg}"),
            DisallowedCompositeValue(_) => {
                write!(f, "list/table values are not allowed in a CIF 1.x context")
            }
            OverlengthLine { length, limit, .. } => {
                write!(f, "line of {length} code units exceeds the {limit} limit")
            }
            UnmappedChar { .. } => write!(f, "byte sequence has no mapping in the source encoding"),
            InvalidChar { .. } => write!(f, "disallowed or invalid character"),
            MissingWhitespace(_) => write!(f, "missing whitespace between tokens"),
            UnexpectedToken { found, .. } => write!(f, "unexpected token '{found}'"),
            UnterminatedString(_) => write!(f, "unterminated quoted string"),
            UnterminatedTextBlock(_) => write!(f, "unterminated text block"),
            UnterminatedList(_) => write!(f, "unterminated list"),
            UnterminatedTable(_) => write!(f, "unterminated table"),
            FrameReferenceUnsupported(_) => write!(f, "frame references ('$name') are not supported"),
            StopOrGlobalDropped(_) => write!(f, "'stop_' or 'global_' encountered and dropped"),
            EmptyLoopHeader(_) => write!(f, "loop has no data names"),
            PartialPacket { expected, got, .. } => {
                write!(f, "loop ended mid-packet: expected {expected} values, got {got}")
            }
            Io(msg) => write!(f, "I/O error: {msg}"),
            Allocation(msg) => write!(f, "allocation failure: {msg}"),
        }
    }
}

impl std::error::Error for CifError {}

impl From<std::io::Error> for CifError {
    fn from(err: std::io::Error) -> Self {
        CifError::Io(err.to_string())
    }
}

/// Steering code returned by a [`crate::walk::Handler`] callback.
///
/// Not an error channel: `Continue`/`SkipChildren`/`SkipSiblings` are normal
/// outcomes of a walk. `End` and positive codes stop the walk early, the
/// latter propagating an application-defined result to the walker's caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traverse {
    Continue,
    SkipChildren,
    SkipSiblings,
    End,
    Code(i32),
}

impl Traverse {
    pub fn is_stop(&self) -> bool {
        matches!(self, Traverse::End | Traverse::Code(_))
    }
}
