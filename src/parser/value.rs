//! The `value`, `list`, and `table` productions (§4.4).

use super::number;
use super::Parser;
use crate::error::CifError;
use crate::model::value::{OrderedTable, Quoting, Value};
use crate::scanner::{QuoteStyle, TokenKind};

impl<'a> Parser<'a> {
    /// `value := VALUE | QVALUE | TVALUE | OLIST list | OTABLE table`
    ///
    /// Also accepts `CLIST`/`CTABLE` appearing where a value was expected,
    /// which is not itself a production but is handled here as the single
    /// point every value-position error recovery flows through.
    pub(super) fn parse_value(&mut self) -> Value {
        self.parse_value_with(false)
    }

    /// As [`Self::parse_value`], but lets the caller say whether the token
    /// fetched right after this value (the one a table-entry loop will read
    /// as the next key, or `CTABLE`) must be lexed with `in_table=true`.
    /// Every bump that produces that token — including the ones buried
    /// inside `parse_list`/`parse_table`'s own closing-token handling —
    /// has to forward the same flag, or an unquoted key glued to its `:`
    /// (e.g. `atom_id:1`) gets misread as a single word (§4.4).
    pub(super) fn parse_value_with(&mut self, next_in_table: bool) -> Value {
        match self.current.kind.clone() {
            TokenKind::Value(text) => {
                self.bump(next_in_table);
                self.value_from_unquoted(&text)
            }
            TokenKind::QValue(text, _style) => {
                self.bump(next_in_table);
                Value::char(text, Quoting::Quoted)
            }
            TokenKind::TValue(text) => {
                self.bump(next_in_table);
                Value::char(text, Quoting::Quoted)
            }
            TokenKind::OList => self.parse_list(next_in_table),
            TokenKind::OTable => self.parse_table(next_in_table),
            other => {
                self.error(CifError::UnexpectedToken { found: format!("{other:?}"), at: None });
                self.bump(next_in_table);
                Value::Unk
            }
        }
    }

    /// Classify an unquoted token: `?`/`.` specials, an attempted number,
    /// or plain character text (§4.4 value kind determination, §3).
    fn value_from_unquoted(&mut self, text: &str) -> Value {
        if text == "?" {
            return Value::Unk;
        }
        if text == "." {
            return Value::Na;
        }
        if let Some('$') = text.chars().next() {
            self.error(CifError::FrameReferenceUnsupported(None));
            return Value::char(text, Quoting::Unquoted);
        }
        match number::try_parse(text) {
            Some(Ok(n)) => Value::Numb(n),
            Some(Err(())) => {
                self.error(CifError::InvalidNumber { text: text.to_string(), at: None });
                Value::char(text, Quoting::Unquoted)
            }
            None => Value::char(text, Quoting::Unquoted),
        }
    }

    /// `list := (value | OLIST list | OTABLE table | CLIST)*`
    fn parse_list(&mut self, next_in_table: bool) -> Value {
        self.bump(false); // consume '[': the first item is never a table key
        if !self.cif2_context() {
            self.error(CifError::DisallowedCompositeValue(None));
        }
        let mut items = Vec::new();
        loop {
            if self.aborted() {
                break;
            }
            match &self.current.kind {
                TokenKind::CList => {
                    self.bump(next_in_table);
                    break;
                }
                TokenKind::End => {
                    self.error(CifError::UnterminatedList(None));
                    break;
                }
                TokenKind::CTable => {
                    // unexpected closing brace inside a list: drop it (§4.4)
                    self.error(CifError::UnexpectedToken { found: "}".into(), at: None });
                    self.bump(false);
                }
                _ => items.push(self.parse_value_with(false)),
            }
        }
        Value::List(items)
    }

    /// `table := (table_entry)* CTABLE`, `table_entry := key KV_SEP value`
    fn parse_table(&mut self, next_in_table: bool) -> Value {
        self.bump(true); // consume '{': the first token fetched is a key
        if !self.cif2_context() {
            self.error(CifError::DisallowedCompositeValue(None));
        }
        let mut table = OrderedTable::new();
        loop {
            if self.aborted() {
                break;
            }
            match &self.current.kind {
                TokenKind::CTable => {
                    self.bump(next_in_table);
                    break;
                }
                TokenKind::End => {
                    self.error(CifError::UnterminatedTable(None));
                    break;
                }
                _ => {
                    let Some(key) = self.parse_table_key() else {
                        // missing/invalid key: consume and discard (§4.4)
                        self.bump(true);
                        continue;
                    };
                    if !matches!(self.current.kind, TokenKind::KvSep) {
                        self.error(CifError::UnexpectedToken {
                            found: format!("{:?}", self.current.kind),
                            at: None,
                        });
                        // missing separator: discard the next value and move on
                        self.bump(false);
                        let _ = self.parse_value_with(true);
                        continue;
                    }
                    self.bump(false); // consume ':', the value itself is never a key
                    let value = self.parse_value_with(true);
                    table.insert(key, value);
                }
            }
        }
        Value::Table(table)
    }

    fn parse_table_key(&mut self) -> Option<String> {
        match self.current.kind.clone() {
            TokenKind::Value(text) => {
                self.bump(true);
                Some(text)
            }
            TokenKind::QValue(text, QuoteStyle::Single | QuoteStyle::Double) => {
                self.bump(true);
                Some(text)
            }
            TokenKind::QValue(text, QuoteStyle::TripleSingle | QuoteStyle::TripleDouble) => {
                self.bump(true);
                Some(text)
            }
            _ => None,
        }
    }

    fn cif2_context(&self) -> bool {
        self.cif2_mode
    }
}
