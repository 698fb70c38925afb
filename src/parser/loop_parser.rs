//! The `loop` production (§4.4), building [`crate::model::Loop`] packets
//! with the recovery policy for duplicate header names and partial rows.

use super::Parser;
use crate::error::CifError;
use crate::model::{Loop, Value};
use crate::normalize::{normalize, validate_item_name};
use crate::scanner::TokenKind;

impl<'a> Parser<'a> {
    fn starts_value(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Value(_) | TokenKind::QValue(..) | TokenKind::TValue(_) | TokenKind::OList | TokenKind::OTable
        )
    }

    /// `loop := NAME+ (value | OLIST list | OTABLE table)+`
    pub(super) fn parse_loop(&mut self) -> Option<Loop> {
        self.bump(false); // consume LOOPKW

        let mut raw_names = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut keep = Vec::new();
        while let TokenKind::Name(name) = self.current.kind.clone() {
            self.bump(false);
            if let Err(e) = validate_item_name(&name) {
                self.error(e);
            }
            let key = normalize(&name);
            let first_occurrence = seen.insert(key);
            if !first_occurrence {
                self.error(CifError::DuplicateDataName { name: name.clone(), at: None });
            }
            keep.push(first_occurrence);
            raw_names.push(name);
        }

        if raw_names.is_empty() {
            self.error(CifError::EmptyLoopHeader(None));
            return None;
        }

        let kept_names: Vec<String> = raw_names
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(n, _)| n.clone())
            .collect();

        let width = raw_names.len();
        let mut flat_values = Vec::new();
        while self.starts_value() {
            flat_values.push(self.parse_value());
            if self.aborted() {
                break;
            }
        }

        if !flat_values.is_empty() && flat_values.len() % width != 0 {
            let got = flat_values.len() % width;
            self.error(CifError::PartialPacket { expected: width, got, at: None });
            while flat_values.len() % width != 0 {
                flat_values.push(Value::Unk);
            }
        }

        let mut cif_loop = match Loop::new(None, kept_names) {
            Ok(l) => l,
            Err(e) => {
                self.error(e);
                return None;
            }
        };

        for row in flat_values.chunks(width) {
            let packet: Vec<Value> = row
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v.clone())
                .collect();
            if let Err(e) = cif_loop.push_packet(packet) {
                self.error(e);
            }
        }

        Some(cif_loop)
    }
}
