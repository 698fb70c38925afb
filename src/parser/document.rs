//! The top-level production (§4.4): `cif := (BLOCK_HEAD container)* END`.

use super::Parser;
use crate::error::CifError;
use crate::model::{Cif, Container};
use crate::scanner::TokenKind;

impl<'a> Parser<'a> {
    pub(super) fn parse_document(&mut self) -> Cif {
        let mut cif = Cif::new();
        loop {
            if self.aborted() {
                break;
            }
            match self.current.kind.clone() {
                TokenKind::End => break,
                TokenKind::BlockHead(code) => {
                    self.bump(false);
                    if cif.find_block(&code).is_some() {
                        self.error(CifError::DuplicateBlockCode { code: code.clone(), at: None });
                    }
                    let block = match Container::new(&code) {
                        Ok(c) => c,
                        Err(e) => {
                            self.error(e);
                            Container::new_unchecked(code)
                        }
                    };
                    let slot = cif.add_block(block);
                    self.parse_container_body(slot, 0);
                }
                other => {
                    self.error(CifError::UnexpectedToken { found: format!("{other:?}"), at: None });
                    self.bump(false);
                }
            }
        }
        cif
    }
}
