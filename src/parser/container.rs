//! The container body production (§4.4), shared by blocks and frames:
//! `container := (FRAME_HEAD container FRAME_TERM | LOOPKW loop | NAME value)*`

use super::Parser;
use crate::error::CifError;
use crate::model::{Container, Loop};
use crate::scanner::TokenKind;

impl<'a> Parser<'a> {
    pub(super) fn parse_container_body(&mut self, target: &mut Container, depth: i64) {
        loop {
            if self.aborted() {
                return;
            }
            match self.current.kind.clone() {
                TokenKind::FrameTerm | TokenKind::BlockHead(_) | TokenKind::End => return,
                TokenKind::FrameHead(code) => self.parse_frame(target, code, depth),
                TokenKind::LoopKw => {
                    if let Some(l) = self.parse_loop() {
                        self.add_loop_checked(target, l);
                    }
                }
                TokenKind::Name(name) => {
                    self.bump(false);
                    let value = self.parse_value();
                    if let Err(e) = target.set_item(&name, value) {
                        self.error(e);
                    }
                }
                other => {
                    self.error(CifError::UnexpectedToken { found: format!("{other:?}"), at: None });
                    self.bump(false);
                }
            }
        }
    }

    fn parse_frame(&mut self, target: &mut Container, code: String, depth: i64) {
        self.bump(false);
        if self.options.max_frame_depth >= 0 && depth + 1 > self.options.max_frame_depth {
            self.error(CifError::UnexpectedToken { found: "save_".into(), at: None });
            self.skip_frame_body();
            return;
        }
        let frame = match Container::new(&code) {
            Ok(c) => c,
            Err(e) => {
                self.error(e);
                Container::new_unchecked(code)
            }
        };
        let slot = target.add_frame(frame);
        self.parse_container_body(slot, depth + 1);
        match self.current.kind.clone() {
            TokenKind::FrameTerm => self.bump(false),
            other => {
                // unterminated frame, synthetically closed (§4.4)
                self.error(CifError::UnexpectedToken { found: format!("{other:?}"), at: None });
            }
        }
    }

    /// A loop's names must be unique across the whole container, not just
    /// within the loop (§3); a collision drops the loop entirely.
    fn add_loop_checked(&mut self, target: &mut Container, l: Loop) {
        for name in l.names() {
            if target.has_item(name) {
                self.error(CifError::DuplicateDataName { name: name.clone(), at: None });
                return;
            }
        }
        target.add_loop(l);
    }

    fn skip_frame_body(&mut self) {
        let mut depth = 1usize;
        loop {
            if self.aborted() {
                return;
            }
            match self.current.kind.clone() {
                TokenKind::FrameHead(_) => {
                    depth += 1;
                    self.bump(false);
                }
                TokenKind::FrameTerm => {
                    self.bump(false);
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                TokenKind::End | TokenKind::BlockHead(_) => return,
                _ => self.bump(false),
            }
        }
    }
}
