//! Blocks, frames, and the CIF root (§3 "CIF", "Container").
//!
//! A block and a frame share the same shape (code, child frames, loops), so
//! both are represented by one [`Container`] type; nesting is expressed by
//! ownership (`Container::frames: Vec<Container>`) rather than a parent
//! back-reference, which keeps the tree tree-shaped by construction instead
//! of by convention.

use crate::error::CifError;
use crate::model::loop_::Loop;
use crate::model::value::Value;
use crate::normalize::{normalize, validate_container_code, validate_item_name, NormKey};
use serde::{Deserialize, Serialize};

/// A block or a save frame: original code, its normalization key, an
/// ordered set of child frames unique by normalized code, and an ordered
/// set of loops (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    code: String,
    norm_code: NormKey,
    frames: Vec<Container>,
    loops: Vec<Loop>,
}

impl Container {
    pub fn new(code: impl Into<String>) -> Result<Self, CifError> {
        let code = code.into();
        validate_container_code(&code)?;
        let norm_code = normalize(&code);
        Ok(Self { code, norm_code, frames: Vec::new(), loops: Vec::new() })
    }

    /// Construct without validating the code. Used by the parser's
    /// `InvalidBlockCode`/`InvalidFrameCode` recovery path, which accepts
    /// the code verbatim after flagging it (§4.4).
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        let code = code.into();
        let norm_code = normalize(&code);
        Self { code, norm_code, frames: Vec::new(), loops: Vec::new() }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn norm_code(&self) -> &NormKey {
        &self.norm_code
    }

    pub fn frames(&self) -> &[Container] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut Vec<Container> {
        &mut self.frames
    }

    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    pub fn loops_mut(&mut self) -> &mut Vec<Loop> {
        &mut self.loops
    }

    pub fn find_frame(&self, code: &str) -> Option<&Container> {
        let key = normalize(code);
        self.frames.iter().find(|f| *f.norm_code() == key)
    }

    pub fn find_frame_mut(&mut self, code: &str) -> Option<&mut Container> {
        let key = normalize(code);
        self.frames.iter_mut().find(|f| *f.norm_code() == key)
    }

    /// Add a child frame, or, if its normalized code collides with an
    /// existing one, return that existing frame for reuse (§4.4 duplicate
    /// recovery: "reuse the existing container").
    pub fn add_frame(&mut self, frame: Container) -> &mut Container {
        let key = frame.norm_code.clone();
        if let Some(i) = self.frames.iter().position(|f| f.norm_code == key) {
            return &mut self.frames[i];
        }
        self.frames.push(frame);
        self.frames.last_mut().unwrap()
    }

    /// The scalar loop (category `Some("")`), if one exists.
    pub fn scalar_loop(&self) -> Option<&Loop> {
        self.loops.iter().find(|l| l.is_scalar())
    }

    pub fn scalar_loop_mut(&mut self) -> Option<&mut Loop> {
        self.loops.iter_mut().find(|l| l.is_scalar())
    }

    /// Every data name already used anywhere in this container (scalar loop
    /// and explicit loops alike), normalized. Uniqueness of a data name is
    /// judged across the *whole container*, not per-loop (§3).
    pub fn has_item(&self, name: &str) -> bool {
        let key = normalize(name);
        self.loops
            .iter()
            .any(|l| l.names().iter().any(|n| normalize(n) == key))
    }

    /// Fetch a scalar item's value by name.
    pub fn get_item(&self, name: &str) -> Option<&Value> {
        self.scalar_loop().and_then(|l| l.value(name, 0))
    }

    /// Set a scalar item, creating the scalar loop on first use. Fails with
    /// `DuplicateDataName` if the name already exists in a non-scalar loop.
    pub fn set_item(&mut self, name: &str, value: Value) -> Result<(), CifError> {
        validate_item_name(name)?;
        if let Some(existing) = self.loops.iter().position(|l| !l.is_scalar() && l.has_name(name))
        {
            let _ = existing;
            return Err(CifError::DuplicateDataName { name: name.to_string(), at: None });
        }
        match self.scalar_loop_mut() {
            Some(scalar) if scalar.has_name(name) => {
                let idx = scalar.name_index(name).unwrap();
                let mut values: Vec<Value> = scalar.packets()[0].values().to_vec();
                values[idx] = value;
                scalar.packets_mut()[0] = crate::model::loop_::Packet::new(
                    scalar.names().to_vec(),
                    values,
                );
                Ok(())
            }
            Some(_scalar) => {
                // Existing scalar loop, new name: rebuild with the name appended.
                let pos = self.loops.iter().position(|l| l.is_scalar()).unwrap();
                let old = self.loops.remove(pos);
                let mut names = old.names().to_vec();
                names.push(name.to_string());
                let mut values = old.packets()[0].values().to_vec();
                values.push(value);
                let mut rebuilt = Loop::new(Some(String::new()), names)?;
                rebuilt.push_packet(values)?;
                self.loops.insert(pos, rebuilt);
                Ok(())
            }
            None => {
                let mut scalar = Loop::new(Some(String::new()), vec![name.to_string()])?;
                scalar.push_packet(vec![value])?;
                self.loops.push(scalar);
                Ok(())
            }
        }
    }

    /// Add a (non-scalar) loop outright. The caller is responsible for
    /// checking cross-loop name-uniqueness per §3 before calling this; the
    /// parser does so as part of header construction.
    pub fn add_loop(&mut self, l: Loop) {
        self.loops.push(l);
    }

    /// Drop any loop that has become empty of names (as can happen after
    /// `Loop::remove_name`).
    pub fn prune_empty_loops(&mut self) {
        self.loops.retain(|l| !l.names().is_empty());
    }
}

/// The CIF root: an owned set of blocks keyed by normalized code (§3
/// "CIF").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cif {
    blocks: Vec<Container>,
}

impl Cif {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn blocks(&self) -> &[Container] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Container> {
        &mut self.blocks
    }

    pub fn find_block(&self, code: &str) -> Option<&Container> {
        let key = normalize(code);
        self.blocks.iter().find(|b| *b.norm_code() == key)
    }

    pub fn find_block_mut(&mut self, code: &str) -> Option<&mut Container> {
        let key = normalize(code);
        self.blocks.iter_mut().find(|b| *b.norm_code() == key)
    }

    /// Add a block, or reuse the existing one on a normalized-code
    /// collision (§4.4 duplicate-block recovery).
    pub fn add_block(&mut self, block: Container) -> &mut Container {
        let key = block.norm_code.clone();
        if let Some(i) = self.blocks.iter().position(|b| b.norm_code == key) {
            return &mut self.blocks[i];
        }
        self.blocks.push(block);
        self.blocks.last_mut().unwrap()
    }
}
