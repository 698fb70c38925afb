//! Loops and packets (§3 "Loop", "Packet"; §4.5 packet iterator).

use crate::error::CifError;
use crate::model::value::Value;
use crate::normalize::{normalize, NormKey};
use serde::{Deserialize, Serialize};

/// One row of a loop: an ordered map from original data name to value.
///
/// Order matches the owning loop's name order. A detached packet (built
/// before being attached to a loop, or returned by the iterator) carries
/// its own name list so it remains self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    names: Vec<String>,
    values: Vec<Value>,
}

impl Packet {
    pub fn new(names: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let key = normalize(name);
        self.names
            .iter()
            .position(|n| normalize(n) == key)
            .map(|i| &self.values[i])
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), CifError> {
        let key = normalize(name);
        match self.names.iter().position(|n| normalize(n) == key) {
            Some(i) => {
                self.values[i] = value;
                Ok(())
            }
            None => Err(CifError::WrongLoop(name.to_string())),
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// A loop: an ordered, non-empty list of data names unique (by
/// normalization) within the whole container, plus an ordered list of
/// packets. Every packet has a value for every name (§3 invariant).
///
/// The distinguished scalar loop uses `category == Some(String::new())`;
/// `category: None` would be indistinguishable from "no category was ever
/// set", so the scalar loop's empty string is stored, not defaulted away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    category: Option<String>,
    names: Vec<String>,
    norm_names: Vec<NormKey>,
    packets: Vec<Packet>,
}

impl Loop {
    /// Create a loop. `names` must be non-empty; normalization collisions
    /// among names are the caller's (parser's) responsibility to have
    /// already resolved per the duplicate-name recovery policy.
    pub fn new(category: Option<String>, names: Vec<String>) -> Result<Self, CifError> {
        if names.is_empty() {
            return Err(CifError::EmptyLoopHeader(None));
        }
        let norm_names = names.iter().map(|n| normalize(n)).collect();
        Ok(Self { category, names, norm_names, packets: Vec::new() })
    }

    pub fn is_scalar(&self) -> bool {
        matches!(&self.category, Some(c) if c.is_empty())
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn packets_mut(&mut self) -> &mut Vec<Packet> {
        &mut self.packets
    }

    pub fn has_name(&self, name: &str) -> bool {
        let key = normalize(name);
        self.norm_names.iter().any(|n| *n == key)
    }

    /// Index of `name` among this loop's names, by normalized comparison.
    pub fn name_index(&self, name: &str) -> Option<usize> {
        let key = normalize(name);
        self.norm_names.iter().position(|n| *n == key)
    }

    /// Push a fully-populated packet. The caller (parser / loop builder)
    /// is responsible for padding partial packets with `UNK` first (§4.4
    /// recovery policy).
    pub fn push_packet(&mut self, values: Vec<Value>) -> Result<(), CifError> {
        if values.len() != self.names.len() {
            return Err(CifError::PartialPacket {
                expected: self.names.len(),
                got: values.len(),
                at: None,
            });
        }
        self.packets.push(Packet::new(self.names.clone(), values));
        Ok(())
    }

    /// Get a single value by (data name, row index).
    pub fn value(&self, name: &str, row: usize) -> Option<&Value> {
        let i = self.name_index(name)?;
        self.packets.get(row).map(|p| &p.values[i])
    }

    /// Drop the last remaining name: per §3, this removes the loop itself.
    /// Returns `true` if the loop is now empty and should be discarded by
    /// its owning container.
    pub fn remove_name(&mut self, name: &str) -> Result<bool, CifError> {
        let i = self.name_index(name).ok_or_else(|| CifError::NoSuchItem(name.to_string()))?;
        self.names.remove(i);
        self.norm_names.remove(i);
        for p in &mut self.packets {
            p.names.remove(i);
            p.values.remove(i);
        }
        Ok(self.names.is_empty())
    }

    /// A forward-only iterator over this loop's packets, with staged
    /// commit semantics (§4.5).
    pub fn iter_packets(&mut self) -> PacketIterator<'_> {
        PacketIterator { loop_: self, cursor: None, just_removed: false }
    }
}

/// The packet iterator described in §4.5.
///
/// At most one iterator may be active per CIF at a time (§4.5, §5); this
/// type does not itself enforce that cross-loop constraint (it borrows
/// exactly one [`Loop`] and the borrow checker handles the rest), but
/// mutating the [`Loop`] through any other path while an iterator is alive
/// is prevented by the same borrow.
pub struct PacketIterator<'a> {
    loop_: &'a mut Loop,
    /// Index of the last packet returned by `next`, or the index `next`
    /// should resume at after a `remove` (see `just_removed`), or `None`
    /// before the first call.
    cursor: Option<usize>,
    /// Set by `remove`: the packet that slid into the removed slot hasn't
    /// been visited yet, so the next `next()` call must return `cursor`
    /// itself instead of `cursor + 1`.
    just_removed: bool,
}

impl<'a> PacketIterator<'a> {
    /// Advance and return the next packet, or `None` once exhausted.
    pub fn next(&mut self) -> Option<&Packet> {
        let next_index = if self.just_removed {
            self.just_removed = false;
            self.cursor.unwrap_or(0)
        } else {
            match self.cursor {
                None => 0,
                Some(i) => i + 1,
            }
        };
        if next_index >= self.loop_.packets.len() {
            self.cursor = Some(self.loop_.packets.len());
            return None;
        }
        self.cursor = Some(next_index);
        Some(&self.loop_.packets[next_index])
    }

    fn current_index(&self) -> Result<usize, CifError> {
        if self.just_removed {
            return Err(CifError::Misuse("update/remove called without an active packet"));
        }
        match self.cursor {
            Some(i) if i < self.loop_.packets.len() => Ok(i),
            _ => Err(CifError::Misuse("update/remove called without an active packet")),
        }
    }

    /// Replace the last-returned packet. Fails with `WrongLoop` if any
    /// supplied name is not one of this loop's names.
    pub fn update(&mut self, values: Vec<(String, Value)>) -> Result<(), CifError> {
        let idx = self.current_index()?;
        let mut new_values = self.loop_.packets[idx].values.clone();
        for (name, value) in values {
            let i = self
                .loop_
                .name_index(&name)
                .ok_or_else(|| CifError::WrongLoop(name.clone()))?;
            new_values[i] = value;
        }
        self.loop_.packets[idx] = Packet::new(self.loop_.names.clone(), new_values);
        Ok(())
    }

    /// Remove the last-returned packet. After this, `update`/`remove` fail
    /// with `Misuse` until `next` is called again; that next `next()` call
    /// resumes at `idx`, i.e. the packet that slid into the removed slot
    /// (§4.5), not at the packet after it.
    pub fn remove(&mut self) -> Result<(), CifError> {
        let idx = self.current_index()?;
        self.loop_.packets.remove(idx);
        self.cursor = Some(idx);
        self.just_removed = true;
        Ok(())
    }

    /// Commit: a no-op here since mutation is applied eagerly, kept so
    /// callers following the close/abort protocol compile unchanged against
    /// a backing store that batches writes.
    pub fn close(self) {}

    /// Best-effort revert: since this implementation mutates in place,
    /// abort cannot undo already-applied `update`/`remove` calls. Kept for
    /// interface parity with the staged-commit contract in §4.5.
    pub fn abort(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::{Quoting, Value};

    fn sample_loop() -> Loop {
        let mut l = Loop::new(None, vec!["_a".into(), "_b".into()]).unwrap();
        l.push_packet(vec![Value::char("1", Quoting::Unquoted), Value::char("2", Quoting::Unquoted)])
            .unwrap();
        l.push_packet(vec![Value::char("3", Quoting::Unquoted), Value::char("4", Quoting::Unquoted)])
            .unwrap();
        l
    }

    #[test]
    fn empty_names_rejected() {
        assert!(Loop::new(None, vec![]).is_err());
    }

    #[test]
    fn iterator_walks_in_order() {
        let mut l = sample_loop();
        let mut it = l.iter_packets();
        assert_eq!(it.next().unwrap().get("_a"), Some(&Value::char("1", Quoting::Unquoted)));
        assert_eq!(it.next().unwrap().get("_a"), Some(&Value::char("3", Quoting::Unquoted)));
        assert!(it.next().is_none());
    }

    #[test]
    fn update_before_next_is_misuse() {
        let mut l = sample_loop();
        let mut it = l.iter_packets();
        assert!(matches!(it.update(vec![]), Err(CifError::Misuse(_))));
    }

    #[test]
    fn update_rejects_unknown_name() {
        let mut l = sample_loop();
        let mut it = l.iter_packets();
        it.next();
        let err = it.update(vec![("_z".into(), Value::Unk)]).unwrap_err();
        assert!(matches!(err, CifError::WrongLoop(_)));
    }

    #[test]
    fn remove_then_update_is_misuse() {
        let mut l = sample_loop();
        let mut it = l.iter_packets();
        it.next();
        it.remove().unwrap();
        assert!(matches!(it.update(vec![]), Err(CifError::Misuse(_))));
        assert_eq!(l.packets().len(), 1);
    }

    #[test]
    fn remove_resumes_at_the_slid_in_packet() {
        let mut l = Loop::new(None, vec!["_a".into()]).unwrap();
        for v in ["1", "2", "3"] {
            l.push_packet(vec![Value::char(v, Quoting::Unquoted)]).unwrap();
        }
        let mut it = l.iter_packets();
        // Remove the first packet ("1"); "2" slides into its slot.
        assert_eq!(it.next().unwrap().get("_a"), Some(&Value::char("1", Quoting::Unquoted)));
        it.remove().unwrap();
        // A single-pass filter must see every remaining packet exactly once.
        assert_eq!(it.next().unwrap().get("_a"), Some(&Value::char("2", Quoting::Unquoted)));
        assert_eq!(it.next().unwrap().get("_a"), Some(&Value::char("3", Quoting::Unquoted)));
        assert!(it.next().is_none());
    }

    #[test]
    fn remove_last_packet_then_next_ends_iteration() {
        let mut l = sample_loop();
        let mut it = l.iter_packets();
        it.next();
        it.next();
        it.remove().unwrap();
        assert!(it.next().is_none());
    }

    #[test]
    fn remove_last_name_drops_loop() {
        let mut l = sample_loop();
        assert!(!l.remove_name("_a").unwrap());
        assert!(l.remove_name("_b").unwrap());
    }
}
