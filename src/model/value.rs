//! The CIF value model (§3): a tagged union of `CHAR`, `NUMB`, `LIST`,
//! `TABLE`, `UNK` and `NA`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a `Value::Char` came from (or should be written as) a quoted
/// token. The flag is a hint: it is preserved through parse -> emit but
/// never changes what the value *means*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quoting {
    Quoted,
    Unquoted,
}

/// A parsed CIF number: mantissa and optional standard uncertainty, both
/// kept as signed decimal digit strings at a common decimal scale, plus the
/// exponent and the exact source text.
///
/// Keeping the digits instead of only an `f64` is what lets the writer
/// reproduce the original text byte-for-byte and what lets `su` remain
/// exact: `7.470(6)` must round-trip as `7.470(6)`, not as `7.47(6)` or a
/// reconstructed decimal with rounding error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Number {
    /// Signed mantissa digits, e.g. `"-1205"` for `-12.05`.
    mantissa: String,
    /// Number of digits after the decimal point in `mantissa`.
    scale: u32,
    /// Decimal exponent (`e`/`E` suffix); zero if absent.
    exponent: i32,
    /// Standard uncertainty digits (unsigned, same scale as `mantissa`),
    /// if the source had a parenthesized su.
    su: Option<String>,
    /// The exact text this value was parsed from (or will be written as).
    text: String,
}

impl Number {
    /// Construct directly from already-validated parts. `scale` and the
    /// digit strings must already agree on magnitude; this is used by the
    /// parser once it has finished decomposing a numeric token.
    pub fn from_parts(
        mantissa: String,
        scale: u32,
        exponent: i32,
        su: Option<String>,
        text: String,
    ) -> Self {
        Self { mantissa, scale, exponent, su, text }
    }

    /// The canonical textual representation, exactly as it should appear
    /// in a written CIF document.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    pub fn su_digits(&self) -> Option<&str> {
        self.su.as_deref()
    }

    /// Convert to an IEEE double, for callers that only want to inspect
    /// magnitude and don't care about exact decimal round-tripping.
    pub fn to_f64(&self) -> f64 {
        let unscaled: f64 = self.mantissa.parse().unwrap_or(0.0);
        unscaled * 10f64.powi(self.exponent - self.scale as i32)
    }

    /// Standard uncertainty as an `f64`, at the same scale as the value.
    pub fn su_f64(&self) -> Option<f64> {
        self.su.as_ref().map(|digits| {
            let unscaled: f64 = digits.parse().unwrap_or(0.0);
            unscaled * 10f64.powi(self.exponent - self.scale as i32)
        })
    }
}

/// A CIF value (§3 "Value").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// `CHAR`: a Unicode string plus a quoting hint.
    Char(String, Quoting),
    /// `NUMB`: a decimal number with optional standard uncertainty.
    Numb(Number),
    /// `LIST`: an ordered sequence of values. CIF 2.0 only.
    List(Vec<Value>),
    /// `TABLE`: an ordered key -> value map, CIF 2.0 only. Keys are
    /// compared and stored literally (never normalized).
    Table(OrderedTable),
    /// `UNK`: the unknown value, written `?`.
    Unk,
    /// `NA`: the not-applicable value, written `.`.
    Na,
}

impl Value {
    pub fn char(s: impl Into<String>, quoting: Quoting) -> Self {
        Value::Char(s.into(), quoting)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Value::List(_) | Value::Table(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Char(s, _) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Numb(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&OrderedTable> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }
}

/// An insertion-ordered string-keyed map, used for CIF 2.0 `TABLE` values.
///
/// A plain [`std::collections::HashMap`] cannot preserve entry order, and
/// entry order is part of the writer's round-trip contract (§8), so tables
/// carry their own ordered backing store: a [`BTreeMap`] from key to
/// insertion index alongside a `Vec` of entries.
///
/// `index` is a derived cache, not independent state, so it is serialized
/// as if the type were just `entries` and rebuilt by `From` on the way
/// back in — a plain `#[serde(skip)]` on the field would leave `index`
/// empty after deserializing, silently breaking `get`/`insert` on any
/// table that went through a serde round-trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<(String, Value)>", into = "Vec<(String, Value)>")]
pub struct OrderedTable {
    entries: Vec<(String, Value)>,
    index: BTreeMap<String, usize>,
}

impl OrderedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`. Overwriting preserves the key's original
    /// position (insertion order is about *first* insertion, matching how
    /// CIF table literals are written and re-parsed).
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = value;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for OrderedTable {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut table = OrderedTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

impl From<Vec<(String, Value)>> for OrderedTable {
    fn from(entries: Vec<(String, Value)>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<OrderedTable> for Vec<(String, Value)> {
    fn from(table: OrderedTable) -> Self {
        table.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_round_trips_text_exactly() {
        let n = Number::from_parts("7470".into(), 3, 0, Some("6".into()), "7.470(6)".into());
        assert_eq!(n.text(), "7.470(6)");
        assert!((n.to_f64() - 7.47).abs() < 1e-9);
        assert!((n.su_f64().unwrap() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn ordered_table_preserves_insertion_order() {
        let mut t = OrderedTable::new();
        t.insert("z", Value::Na);
        t.insert("a", Value::Unk);
        t.insert("z", Value::char("updated", Quoting::Quoted));
        let keys: Vec<&str> = t.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(t.get("z"), Some(&Value::char("updated", Quoting::Quoted)));
    }

    #[test]
    fn ordered_table_survives_serde_round_trip() {
        let mut t = OrderedTable::new();
        t.insert("atom_id", Value::char("C1", Quoting::Unquoted));
        t.insert("x", Value::Numb(Number::from_parts("1".into(), 0, 0, None, "1".into())));

        let json = serde_json::to_string(&t).unwrap();
        let restored: OrderedTable = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.get("atom_id"), Some(&Value::char("C1", Quoting::Unquoted)));
        assert_eq!(restored.len(), 2);

        // `insert` must still detect the existing key instead of duplicating it.
        let mut restored = restored;
        restored.insert("atom_id", Value::char("C2", Quoting::Unquoted));
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get("atom_id"), Some(&Value::char("C2", Quoting::Unquoted)));
    }
}
