//! The CIF 2.0 writer (§4.7): walks a parsed model and serializes it back
//! to text, choosing a per-value delimiter that round-trips byte-for-byte.
//!
//! Unlike the scanner/parser pair, the writer doesn't need a lookahead
//! machine — it is a straightforward recursive descent over the owned
//! model, using [`crate::walk`]'s visit order so block/frame/loop/packet
//! nesting is emitted in the same shape it would be re-parsed in.

pub mod text_block;
pub mod value;

use crate::error::Traverse;
use crate::model::{Cif, Container, Loop};
use crate::walk::{walk, Handler};
use value::write_value;

const MAGIC: &str = "#\\#CIF_2.0";

/// Serialize `cif` as a CIF 2.0 document.
pub fn write(cif: &Cif) -> String {
    let mut w = Writer::new();
    walk(cif, &mut w);
    w.out
}

struct Writer {
    out: String,
    depth: usize,
}

impl Writer {
    fn new() -> Self {
        Self { out: format!("{MAGIC}\n"), depth: 0 }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }
}

impl Handler for Writer {
    fn container_start(&mut self, container: &Container, depth: usize) -> Traverse {
        self.depth = depth;
        self.indent();
        if depth == 0 {
            self.out.push_str("data_");
        } else {
            self.out.push_str("save_");
        }
        self.out.push_str(container.code());
        self.out.push('\n');
        self.depth = depth + 1;
        Traverse::Continue
    }

    fn container_end(&mut self, _container: &Container, depth: usize) -> Traverse {
        if depth > 0 {
            self.depth = depth;
            self.indent();
            self.out.push_str("save_\n");
        }
        self.depth = depth;
        Traverse::Continue
    }

    fn loop_start(&mut self, l: &Loop) -> Traverse {
        if l.is_scalar() {
            for name in l.names() {
                self.indent();
                self.out.push_str(name);
                let v = l.packets()[0].get(name).unwrap();
                // A text block must open with `;` at column 1 on a fresh
                // line (§4.3) — a plain space would land it mid-line.
                self.out.push(if value::needs_text_block(v) { '\n' } else { ' ' });
                write_value(&mut self.out, v);
                self.out.push('\n');
            }
            return Traverse::SkipChildren;
        }
        self.indent();
        self.out.push_str("loop_\n");
        for name in l.names() {
            self.indent();
            self.out.push_str(name);
            self.out.push('\n');
        }
        Traverse::Continue
    }

    fn packet(&mut self, p: &crate::model::Packet, _row: usize) -> Traverse {
        let values = p.values();
        for (i, v) in values.iter().enumerate() {
            let needs_block = value::needs_text_block(v);
            if i == 0 {
                // A text block's opening `;` must sit at column 1, so skip
                // the row's indentation when the first value needs one.
                if !needs_block {
                    self.indent();
                }
            } else if needs_block {
                self.out.push('\n');
            } else {
                self.out.push(' ');
            }
            write_value(&mut self.out, v);
            if needs_block && i + 1 < values.len() {
                self.out.push('\n');
            }
        }
        self.out.push('\n');
        Traverse::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::{Quoting, Value};

    #[test]
    fn minimal_document_round_trips() {
        let mut cif = Cif::new();
        cif.add_block(Container::new("a").unwrap())
            .set_item("_x", Value::char("hello", Quoting::Unquoted))
            .unwrap();
        let out = write(&cif);
        assert!(out.starts_with("#\\#CIF_2.0\n"));
        assert!(out.contains("data_a"));
        assert!(out.contains("_x"));

        let parsed = crate::parser::parse(&out, &Default::default()).unwrap();
        assert_eq!(
            parsed.find_block("a").unwrap().get_item("_x"),
            Some(&Value::char("hello", Quoting::Unquoted))
        );
    }

    #[test]
    fn loop_round_trips() {
        let mut cif = Cif::new();
        let block = cif.add_block(Container::new("a").unwrap());
        let mut l = Loop::new(None, vec!["_a".into(), "_b".into()]).unwrap();
        l.push_packet(vec![Value::char("x", Quoting::Unquoted), Value::Unk]).unwrap();
        l.push_packet(vec![Value::char("y", Quoting::Unquoted), Value::Na]).unwrap();
        block.add_loop(l);

        let out = write(&cif);
        let parsed = crate::parser::parse(&out, &Default::default()).unwrap();
        let block = parsed.find_block("a").unwrap();
        let found = block.loops().iter().find(|l| !l.is_scalar()).unwrap();
        assert_eq!(found.value("_a", 0), Some(&Value::char("x", Quoting::Unquoted)));
        assert_eq!(found.value("_b", 1), Some(&Value::Na));
    }

    #[test]
    fn frame_round_trips() {
        let mut cif = Cif::new();
        let block = cif.add_block(Container::new("a").unwrap());
        let frame = block.add_frame(Container::new("f").unwrap());
        frame.set_item("_y", Value::char("hi", Quoting::Unquoted)).unwrap();

        let out = write(&cif);
        let parsed = crate::parser::parse(&out, &Default::default()).unwrap();
        let frame = parsed.find_block("a").unwrap().find_frame("f").unwrap();
        assert_eq!(frame.get_item("_y"), Some(&Value::char("hi", Quoting::Unquoted)));
    }
}
