//! # cif-core
//!
//! A CIF 1.1 / CIF 2.0 parser and writer.
//!
//! This crate implements the two hardest, most invariant-rich parts of a
//! CIF toolchain: a predictive recursive-descent **parser** built on a
//! hand-written **scanner**, and a CIF 2.0 **writer** that walks the
//! in-memory model and chooses, per value, a delimiter strategy that
//! round-trips all Unicode content (§1).
//!
//! ## Pipeline
//!
//! ```text
//! bytes -> character source -> scanner -> parser -> in-memory model -> walker -> writer -> bytes
//! ```
//!
//! ## Scope
//!
//! The in-memory data model ([`model`]) is implemented only to the depth
//! the parser and writer need as a collaborator. Validating CIF content
//! against an external dictionary (DDL1/DDL2/DDLm) is explicitly out of
//! scope: this crate guarantees syntactic and structural fidelity, not
//! schema-level semantics.
//!
//! ## Example
//!
//! ```
//! use cif_core::{parse, write};
//!
//! let input = "#\\#CIF_2.0\ndata_a\n_x 1\n";
//! let cif = parse(input, &Default::default()).unwrap();
//! assert_eq!(cif.find_block("a").unwrap().get_item("_x").unwrap().as_number().unwrap().text(), "1");
//!
//! let out = write(&cif);
//! assert!(out.starts_with("#\\#CIF_2.0\n"));
//! ```

pub mod encoding;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod scanner;
pub mod walk;
pub mod writer;

pub use error::{CifError, Traverse};
pub use model::{Cif, Container, Loop, Number, OrderedTable, Packet, Quoting, Value};
pub use parser::{parse, parse_bytes, parse_with_callback, parse_with_options, ParseOptions};
pub use writer::write;
