//! The in-memory CIF data model: containers, loops, packets, and values.
//!
//! Specified only to the extent the parser and writer need it as a
//! collaborator (§1) — this is not a general query layer over CIF.

pub mod container;
pub mod loop_;
pub mod value;

pub use container::{Cif, Container};
pub use loop_::{Loop, Packet, PacketIterator};
pub use value::{Number, OrderedTable, Quoting, Value};
