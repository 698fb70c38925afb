//! The traversal walker (§4.6): a depth-first visitor over a parsed
//! [`Cif`], with caller-steerable skip/stop control instead of a fixed
//! visit order a caller has to filter after the fact.
//!
//! Visit order: `cif_start -> (block_start -> frames, recursively ->
//! loops/packets/items -> block_end)* -> cif_end`.

use crate::error::Traverse;
use crate::model::{Cif, Container, Loop, Packet};

/// Callbacks invoked at each point in the traversal. Every method has a
/// default that continues, so a handler only overrides what it cares about.
pub trait Handler {
    fn cif_start(&mut self, _cif: &Cif) -> Traverse {
        Traverse::Continue
    }
    fn cif_end(&mut self, _cif: &Cif) -> Traverse {
        Traverse::Continue
    }
    /// `depth` is 0 for top-level blocks, increasing with frame nesting.
    fn container_start(&mut self, _container: &Container, _depth: usize) -> Traverse {
        Traverse::Continue
    }
    fn container_end(&mut self, _container: &Container, _depth: usize) -> Traverse {
        Traverse::Continue
    }
    fn loop_start(&mut self, _l: &Loop) -> Traverse {
        Traverse::Continue
    }
    fn loop_end(&mut self, _l: &Loop) -> Traverse {
        Traverse::Continue
    }
    fn packet(&mut self, _p: &Packet, _row: usize) -> Traverse {
        Traverse::Continue
    }
}

/// Walk `cif` with `handler`, returning the `Traverse::Code`/`Traverse::End`
/// that stopped the walk early, or `Traverse::Continue` if it ran to
/// completion.
pub fn walk(cif: &Cif, handler: &mut dyn Handler) -> Traverse {
    let t = handler.cif_start(cif);
    if t.is_stop() {
        return t;
    }
    for block in cif.blocks() {
        match walk_container(block, 0, handler) {
            Traverse::SkipSiblings => break,
            t if t.is_stop() => return t,
            _ => {}
        }
    }
    let t = handler.cif_end(cif);
    if t.is_stop() {
        return t;
    }
    Traverse::Continue
}

fn walk_container(container: &Container, depth: usize, handler: &mut dyn Handler) -> Traverse {
    let t = handler.container_start(container, depth);
    if t.is_stop() {
        return t;
    }
    if t != Traverse::SkipChildren {
        for frame in container.frames() {
            match walk_container(frame, depth + 1, handler) {
                Traverse::SkipSiblings => break,
                t if t.is_stop() => return t,
                _ => {}
            }
        }
        for l in container.loops() {
            match walk_loop(l, handler) {
                Traverse::SkipSiblings => break,
                t if t.is_stop() => return t,
                _ => {}
            }
        }
    }
    handler.container_end(container, depth)
}

fn walk_loop(l: &Loop, handler: &mut dyn Handler) -> Traverse {
    let t = handler.loop_start(l);
    if t.is_stop() {
        return t;
    }
    if t != Traverse::SkipChildren {
        for (row, p) in l.packets().iter().enumerate() {
            match handler.packet(p, row) {
                Traverse::SkipSiblings => break,
                t if t.is_stop() => return t,
                _ => {}
            }
        }
    }
    handler.loop_end(l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::{Quoting, Value};

    struct Counter {
        containers: usize,
        packets: usize,
    }

    impl Handler for Counter {
        fn container_start(&mut self, _c: &Container, _depth: usize) -> Traverse {
            self.containers += 1;
            Traverse::Continue
        }
        fn packet(&mut self, _p: &Packet, _row: usize) -> Traverse {
            self.packets += 1;
            Traverse::Continue
        }
    }

    fn sample() -> Cif {
        let mut cif = Cif::new();
        let block = cif.add_block(Container::new("a").unwrap());
        block.set_item("_x", Value::char("1", Quoting::Unquoted)).unwrap();
        block.add_frame(Container::new("f").unwrap());
        cif
    }

    #[test]
    fn visits_every_container_and_packet() {
        let cif = sample();
        let mut counter = Counter { containers: 0, packets: 0 };
        walk(&cif, &mut counter);
        assert_eq!(counter.containers, 2); // block + frame
        assert_eq!(counter.packets, 1); // the scalar loop's single packet
    }

    struct StopAtFirst;
    impl Handler for StopAtFirst {
        fn container_start(&mut self, _c: &Container, _depth: usize) -> Traverse {
            Traverse::End
        }
    }

    #[test]
    fn end_stops_the_whole_walk() {
        let cif = sample();
        let result = walk(&cif, &mut StopAtFirst);
        assert_eq!(result, Traverse::End);
    }

    struct SkipFramesAndCount {
        containers: usize,
        packets: usize,
    }
    impl Handler for SkipFramesAndCount {
        fn container_start(&mut self, c: &Container, depth: usize) -> Traverse {
            self.containers += 1;
            if depth == 0 && !c.frames().is_empty() {
                Traverse::SkipChildren
            } else {
                Traverse::Continue
            }
        }
        fn packet(&mut self, _p: &Packet, _row: usize) -> Traverse {
            self.packets += 1;
            Traverse::Continue
        }
    }

    #[test]
    fn skip_children_skips_frames_and_loops_but_not_siblings() {
        let mut cif = sample();
        cif.add_block(Container::new("b").unwrap());
        let mut handler = SkipFramesAndCount { containers: 0, packets: 0 };
        walk(&cif, &mut handler);
        // block "a" (children skipped, so its frame "f" and loop are not
        // visited) + block "b"
        assert_eq!(handler.containers, 2);
        assert_eq!(handler.packets, 0);
    }
}
