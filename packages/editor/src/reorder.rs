//! # Reference List Mutator
//!
//! Swaps a paragraph reference with its immediate neighbor in an ordered
//! reference sequence. The swap is stable: every other element keeps its
//! relative order. Boundary positions are rejected by the access evaluator
//! before this runs; a boundary reaching the mutator anyway is a no-op.

use crate::direction::Direction;
use stanza_model::ParagraphRef;

/// Swap the reference targeting `target_id` with its neighbor in
/// `direction`. Returns whether a swap happened.
pub fn shift(refs: &mut [ParagraphRef], target_id: u64, direction: Direction) -> bool {
    let Some(delta) = refs.iter().position(|item| item.target_id == target_id) else {
        return false;
    };
    match direction {
        Direction::Up if delta > 0 => {
            refs.swap(delta - 1, delta);
            true
        }
        Direction::Down if delta + 1 < refs.len() => {
            refs.swap(delta, delta + 1);
            true
        }
        _ => false,
    }
}
