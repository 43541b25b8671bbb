//! Specialized data structures used by the engine.

mod graph;
mod pair_key;

pub use graph::{EdgeIndex, InteractionGraph, NodeIndex};
pub use pair_key::PairKey;
