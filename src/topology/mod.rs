//! Handles and topology sources shared by every storage variant.

pub mod handle;
pub mod source;

pub use handle::{EdgeId, NodeId};
pub use source::{GraphBuilder, TopologySource, validate};
