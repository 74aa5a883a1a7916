mod active_graph;
pub mod error;
mod quad_storage;

pub use active_graph::ActiveGraph;
pub use quad_storage::QuadStorage;
