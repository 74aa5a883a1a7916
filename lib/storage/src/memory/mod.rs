//! An in-memory quad storage that indexes quads by each of their positions.
mod index;
mod object_id;
mod object_id_mapping;
mod storage;

pub use storage::MemQuadStorage;
