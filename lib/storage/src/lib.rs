//! Contains storage layer implementations for [RDF Cursor](https://docs.rs/rdf-cursor/).

pub mod memory;

pub use memory::MemQuadStorage;
