//! Compiles algebra trees into pull-based iterators of bindings and evaluates them against a
//! [QuadStorage](rdf_cursor_common::QuadStorage).
//!
//! The entry point is [compile]. Each operator of the tree is compiled by the [OpCompiler]
//! against the iterator that produces its input. Basic patterns are handed to the
//! [StageGenerator] of the [ExecutionContext].

mod compiler;
mod context;
pub mod error;
pub mod expr;
mod filter_placement;
pub mod iter;
mod options;
pub mod path;
mod stage;

pub use compiler::{compile, OpCompiler};
pub use context::{
    CancellationToken, ExecutionContext, ExtensionEvaluator, ServiceHandler,
};
pub use filter_placement::{FilterPlacement, PlacedStep, Placement};
pub use options::{QueryOptions, QueryOptionsError};
pub use stage::{match_triple_pattern, GenericStageGenerator, StageGenerator};
