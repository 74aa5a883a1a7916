mod classify;
mod display;
mod error;
mod op;
mod optimize;
mod rewrite;
mod var_finder;
mod vars;

pub use classify::{JoinClassifier, LeftJoinClassifier};
pub use error::AlgebraError;
pub use op::{BasicPattern, Op, OpExtension, Table};
pub use optimize::{AlgebraRule, Optimizer};
pub use rewrite::AlgebraGenerator;
pub use var_finder::{VarFinder, VarUsage};
pub use vars::{
    expression_vars, is_non_distinguished, non_distinguished_variable, triple_pattern_vars, VarSet,
};
