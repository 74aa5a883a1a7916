use rdf_cursor_algebra::Op;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Describes how a query is evaluated.
#[derive(Debug, Clone)]
pub struct QueryExplanation {
    /// The time spent translating and optimizing the query.
    pub planning_time: Duration,
    /// The algebra tree translated from the SPARQL query.
    pub initial_op: Op,
    /// The algebra tree that is compiled into iterators.
    pub optimized_op: Op,
}

impl Display for QueryExplanation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Initial algebra:")?;
        writeln!(f, "{}", self.initial_op)?;
        writeln!(f, "Optimized algebra:")?;
        write!(f, "{}", self.optimized_op)
    }
}
