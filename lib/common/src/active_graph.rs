use rdf_cursor_model::{GraphName, GraphNameRef};
use std::fmt::Display;

/// The active graph defines which graphs can partake in the pattern matching process.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActiveGraph {
    /// Only the default graph forms the active graph.
    #[default]
    DefaultGraph,
    /// Any graph, including the default graph, form the active graph.
    AllGraphs,
    /// A set of graphs form the active graph. This allows expressing the user-intent of
    /// queries that use the `FROM` clause and of `GRAPH` patterns.
    Union(Vec<GraphName>),
}

impl ActiveGraph {
    /// Creates an active graph that consists of a single graph.
    pub fn single(graph: impl Into<GraphName>) -> Self {
        ActiveGraph::Union(vec![graph.into()])
    }

    /// Returns whether triples stored in `graph` are visible in this active graph.
    pub fn contains(&self, graph: GraphNameRef<'_>) -> bool {
        match self {
            ActiveGraph::DefaultGraph => graph.is_default_graph(),
            ActiveGraph::AllGraphs => true,
            ActiveGraph::Union(graphs) => graphs.iter().any(|g| g.as_ref() == graph),
        }
    }
}

impl Display for ActiveGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveGraph::DefaultGraph => write!(f, "Default Graph"),
            ActiveGraph::AllGraphs => write!(f, "All Graphs"),
            ActiveGraph::Union(graphs) => write!(f, "Union of {graphs:?}"),
        }
    }
}
