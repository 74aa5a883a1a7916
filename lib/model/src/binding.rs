use crate::BindingConflictError;
use oxrdf::{Term, Variable};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An immutable mapping from variables to RDF terms.
///
/// A binding may have a parent. Lookups that do not find a variable in the binding itself are
/// delegated to the parent. Extending a binding therefore never copies the existing mappings,
/// the new binding simply references the old one.
///
/// A variable is mapped to at most one term in the whole chain. [BindingBuilder] enforces this
/// invariant when a binding is built.
#[derive(Clone)]
pub struct Binding {
    inner: Arc<BindingNode>,
}

struct BindingNode {
    parent: Option<Binding>,
    entries: Vec<(Variable, Term)>,
}

impl Binding {
    /// Creates an empty binding without parent.
    pub fn root() -> Self {
        Self {
            inner: Arc::new(BindingNode {
                parent: None,
                entries: Vec::new(),
            }),
        }
    }

    /// Creates a builder for a binding without parent.
    pub fn builder() -> BindingBuilder {
        BindingBuilder {
            parent: None,
            entries: Vec::new(),
        }
    }

    /// Creates a builder for a binding that uses `self` as parent.
    pub fn child(&self) -> BindingBuilder {
        BindingBuilder {
            parent: Some(self.clone()),
            entries: Vec::new(),
        }
    }

    /// Creates a child binding that additionally maps `variable` to `term`.
    pub fn with(&self, variable: Variable, term: Term) -> Result<Binding, BindingConflictError> {
        let mut builder = self.child();
        builder.add(variable, term)?;
        Ok(builder.build())
    }

    /// Returns the parent of this binding.
    pub fn parent(&self) -> Option<&Binding> {
        self.inner.parent.as_ref()
    }

    /// Returns the term bound to `variable`, walking up the parent chain.
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        let mut current = self;
        loop {
            if let Some((_, term)) = current.inner.entries.iter().find(|(v, _)| v == variable) {
                return Some(term);
            }
            current = current.inner.parent.as_ref()?;
        }
    }

    /// Returns whether `variable` is bound in this binding or one of its parents.
    pub fn contains(&self, variable: &Variable) -> bool {
        self.get(variable).is_some()
    }

    /// Returns the number of bound variables, including the ones of the parents.
    pub fn len(&self) -> usize {
        self.nodes().map(|node| node.entries.len()).sum()
    }

    /// Returns whether no variable is bound.
    pub fn is_empty(&self) -> bool {
        self.nodes().all(|node| node.entries.is_empty())
    }

    /// Iterates over all mappings. The mappings of the binding itself come first, then the ones
    /// of its parents.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.nodes()
            .flat_map(|node| node.entries.iter().map(|(v, t)| (v, t)))
    }

    /// Iterates over all bound variables.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.iter().map(|(v, _)| v)
    }

    /// Two bindings are compatible if they agree on every variable that both bind.
    pub fn is_compatible(&self, other: &Binding) -> bool {
        self.iter().all(|(variable, term)| match other.get(variable) {
            None => true,
            Some(other_term) => other_term == term,
        })
    }

    /// Returns whether the two bindings share no variable.
    pub fn is_disjoint(&self, other: &Binding) -> bool {
        self.variables().all(|variable| !other.contains(variable))
    }

    /// Merges two compatible bindings. The result uses `self` as parent and adds the mappings of
    /// `other` that `self` does not already contain.
    ///
    /// Returns [None] if the bindings are not compatible.
    pub fn merge(&self, other: &Binding) -> Option<Binding> {
        let mut entries = Vec::new();
        for (variable, term) in other.iter() {
            match self.get(variable) {
                Some(existing) if existing != term => return None,
                Some(_) => {}
                None => entries.push((variable.clone(), term.clone())),
            }
        }

        if entries.is_empty() {
            return Some(self.clone());
        }

        Some(Binding {
            inner: Arc::new(BindingNode {
                parent: Some(self.clone()),
                entries,
            }),
        })
    }

    /// Creates a flat binding that only contains the given variables.
    pub fn project(&self, variables: &[Variable]) -> Binding {
        self.retain(|v| variables.contains(v))
    }

    /// Creates a flat binding that only contains the variables for which `predicate` holds.
    pub fn retain(&self, predicate: impl Fn(&Variable) -> bool) -> Binding {
        let entries = self
            .iter()
            .filter(|(variable, _)| predicate(variable))
            .map(|(v, t)| (v.clone(), t.clone()))
            .collect();
        Binding {
            inner: Arc::new(BindingNode {
                parent: None,
                entries,
            }),
        }
    }

    /// Returns the mappings sorted by variable name. Two equal bindings yield equal vectors.
    pub fn to_sorted_vec(&self) -> Vec<(&Variable, &Term)> {
        let mut entries = self.iter().collect::<Vec<_>>();
        entries.sort_unstable_by(|(lhs, _), (rhs, _)| lhs.as_str().cmp(rhs.as_str()));
        entries
    }

    fn nodes(&self) -> impl Iterator<Item = &BindingNode> {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.inner.parent.as_ref();
            Some(current.inner.as_ref())
        })
    }
}

impl Default for Binding {
    fn default() -> Self {
        Self::root()
    }
}

/// Equality of the mappings, independent of how the parent chain is structured.
impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(variable, term)| other.get(variable) == Some(term))
    }
}

impl Eq for Binding {}

impl Hash for Binding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (variable, term) in self.to_sorted_vec() {
            variable.hash(state);
            term.hash(state);
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, (variable, term)) in self.to_sorted_vec().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "({variable} {term})")?;
        }
        f.write_str(")")
    }
}

/// Builds a [Binding], optionally on top of a parent.
pub struct BindingBuilder {
    parent: Option<Binding>,
    entries: Vec<(Variable, Term)>,
}

impl BindingBuilder {
    /// Adds a mapping.
    ///
    /// Adding a variable that is already bound to the same term is a no-op. Adding a variable
    /// that is bound to a different term fails.
    pub fn add(&mut self, variable: Variable, term: Term) -> Result<&mut Self, BindingConflictError> {
        let existing = self
            .entries
            .iter()
            .find(|(v, _)| *v == variable)
            .map(|(_, t)| t)
            .or_else(|| self.parent.as_ref().and_then(|p| p.get(&variable)));

        match existing {
            Some(existing) if *existing != term => Err(BindingConflictError {
                variable,
                existing: existing.clone(),
            }),
            Some(_) => Ok(self),
            None => {
                self.entries.push((variable, term));
                Ok(self)
            }
        }
    }

    /// Returns whether no mapping has been added yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self) -> Binding {
        match self.parent {
            Some(parent) if self.entries.is_empty() => parent,
            parent => Binding {
                inner: Arc::new(BindingNode {
                    parent,
                    entries: self.entries,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode};

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    fn iri(value: &str) -> Term {
        NamedNode::new_unchecked(format!("http://example.com/{value}")).into()
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let parent = Binding::root().with(var("x"), iri("a")).unwrap();
        let child = parent.with(var("y"), iri("b")).unwrap();

        assert_eq!(child.get(&var("x")), Some(&iri("a")));
        assert_eq!(child.get(&var("y")), Some(&iri("b")));
        assert_eq!(child.get(&var("z")), None);
        assert_eq!(parent.get(&var("y")), None);
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn builder_rejects_conflicting_terms() {
        let parent = Binding::root().with(var("x"), iri("a")).unwrap();

        let mut builder = parent.child();
        assert!(builder.add(var("x"), iri("a")).is_ok());
        let error = builder.add(var("x"), iri("b")).err().unwrap();
        assert_eq!(error.existing, iri("a"));
        assert!(builder.is_empty());
    }

    #[test]
    fn equality_ignores_chain_shape() {
        let chained = Binding::root()
            .with(var("x"), iri("a"))
            .unwrap()
            .with(var("y"), Literal::from(1).into())
            .unwrap();

        let mut builder = Binding::builder();
        builder.add(var("y"), Literal::from(1).into()).unwrap();
        builder.add(var("x"), iri("a")).unwrap();
        let flat = builder.build();

        assert_eq!(chained, flat);
        assert_eq!(chained.to_string(), flat.to_string());
    }

    #[test]
    fn merge_compatible_and_incompatible() {
        let left = Binding::root().with(var("x"), iri("a")).unwrap();
        let right_ok = Binding::root()
            .with(var("x"), iri("a"))
            .unwrap()
            .with(var("y"), iri("b"))
            .unwrap();
        let right_bad = Binding::root().with(var("x"), iri("c")).unwrap();

        let merged = left.merge(&right_ok).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get(&var("y")), Some(&iri("b")));
        assert!(left.merge(&right_bad).is_none());
        assert!(!left.is_compatible(&right_bad));
    }

    #[test]
    fn project_flattens() {
        let binding = Binding::root()
            .with(var("x"), iri("a"))
            .unwrap()
            .with(var("y"), iri("b"))
            .unwrap();

        let projected = binding.project(&[var("y")]);
        assert!(projected.parent().is_none());
        assert_eq!(projected.len(), 1);
        assert!(projected.contains(&var("y")));
    }
}
