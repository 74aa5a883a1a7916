use std::str::FromStr;

/// Options that control how an algebra tree is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Run the algebra optimizer before compiling the tree.
    pub optimize: bool,
    /// Remove the variables that have been allocated for blank nodes of the query from the
    /// solutions of the root iterator.
    pub hide_non_distinguished_variables: bool,
    /// Never split a basic pattern to place a filter. Filters are only placed around whole
    /// patterns or elements of a sequence.
    pub safe_filter_placement: bool,
    /// Evaluate joins and left joins by substitution when it is safe to do so. If disabled,
    /// every join materializes its right side.
    pub index_join_strategy: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            hide_non_distinguished_variables: true,
            safe_filter_placement: false,
            index_join_strategy: true,
        }
    }
}

/// An error while applying a setting to the [QueryOptions].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryOptionsError {
    #[error("Unknown query option: {0}")]
    UnknownKey(String),
    #[error("Invalid value '{value}' for query option {key}")]
    InvalidValue { key: String, value: String },
}

impl QueryOptions {
    pub const OPTIMIZE: &'static str = "optimize";
    pub const HIDE_NON_DISTINGUISHED_VARIABLES: &'static str = "hideNonDistinguishedVariables";
    pub const SAFE_FILTER_PLACEMENT: &'static str = "safeFilterPlacement";
    pub const INDEX_JOIN_STRATEGY: &'static str = "indexJoinStrategy";

    /// Creates options from key-value settings, starting from the defaults.
    pub fn from_settings<'a>(
        settings: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, QueryOptionsError> {
        let mut options = Self::default();
        for (key, value) in settings {
            options.set(key, value)?;
        }
        Ok(options)
    }

    /// Sets the option `key` to `value`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), QueryOptionsError> {
        let field = match key {
            Self::OPTIMIZE => &mut self.optimize,
            Self::HIDE_NON_DISTINGUISHED_VARIABLES => &mut self.hide_non_distinguished_variables,
            Self::SAFE_FILTER_PLACEMENT => &mut self.safe_filter_placement,
            Self::INDEX_JOIN_STRATEGY => &mut self.index_join_strategy,
            _ => return Err(QueryOptionsError::UnknownKey(key.to_owned())),
        };
        *field = bool::from_str(value).map_err(|_| QueryOptionsError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        })?;
        Ok(())
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_hide_non_distinguished_variables(mut self, hide: bool) -> Self {
        self.hide_non_distinguished_variables = hide;
        self
    }

    pub fn with_safe_filter_placement(mut self, safe: bool) -> Self {
        self.safe_filter_placement = safe;
        self
    }

    pub fn with_index_join_strategy(mut self, index_join: bool) -> Self {
        self.index_join_strategy = index_join;
        self
    }
}
