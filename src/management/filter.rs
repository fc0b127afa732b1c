use std::collections::BTreeMap;

use crate::error::FilterError;

/// Value of a single filter key.
///
/// `Any` is the explicit "no filter" sentinel, so a signature never has to
/// tell an unset key apart from a missing one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FilterValue {
    #[default]
    Any,
    Is(String),
}

impl FilterValue {
    /// Builds a value from user input; blank input means "no filter".
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            FilterValue::Any
        } else {
            FilterValue::Is(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterValue::Any => None,
            FilterValue::Is(value) => Some(value),
        }
    }
}

/// Current filter and search selection of one list view.
///
/// The set of filter keys is fixed when the state is created. Search input is
/// tracked twice: the raw text the user is typing and the settled term that
/// actually takes part in queries.
#[derive(Debug, Clone)]
pub struct FilterState {
    keys: &'static [&'static str],
    values: BTreeMap<&'static str, FilterValue>,
    search_input: String,
    search: String,
    revision: u64,
}

impl FilterState {
    pub fn new(keys: &'static [&'static str]) -> Self {
        Self {
            keys,
            values: keys.iter().map(|k| (*k, FilterValue::Any)).collect(),
            search_input: String::new(),
            search: String::new(),
            revision: 0,
        }
    }

    pub fn keys(&self) -> &'static [&'static str] {
        self.keys
    }

    /// Sets `key` to `value`. Returns `true` when the selection changed.
    pub fn set_filter(&mut self, key: &str, value: &str) -> Result<bool, FilterError> {
        let slot = self.slot(key)?;
        let value = FilterValue::from_input(value);
        if *slot == value {
            return Ok(false);
        }
        *slot = value;
        self.revision += 1;
        Ok(true)
    }

    pub fn clear_filter(&mut self, key: &str) -> Result<bool, FilterError> {
        self.set_filter(key, "")
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    /// Records what the user typed. This does not touch the settled term.
    pub fn set_search_input(&mut self, text: &str) {
        self.search_input = text.to_string();
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Applies a settled search term. Returns `true` when the normalized term
    /// differs from the current one. An empty term is a valid value.
    pub fn apply_search(&mut self, settled: &str) -> bool {
        self.search_input = settled.to_string();
        let normalized = settled.trim();
        if normalized == self.search {
            return false;
        }
        self.search = normalized.to_string();
        self.revision += 1;
        true
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Restores every key to `Any` and clears the search term.
    pub fn reset(&mut self) -> bool {
        let dirty = !self.search.is_empty()
            || self.values.values().any(|v| *v != FilterValue::Any);
        for value in self.values.values_mut() {
            *value = FilterValue::Any;
        }
        self.search.clear();
        self.search_input.clear();
        if dirty {
            self.revision += 1;
        }
        dirty
    }

    /// Entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Monotonic counter bumped by every effective mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn slot(&mut self, key: &str) -> Result<&mut FilterValue, FilterError> {
        let allowed = self.keys;
        self.values
            .get_mut(key)
            .ok_or_else(|| FilterError::UnknownKey {
                key: key.to_string(),
                allowed: allowed.join(", "),
            })
    }
}
