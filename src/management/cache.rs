use std::{collections::HashMap, fmt, time::Duration};

use chrono::{DateTime, Utc};

use crate::management::{
    filter::{FilterState, FilterValue},
    pagination::PaginationState,
};

/// Canonical identity of one list query.
///
/// Filters are stored in key order with every known key present, either as a
/// concrete value or as `Any`, so the order in which the user set them never
/// shows up in the signature. The search term is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySignature {
    filters: Vec<(&'static str, FilterValue)>,
    search: String,
    page: u32,
    limit: u32,
}

impl QuerySignature {
    pub fn new(filters: &FilterState, page: u32, limit: u32) -> Self {
        Self {
            filters: filters.entries().map(|(k, v)| (k, v.clone())).collect(),
            search: filters.search().trim().to_string(),
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Settled search term, `None` when empty.
    pub fn search(&self) -> Option<&str> {
        if self.search.is_empty() {
            None
        } else {
            Some(&self.search)
        }
    }

    /// Filters that carry a concrete value, in key order.
    pub fn active_filters(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.filters
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|value| (*k, value)))
    }

    /// Query-string pairs for the list or search endpoint.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);
        if let Some(q) = self.search() {
            pairs.push(("q".to_string(), q.to_string()));
        }
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("limit".to_string(), self.limit.to_string()));
        for (key, value) in self.active_filters() {
            pairs.push((key.to_string(), value.to_string()));
        }
        pairs
    }
}

impl fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limit={}&page={}", self.limit, self.page)?;
        for (key, value) in &self.filters {
            write!(f, "&{}={}", key, value.as_str().unwrap_or("*"))?;
        }
        write!(f, "&q={}", self.search)
    }
}

/// A previously fetched page.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub results: Vec<T>,
    pub pagination: PaginationState,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(results: Vec<T>, pagination: PaginationState) -> Self {
        Self {
            results,
            pagination,
            fetched_at: Utc::now(),
        }
    }

    fn is_fresh(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        let Some(ttl) = ttl else {
            return true;
        };
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.fetched_at < ttl,
            Err(_) => true,
        }
    }
}

/// Pages fetched for one view since its filters last changed.
///
/// There is no size bound: the cache only ever holds the query combinations
/// visited under the current filters and is emptied on every filter change.
#[derive(Debug)]
pub struct ResultCache<T> {
    entries: HashMap<QuerySignature, CacheEntry<T>>,
    ttl: Option<Duration>,
}

impl<T: Clone> ResultCache<T> {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Returns the entry for `signature` unless it has outlived the TTL.
    pub fn get(&self, signature: &QuerySignature) -> Option<&CacheEntry<T>> {
        let now = Utc::now();
        self.entries
            .get(signature)
            .filter(|entry| entry.is_fresh(self.ttl, now))
    }

    pub fn put(&mut self, signature: QuerySignature, entry: CacheEntry<T>) {
        self.entries.insert(signature, entry);
    }

    pub fn clear(&mut self) {
        self.entries = HashMap::new();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
