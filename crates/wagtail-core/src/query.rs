//! Lazy, composable row queries.
//!
//! A `Query<T>` is a list of predicates plus an optional ordering. Building
//! one touches no data; it is evaluated only when handed to a store or
//! applied to a row set. Narrowing a query returns a new query, so a query
//! returned by a lookup can be filtered further by a report and still mean
//! the same thing when it is finally run.

use std::{cmp::Ordering, fmt, sync::Arc};

/// A row predicate.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A row comparator used for ordering results.
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

pub struct Query<T> {
    predicates: Vec<Predicate<T>>,
    ordering: Option<Comparator<T>>,
    empty: bool,
}

impl<T> Query<T> {
    /// A query matching every row.
    pub fn all() -> Self {
        Self {
            predicates: Vec::new(),
            ordering: None,
            empty: false,
        }
    }

    /// A query matching nothing. Further filters keep it empty.
    pub fn none() -> Self {
        Self {
            predicates: Vec::new(),
            ordering: None,
            empty: true,
        }
    }

    /// Narrow the query with one more predicate.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.and(Arc::new(predicate))
    }

    /// Narrow the query with a shared predicate.
    pub fn and(mut self, predicate: Predicate<T>) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Replace the result ordering.
    pub fn order_by<F>(mut self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.ordering = Some(Arc::new(compare));
        self
    }

    /// True for a query built with `none()`.
    pub fn is_none(&self) -> bool {
        self.empty
    }

    pub fn matches(&self, row: &T) -> bool {
        !self.empty && self.predicates.iter().all(|p| p(row))
    }

    /// Evaluate the query against an in-memory row set.
    pub fn apply<I>(&self, rows: I) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
    {
        if self.empty {
            return Vec::new();
        }
        let mut matched: Vec<T> = rows.into_iter().filter(|row| self.matches(row)).collect();
        if let Some(compare) = &self.ordering {
            matched.sort_by(|a, b| compare(a, b));
        }
        matched
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            ordering: self.ordering.clone(),
            empty: self.empty,
        }
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::all()
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("predicates", &self.predicates.len())
            .field("ordered", &self.ordering.is_some())
            .field("empty", &self.empty)
            .finish()
    }
}
