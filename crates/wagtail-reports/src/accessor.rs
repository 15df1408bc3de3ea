//! How a dependent filter finds the related ids of each option.
//!
//! An accessor is resolved once, when the filter set is built. A name is
//! looked up first as a relation on the option type, then as a named
//! accessor; an unknown name fails construction instead of failing later
//! per option.

use std::{fmt, sync::Arc};

use wagtail_contracts::{
    error::{WagtailError, WagtailResult},
    workflow::Task,
};
use wagtail_core::traits::WorkflowCatalog;

/// Reads a list of related primary keys from an option object.
pub type RelatedIds<T> = Arc<dyn Fn(&T) -> Vec<String> + Send + Sync>;

/// A type whose relations and accessors can be named by a dependent filter.
pub trait FilterTarget: Sized + 'static {
    /// What a named accessor needs besides the object itself.
    type Context: Clone + Send + Sync + 'static;

    /// A relation loaded with the object.
    fn relation(name: &str) -> Option<fn(&Self) -> Vec<String>>;

    /// A zero-argument accessor that consults `Context`.
    fn accessor(name: &str) -> Option<fn(&Self, &Self::Context) -> Vec<String>>;
}

pub enum FilterAccessor<T> {
    Relation {
        name: String,
        read: fn(&T) -> Vec<String>,
    },
    Method {
        name: String,
        call: RelatedIds<T>,
    },
    Function(RelatedIds<T>),
}

impl<T: FilterTarget> FilterAccessor<T> {
    /// Resolve `name` against `T`.
    pub fn named(name: &str, context: T::Context) -> WagtailResult<Self> {
        if let Some(read) = T::relation(name) {
            return Ok(FilterAccessor::Relation {
                name: name.to_string(),
                read,
            });
        }
        if let Some(accessor) = T::accessor(name) {
            return Ok(FilterAccessor::Method {
                name: name.to_string(),
                call: Arc::new(move |obj: &T| accessor(obj, &context)),
            });
        }
        Err(WagtailError::Config {
            reason: format!(
                "'{}' is neither a relation nor an accessor of {}",
                name,
                std::any::type_name::<T>()
            ),
        })
    }
}

impl<T> FilterAccessor<T> {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&T) -> Vec<String> + Send + Sync + 'static,
    {
        FilterAccessor::Function(Arc::new(f))
    }

    pub fn related_ids(&self, obj: &T) -> Vec<String> {
        match self {
            FilterAccessor::Relation { read, .. } => read(obj),
            FilterAccessor::Method { call, .. } => call(obj),
            FilterAccessor::Function(f) => f(obj),
        }
    }
}

impl<T> fmt::Debug for FilterAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterAccessor::Relation { name, .. } => write!(f, "Relation({name})"),
            FilterAccessor::Method { name, .. } => write!(f, "Method({name})"),
            FilterAccessor::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl FilterTarget for Task {
    type Context = Arc<dyn WorkflowCatalog>;

    fn relation(name: &str) -> Option<fn(&Self) -> Vec<String>> {
        match name {
            "workflows" => Some(|task: &Task| task.workflows.iter().map(|w| w.0.to_string()).collect()),
            _ => None,
        }
    }

    fn accessor(name: &str) -> Option<fn(&Self, &Self::Context) -> Vec<String>> {
        match name {
            "get_workflows" => Some(|task: &Task, catalog: &Arc<dyn WorkflowCatalog>| {
                catalog
                    .workflows_for_task(task.id)
                    .into_iter()
                    .map(|w| w.0.to_string())
                    .collect()
            }),
            _ => None,
        }
    }
}
