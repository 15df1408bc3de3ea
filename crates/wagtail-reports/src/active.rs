//! Summaries of the filters applied to a listing.
//!
//! Each active filter becomes a chip showing the field label and value, with
//! a link back to the listing that drops just that filter. Removing a filter
//! also drops the page number so the user lands on the first page of the
//! wider result.

use serde::Serialize;

use crate::{
    filtersets::FilterSet,
    params::{QueryParams, PAGE_PARAM},
    widgets::auto_id,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveFilter {
    pub auto_id: String,
    pub field_label: String,
    pub value: String,
    pub removed_filter_url: String,
}

impl<T: 'static> FilterSet<T> {
    /// Filters in `params` with a valid value, in field order.
    ///
    /// `base_url` is the listing URL; any query string on it is replaced.
    pub fn active_filters(&self, params: &QueryParams, base_url: &str) -> Vec<ActiveFilter> {
        let base_url = base_url.split('?').next().unwrap_or(base_url);

        self.filters()
            .iter()
            .filter_map(|filter| {
                let value = filter.display_value(params)?;

                let mut dropped = filter.param_names();
                dropped.push(PAGE_PARAM.to_string());
                let dropped: Vec<&str> = dropped.iter().map(String::as_str).collect();

                Some(ActiveFilter {
                    auto_id: auto_id(&filter.name),
                    field_label: filter.label.clone(),
                    value,
                    removed_filter_url: with_query(base_url, &params.without(&dropped)),
                })
            })
            .collect()
    }
}

fn with_query(base_url: &str, params: &QueryParams) -> String {
    if params.is_empty() {
        base_url.to_string()
    } else {
        format!("{}?{}", base_url, params.to_query_string())
    }
}
