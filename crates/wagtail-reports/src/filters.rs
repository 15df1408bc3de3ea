//! Filter primitives.
//!
//! A `Filter<T>` binds one form field to one attribute of `T`. Given the
//! request parameters it either does nothing (field left empty), narrows
//! the query, or reports why the submitted value was rejected.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};

use wagtail_contracts::labels;
use wagtail_core::Predicate;

use crate::{
    accessor::FilterAccessor,
    params::QueryParams,
    widgets::{auto_id, suffixed, FieldDescriptor, FilterOption, Widget, RANGE_SUFFIXES},
};

/// Format of date parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A submitted value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of reading one filter's parameters.
pub enum Applied<T> {
    Unset,
    Narrow(Predicate<T>),
    Invalid(String),
}

/// An inclusive date range. Either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeValue {
    pub start: Option<NaiveDate>,
    pub stop: Option<NaiveDate>,
}

impl DateRangeValue {
    /// True when `at` falls on or after `start` and on or before `stop`,
    /// comparing whole UTC days.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if at < start_of_day(start) {
                return false;
            }
        }
        if let Some(stop) = self.stop {
            // No next day means `stop` is the last representable date.
            if let Some(next) = stop.checked_add_days(Days::new(1)) {
                if at >= start_of_day(next) {
                    return false;
                }
            }
        }
        true
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| "Enter a valid date.".to_string())
}

pub enum FilterKind<T> {
    DateRange {
        field: fn(&T) -> Option<DateTime<Utc>>,
    },
    Choice {
        choices: Vec<FilterOption>,
        field: fn(&T) -> Option<String>,
    },
    Boolean {
        field: fn(&T) -> bool,
    },
    ModelChoice {
        choices: Vec<FilterOption>,
        field: fn(&T) -> Option<String>,
    },
    /// A model choice whose options carry the related ids of a dependent
    /// control.
    FilteredModelChoice {
        choices: Vec<FilterOption>,
        filter_field: String,
        field: fn(&T) -> Option<String>,
    },
    /// Exact match.
    Text {
        field: fn(&T) -> String,
    },
}

pub struct Filter<T> {
    pub name: String,
    pub label: String,
    pub kind: FilterKind<T>,
}

impl<T: 'static> Filter<T> {
    pub fn date_range(name: &str, label: &str, field: fn(&T) -> Option<DateTime<Utc>>) -> Self {
        Self::new(name, label, FilterKind::DateRange { field })
    }

    pub fn choice(name: &str, label: &str, choices: Vec<FilterOption>, field: fn(&T) -> Option<String>) -> Self {
        Self::new(name, label, FilterKind::Choice { choices, field })
    }

    pub fn boolean(name: &str, label: &str, field: fn(&T) -> bool) -> Self {
        Self::new(name, label, FilterKind::Boolean { field })
    }

    pub fn model_choice(
        name: &str,
        label: &str,
        choices: Vec<FilterOption>,
        field: fn(&T) -> Option<String>,
    ) -> Self {
        Self::new(name, label, FilterKind::ModelChoice { choices, field })
    }

    /// A dependent model choice over `objects`.
    ///
    /// Each option's `filter_value` is filled in here, once, from
    /// `accessor`.
    pub fn filtered_model_choice<O>(
        name: &str,
        label: &str,
        objects: &[O],
        option: fn(&O) -> FilterOption,
        accessor: &FilterAccessor<O>,
        filter_field: &str,
        field: fn(&T) -> Option<String>,
    ) -> Self {
        let choices = objects
            .iter()
            .map(|obj| option(obj).with_filter_value(accessor.related_ids(obj)))
            .collect();
        Self::new(
            name,
            label,
            FilterKind::FilteredModelChoice {
                choices,
                filter_field: filter_field.to_string(),
                field,
            },
        )
    }

    pub fn text(name: &str, label: &str, field: fn(&T) -> String) -> Self {
        Self::new(name, label, FilterKind::Text { field })
    }

    fn new(name: &str, label: &str, kind: FilterKind<T>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
        }
    }

    pub fn widget(&self) -> Widget {
        match &self.kind {
            FilterKind::DateRange { .. } => Widget::date_range_picker(),
            FilterKind::Choice { .. } => Widget::ButtonSelect,
            FilterKind::Boolean { .. } => Widget::BooleanButtonSelect,
            FilterKind::ModelChoice { .. } => Widget::Select,
            FilterKind::FilteredModelChoice { filter_field, .. } => Widget::FilteredSelect {
                filter_field: filter_field.clone(),
            },
            FilterKind::Text { .. } => Widget::TextInput,
        }
    }

    /// Parameter names this filter reads.
    pub fn param_names(&self) -> Vec<String> {
        self.widget().param_names(&self.name)
    }

    pub fn choices(&self) -> &[FilterOption] {
        match &self.kind {
            FilterKind::Choice { choices, .. }
            | FilterKind::ModelChoice { choices, .. }
            | FilterKind::FilteredModelChoice { choices, .. } => choices.as_slice(),
            _ => &[],
        }
    }

    pub fn descriptor(&self) -> FieldDescriptor {
        let (empty_label, options) = match &self.kind {
            FilterKind::Choice { choices, .. } => (Some(labels::ALL), choices.clone()),
            FilterKind::ModelChoice { choices, .. }
            | FilterKind::FilteredModelChoice { choices, .. } => {
                (Some(labels::EMPTY_CHOICE), choices.clone())
            }
            FilterKind::Boolean { .. } => (
                None,
                vec![
                    FilterOption::new("", labels::ALL),
                    FilterOption::new("true", labels::YES),
                    FilterOption::new("false", labels::NO),
                ],
            ),
            FilterKind::DateRange { .. } | FilterKind::Text { .. } => (None, Vec::new()),
        };
        FieldDescriptor {
            name: self.name.clone(),
            auto_id: auto_id(&self.name),
            label: self.label.clone(),
            widget: self.widget(),
            empty_label: empty_label.map(str::to_string),
            options,
        }
    }

    /// Read this filter's parameters out of `params`.
    pub fn apply(&self, params: &QueryParams) -> Applied<T> {
        match self.read_value(params) {
            Ok(None) => Applied::Unset,
            Ok(Some(value)) => Applied::Narrow(self.predicate(value)),
            Err(message) => Applied::Invalid(message),
        }
    }

    /// Human readable form of the applied value, for active filter chips.
    pub fn display_value(&self, params: &QueryParams) -> Option<String> {
        let value = self.read_value(params).ok()??;
        Some(match value {
            FilterValue::Range(range) => format!(
                "{} - {}",
                range.start.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default(),
                range.stop.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
            ),
            FilterValue::Flag(true) => labels::YES.to_string(),
            FilterValue::Flag(false) => labels::NO.to_string(),
            FilterValue::Exact(value) => self
                .choices()
                .iter()
                .find(|option| option.value == value)
                .map(|option| option.label.clone())
                .unwrap_or(value),
        })
    }

    fn read_value(&self, params: &QueryParams) -> Result<Option<FilterValue>, String> {
        match &self.kind {
            FilterKind::DateRange { .. } => {
                let [after, before] = RANGE_SUFFIXES.map(|s| params.value(&suffixed(&self.name, s)));
                if after.is_none() && before.is_none() {
                    return Ok(None);
                }
                Ok(Some(FilterValue::Range(DateRangeValue {
                    start: after.map(parse_date).transpose()?,
                    stop: before.map(parse_date).transpose()?,
                })))
            }
            FilterKind::Boolean { .. } => Ok(match params.value(&self.name) {
                Some("true" | "True" | "1") => Some(FilterValue::Flag(true)),
                Some("false" | "False" | "0") => Some(FilterValue::Flag(false)),
                _ => None,
            }),
            FilterKind::Choice { choices, .. } => match params.value(&self.name) {
                None => Ok(None),
                Some(value) if choices.iter().any(|c| c.value == value) => {
                    Ok(Some(FilterValue::Exact(value.to_string())))
                }
                Some(value) => Err(format!(
                    "Select a valid choice. {value} is not one of the available choices."
                )),
            },
            FilterKind::ModelChoice { choices, .. }
            | FilterKind::FilteredModelChoice { choices, .. } => match params.value(&self.name) {
                None => Ok(None),
                Some(value) if choices.iter().any(|c| c.value == value) => {
                    Ok(Some(FilterValue::Exact(value.to_string())))
                }
                Some(_) => Err(
                    "Select a valid choice. That choice is not one of the available choices."
                        .to_string(),
                ),
            },
            FilterKind::Text { .. } => Ok(params
                .value(&self.name)
                .map(|v| FilterValue::Exact(v.to_string()))),
        }
    }

    fn predicate(&self, value: FilterValue) -> Predicate<T> {
        match (&self.kind, value) {
            (FilterKind::DateRange { field }, FilterValue::Range(range)) => {
                let field = *field;
                Arc::new(move |row: &T| field(row).is_some_and(|at| range.contains(at)))
            }
            (FilterKind::Boolean { field }, FilterValue::Flag(flag)) => {
                let field = *field;
                Arc::new(move |row: &T| field(row) == flag)
            }
            (
                FilterKind::Choice { field, .. }
                | FilterKind::ModelChoice { field, .. }
                | FilterKind::FilteredModelChoice { field, .. },
                FilterValue::Exact(value),
            ) => {
                let field = *field;
                Arc::new(move |row: &T| field(row).as_deref() == Some(value.as_str()))
            }
            (FilterKind::Text { field }, FilterValue::Exact(value)) => {
                let field = *field;
                Arc::new(move |row: &T| field(row) == value)
            }
            // read_value only produces the value shape matching the kind.
            _ => Arc::new(|_: &T| false),
        }
    }
}

enum FilterValue {
    Range(DateRangeValue),
    Flag(bool),
    Exact(String),
}
