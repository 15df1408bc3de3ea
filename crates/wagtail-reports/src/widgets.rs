//! Widget descriptions for filter fields.
//!
//! Nothing here renders HTML. A `FieldDescriptor` tells the presentation
//! layer which control to draw and which options to offer.

use serde::Serialize;

use wagtail_contracts::labels;

/// Parameter suffixes of a date range, in (from, to) order.
pub const RANGE_SUFFIXES: [&str; 2] = ["after", "before"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    /// Two date inputs submitted as `<name>_after` and `<name>_before`.
    DateRangePicker {
        suffixes: [&'static str; 2],
        placeholders: [&'static str; 2],
    },
    /// A row of buttons, one per choice plus the empty "All" choice.
    ButtonSelect,
    /// All / Yes / No.
    BooleanButtonSelect,
    Select,
    /// A select whose options are shown or hidden according to the value of
    /// the control with HTML id `filter_field`.
    FilteredSelect { filter_field: String },
    TextInput,
}

impl Widget {
    pub fn date_range_picker() -> Self {
        Widget::DateRangePicker {
            suffixes: RANGE_SUFFIXES,
            placeholders: [labels::DATE_FROM, labels::DATE_TO],
        }
    }

    /// The parameter names this widget submits for a field called `name`.
    pub fn param_names(&self, name: &str) -> Vec<String> {
        match self {
            Widget::DateRangePicker { suffixes, .. } => {
                suffixes.iter().map(|s| suffixed(name, s)).collect()
            }
            _ => vec![name.to_string()],
        }
    }
}

/// `name_suffix`, the parameter name of one half of a multi-part widget.
pub fn suffixed(name: &str, suffix: &str) -> String {
    format!("{name}_{suffix}")
}

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    /// Related ids a dependent select filters this option by.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_value: Option<Vec<String>>,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            filter_value: None,
        }
    }

    pub fn with_filter_value(mut self, ids: Vec<String>) -> Self {
        self.filter_value = Some(ids);
        self
    }
}

/// Presentation data for one filter field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// HTML id of the bound control, `id_<name>`.
    pub auto_id: String,
    pub label: String,
    pub widget: Widget,
    /// Label of the empty option, if the control has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_label: Option<String>,
    pub options: Vec<FilterOption>,
}

pub fn auto_id(name: &str) -> String {
    format!("id_{name}")
}
