// Runtime classification of axis values

use crate::dates::{is_timestamp, parse_date_str};
use serde::Serialize;
use serde_json::Value;

/// Detected type of an axis, decided once per axis and matched on by every stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisValueType {
    Date,
    Number,
    String,
    Boolean,
    Object,
    Array,
}

impl AxisValueType {
    pub fn is_number(&self) -> bool {
        matches!(self, AxisValueType::Number)
    }
}

/// Classify a single non-null value.
///
/// Strings that parse as dates and integers shaped like unix timestamps are
/// dates; null has no type.
pub fn determine_type(value: &Value) -> Option<AxisValueType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(AxisValueType::Boolean),
        Value::Number(n) => match n.as_i64() {
            Some(i) if is_timestamp(i) => Some(AxisValueType::Date),
            _ => Some(AxisValueType::Number),
        },
        Value::String(s) if parse_date_str(s).is_some() => Some(AxisValueType::Date),
        Value::String(_) => Some(AxisValueType::String),
        Value::Array(_) => Some(AxisValueType::Array),
        Value::Object(_) => Some(AxisValueType::Object),
    }
}

/// Type of an axis: the type of its first non-null value
pub fn classify_axis<'a, I>(values: I) -> Option<AxisValueType>
where
    I: IntoIterator<Item = &'a Value>,
{
    values.into_iter().find_map(determine_type)
}

/// Classify a measured (Y) value by its JSON kind alone. Large integers stay
/// numbers and date-like strings stay strings.
pub fn determine_value_kind(value: &Value) -> Option<AxisValueType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(AxisValueType::Boolean),
        Value::Number(_) => Some(AxisValueType::Number),
        Value::String(_) => Some(AxisValueType::String),
        Value::Array(_) => Some(AxisValueType::Array),
        Value::Object(_) => Some(AxisValueType::Object),
    }
}

/// Kind of a Y axis: the kind of its first non-null value
pub fn classify_values<'a, I>(values: I) -> Option<AxisValueType>
where
    I: IntoIterator<Item = &'a Value>,
{
    values.into_iter().find_map(determine_value_kind)
}
