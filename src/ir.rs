use crate::dates::{parse_date_str, DateFormat, TimeInterval};
use crate::error::AxisError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// Configuration
// =============================================================================

/// Explicit `null` reads as the field's default, same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Pie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YAxisOperation {
    #[default]
    None,
    Count,
    Sum,
    #[serde(alias = "average")]
    Avg,
}

/// Chart-level settings for one derivation run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(default, deserialize_with = "null_as_default", rename = "type")]
    pub chart_type: ChartType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_type: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_end_date: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub include_zeros: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_interval: TimeInterval,
    /// Previously derived output, reused when processing is skipped
    #[serde(default)]
    pub chart_data: Option<CachedChartData>,
}

impl ChartSpec {
    /// Cumulative time series: every value is the running total so far
    pub fn is_cumulative(&self) -> bool {
        self.sub_type.contains("AddTimeseries")
    }

    /// Stored date bounds, if both are set
    pub fn date_bounds(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, AxisError> {
        let (Some(start), Some(end)) = (&self.start_date, &self.end_date) else {
            return Ok(None);
        };
        let parse = |raw: &str| {
            parse_date_str(raw)
                .ok_or_else(|| AxisError::Config(format!("cannot parse chart date '{}'", raw)))
        };
        Ok(Some((parse(start)?, parse(end)?)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CachedChartData {
    #[serde(default)]
    pub data: Option<CachedData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CachedData {
    #[serde(default)]
    pub labels: Option<Vec<AxisKey>>,
    #[serde(default)]
    pub datasets: Option<Vec<CachedDataset>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CachedDataset {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "is", alias = "equals")]
    Is,
    #[serde(rename = "isNot", alias = "notEquals")]
    IsNot,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "notContains")]
    NotContains,
    #[serde(rename = "greaterThan")]
    GreaterThan,
    #[serde(rename = "greaterOrEqual")]
    GreaterOrEqual,
    #[serde(rename = "lessThan")]
    LessThan,
    #[serde(rename = "lessOrEqual")]
    LessOrEqual,
    #[serde(rename = "isNull")]
    IsNull,
    #[serde(rename = "isNotNull")]
    IsNotNull,
}

impl FilterOperator {
    pub fn takes_value(&self) -> bool {
        !matches!(self, FilterOperator::IsNull | FilterOperator::IsNotNull)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Path expression of the compared field
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Per-series settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSpec {
    pub x_axis: String,
    pub y_axis: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub y_axis_operation: YAxisOperation,
    #[serde(default)]
    pub date_field: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: Vec<FilterCondition>,

    // Presentation only
    #[serde(default)]
    pub legend: Option<String>,
    #[serde(default)]
    pub dataset_color: Option<String>,
    #[serde(default)]
    pub fill_color: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fill: bool,
    #[serde(default)]
    pub point_radius: Option<u32>,
}

/// A series definition together with its fetched records
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub options: DatasetSpec,
    #[serde(default)]
    pub data: Value,
}

// =============================================================================
// Axis values
// =============================================================================

/// One resolved (x, y) pair before formatting
#[derive(Debug, Clone, PartialEq)]
pub struct AxisPoint {
    pub x: Value,
    pub y: Value,
}

/// Grouping and display key on the X axis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisKey {
    Number(f64),
    Text(String),
    Bool(bool),
    Json(Value),
}

impl AxisKey {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map_or_else(|| AxisKey::Json(value.clone()), AxisKey::Number),
            Value::String(s) => AxisKey::Text(s.clone()),
            Value::Bool(b) => AxisKey::Bool(*b),
            other => AxisKey::Json(other.clone()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AxisKey::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn number_bits(n: f64) -> u64 {
        if n == 0.0 {
            0.0_f64.to_bits()
        } else {
            n.to_bits()
        }
    }
}

impl PartialEq for AxisKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AxisKey::Number(a), AxisKey::Number(b)) => {
                Self::number_bits(*a) == Self::number_bits(*b)
            }
            (AxisKey::Text(a), AxisKey::Text(b)) => a == b,
            (AxisKey::Bool(a), AxisKey::Bool(b)) => a == b,
            (AxisKey::Json(a), AxisKey::Json(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AxisKey {}

impl Hash for AxisKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AxisKey::Number(n) => Self::number_bits(*n).hash(state),
            AxisKey::Text(s) => s.hash(state),
            AxisKey::Bool(b) => b.hash(state),
            AxisKey::Json(v) => v.to_string().hash(state),
        }
    }
}

impl fmt::Display for AxisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisKey::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            AxisKey::Number(n) => write!(f, "{}", n),
            AxisKey::Text(s) => write!(f, "{}", s),
            AxisKey::Bool(b) => write!(f, "{}", b),
            AxisKey::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AxisKey {
    fn from(s: &str) -> Self {
        AxisKey::Text(s.to_string())
    }
}

impl From<f64> for AxisKey {
    fn from(n: f64) -> Self {
        AxisKey::Number(n)
    }
}

/// Comparison-ready form of an X value
#[derive(Debug, Clone, PartialEq)]
pub enum FilteredValue {
    /// Parsed date; `None` marks an invalid date
    Date(Option<NaiveDateTime>),
    Plain(Value),
}

/// Parallel arrays produced by the formatter, one entry per axis slot.
///
/// Slots are either source points (`source[i] = Some(index into the points)`)
/// or synthesized empty time buckets (`source[i] = None`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedAxis {
    pub filtered: Vec<FilteredValue>,
    pub formatted: Vec<AxisKey>,
    pub source: Vec<Option<usize>>,
}

impl FormattedAxis {
    pub fn push(&mut self, filtered: FilteredValue, formatted: AxisKey, source: Option<usize>) {
        self.filtered.push(filtered);
        self.formatted.push(formatted);
        self.source.push(source);
    }
}

/// One dataset reduced to a value per distinct key, in key order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesData {
    pub keys: Vec<AxisKey>,
    pub values: Vec<f64>,
    /// Earliest date behind each key, used to order date axes
    pub dates: Vec<Option<NaiveDateTime>>,
}

/// Engine output: one shared X sequence and one Y series per dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisData {
    pub x: Vec<AxisKey>,
    pub y: Vec<Vec<f64>>,
}

// =============================================================================
// Run state
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    /// sum/avg requested over non-numeric Y values; count was used instead
    DegradedToCount,
    /// A Y value could not be read as a number and counted as zero
    NonNumericValue,
    /// A filter condition was incomplete and ignored
    SkippedCondition,
}

/// Observable record of a quiet fallback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub dataset: usize,
    pub kind: WarningKind,
    pub message: String,
}

/// State shared by all datasets of one run. Build a fresh one per run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Clock for rolling windows
    pub now: NaiveDateTime,
    /// Decided by the first date-typed dataset, then reused
    pub date_format: Option<DateFormat>,
    pub warnings: Vec<Warning>,
}

impl RunContext {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            date_format: None,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, dataset: usize, kind: WarningKind, message: String) {
        tracing::warn!(dataset, ?kind, "{}", message);
        self.warnings.push(Warning {
            dataset,
            kind,
            message,
        });
    }
}
