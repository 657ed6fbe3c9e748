// Record filtering ahead of axis resolution

use crate::classify::{determine_type, AxisValueType};
use crate::dates::{date_to_value, value_to_date, DateWindow};
use crate::error::AxisError;
use crate::ir::{FilterCondition, FilterOperator, RunContext, WarningKind};
use crate::parser::{parse_path_expr, PathExpr};
use crate::resolve::{get_path, get_path_mut};
use serde_json::Value;
use std::cmp::Ordering;

/// Keep only the records, in the array `target` iterates, that satisfy every condition.
///
/// Returns a filtered copy of `data`. Incomplete conditions, and conditions on
/// a field outside the target's record array, are skipped with a warning; a
/// target that is not an array is left untouched so the resolver can report it.
pub fn filter_records(
    data: &Value,
    target: &PathExpr,
    conditions: &[FilterCondition],
    ctx: &mut RunContext,
    dataset: usize,
) -> Result<Value, AxisError> {
    let mut active = Vec::with_capacity(conditions.len());
    for condition in conditions {
        if condition.field.trim().is_empty()
            || (condition.operator.takes_value() && condition.value.is_none())
        {
            ctx.warn(
                dataset,
                WarningKind::SkippedCondition,
                format!("Condition on '{}' is incomplete and was ignored", condition.field),
            );
            continue;
        }
        let field = parse_path_expr(&condition.field)?;
        if field.array_path != target.array_path {
            ctx.warn(
                dataset,
                WarningKind::SkippedCondition,
                format!(
                    "Condition on '{}' addresses a different array than '{}' and was ignored",
                    condition.field, target
                ),
            );
            continue;
        }
        active.push((field, condition));
    }

    let mut filtered = data.clone();
    if active.is_empty() {
        return Ok(filtered);
    }

    if let Some(Value::Array(records)) = get_path_mut(&mut filtered, &target.array_path) {
        let before = records.len();
        records.retain(|record| {
            active
                .iter()
                .all(|(field, condition)| matches_condition(get_path(record, &field.item_path), condition))
        });
        tracing::debug!(dataset, kept = records.len(), removed = before - records.len(), "records filtered");
    }

    Ok(filtered)
}

/// The two bounds of a date window as conditions on `date_field`
pub fn date_window_conditions(date_field: &str, window: &DateWindow) -> Vec<FilterCondition> {
    vec![
        FilterCondition {
            field: date_field.to_string(),
            operator: FilterOperator::GreaterOrEqual,
            value: Some(date_to_value(window.start)),
        },
        FilterCondition {
            field: date_field.to_string(),
            operator: FilterOperator::LessOrEqual,
            value: Some(date_to_value(window.end)),
        },
    ]
}

/// Evaluate one condition against a record's field value
pub fn matches_condition(field_value: Option<&Value>, condition: &FilterCondition) -> bool {
    let value = field_value.filter(|v| !v.is_null());
    match condition.operator {
        FilterOperator::IsNull => value.is_none(),
        FilterOperator::IsNotNull => value.is_some(),
        op => match (value, condition.value.as_ref()) {
            (Some(value), Some(target)) => compare(value, target, op),
            (None, _) => matches!(op, FilterOperator::IsNot | FilterOperator::NotContains),
            (Some(_), None) => true,
        },
    }
}

fn compare(value: &Value, target: &Value, op: FilterOperator) -> bool {
    if matches!(op, FilterOperator::Contains | FilterOperator::NotContains) {
        let found = text(value).to_lowercase().contains(&text(target).to_lowercase());
        return found == (op == FilterOperator::Contains);
    }

    let ordering = match determine_type(value) {
        Some(AxisValueType::Date) => cmp_dates(value, target).or_else(|| cmp_numbers(value, target)),
        Some(AxisValueType::Number) => cmp_numbers(value, target),
        Some(AxisValueType::Boolean) => cmp_bools(value, target),
        _ => None,
    }
    .unwrap_or_else(|| text(value).cmp(&text(target)));

    match op {
        FilterOperator::Is => ordering == Ordering::Equal,
        FilterOperator::IsNot => ordering != Ordering::Equal,
        FilterOperator::GreaterThan => ordering == Ordering::Greater,
        FilterOperator::GreaterOrEqual => ordering != Ordering::Less,
        FilterOperator::LessThan => ordering == Ordering::Less,
        FilterOperator::LessOrEqual => ordering != Ordering::Greater,
        _ => false,
    }
}

fn cmp_dates(a: &Value, b: &Value) -> Option<Ordering> {
    Some(value_to_date(a)?.cmp(&value_to_date(b)?))
}

fn cmp_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    as_number(a)?.partial_cmp(&as_number(b)?)
}

fn cmp_bools(a: &Value, b: &Value) -> Option<Ordering> {
    Some(as_bool(a)?.cmp(&as_bool(b)?))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
