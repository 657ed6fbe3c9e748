use crate::classify::{classify_axis, AxisValueType};
use crate::dates::value_to_date;
use crate::error::AxisError;
use crate::ir::AxisPoint;
use crate::parser::{PathExpr, Segment};
use serde_json::Value;

/// Walk `segments` down from `value`
pub fn get_path<'a>(value: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    segments.iter().try_fold(value, |current, seg| match seg {
        Segment::Field(name) => current.get(name.as_str()),
        Segment::Index(idx) => current.get(*idx),
    })
}

/// Mutable variant of [`get_path`]
pub fn get_path_mut<'a>(value: &'a mut Value, segments: &[Segment]) -> Option<&'a mut Value> {
    segments.iter().try_fold(value, |current, seg| match seg {
        Segment::Field(name) => current.get_mut(name.as_str()),
        Segment::Index(idx) => current.get_mut(*idx),
    })
}

/// Locate the record array a path iterates over
pub fn locate_records<'a>(
    data: &'a Value,
    path: &PathExpr,
    axis: &str,
) -> Result<&'a [Value], AxisError> {
    match get_path(data, &path.array_path) {
        Some(Value::Array(items)) => Ok(items.as_slice()),
        _ => Err(AxisError::not_an_array(axis)),
    }
}

/// Read the addressed value from every record; absent values become null
pub fn extract_values(data: &Value, path: &PathExpr, axis: &str) -> Result<Vec<Value>, AxisError> {
    let records = locate_records(data, path, axis)?;
    Ok(records
        .iter()
        .map(|record| get_path(record, &path.item_path).cloned().unwrap_or(Value::Null))
        .collect())
}

/// Pair X and Y values into points.
///
/// When both paths iterate the same array each record yields one point. When
/// they iterate different arrays, each Y record is tied to an X value through
/// the X field name (falling back to the X record at the same position) and
/// kept only if that value appears on the X axis. Records without an X value
/// are dropped either way.
pub fn resolve_points(
    data: &Value,
    x_path: &PathExpr,
    y_path: &PathExpr,
) -> Result<Vec<AxisPoint>, AxisError> {
    let x_values = extract_values(data, x_path, "X")?;
    let y_records = locate_records(data, y_path, "Y")?;

    if x_values.len() != y_records.len() {
        return Err(AxisError::length_mismatch(x_values.len(), y_records.len()));
    }

    let y_value =
        |record: &Value| get_path(record, &y_path.item_path).cloned().unwrap_or(Value::Null);

    let points: Vec<AxisPoint> = if x_path.array_path == y_path.array_path {
        x_values
            .into_iter()
            .zip(y_records)
            .map(|(x, record)| AxisPoint { x, y: y_value(record) })
            .collect()
    } else {
        let x_type = classify_axis(&x_values);
        let field = x_path.field_name();
        y_records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let x = field
                    .and_then(|name| record.get(name))
                    .cloned()
                    .unwrap_or_else(|| x_values[idx].clone());
                AxisPoint { x, y: y_value(record) }
            })
            .filter(|point| appears_on_axis(&point.x, &x_values, x_type))
            .collect()
    };

    let total = points.len();
    let points: Vec<AxisPoint> = points.into_iter().filter(|p| !p.x.is_null()).collect();
    if points.len() < total {
        tracing::debug!(dropped = total - points.len(), "records without an X value dropped");
    }
    Ok(points)
}

/// Direct equality, or equality of the parsed instant on date axes
fn appears_on_axis(candidate: &Value, x_values: &[Value], x_type: Option<AxisValueType>) -> bool {
    if x_values.contains(candidate) {
        return true;
    }
    if x_type == Some(AxisValueType::Date) {
        if let Some(target) = value_to_date(candidate) {
            return x_values.iter().any(|x| value_to_date(x) == Some(target));
        }
    }
    false
}
