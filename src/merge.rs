// Merge step: align every series onto one shared X sequence

use crate::classify::AxisValueType;
use crate::ir::{AxisData, AxisKey, SeriesData};
use chrono::NaiveDateTime;
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Union all keys, order them for the axis type, and re-walk each series over
/// the union. Missing keys get 0, or the previous value when `cumulative`
/// (flat extrapolation of an already accumulated series).
pub fn merge_series(
    series: &[SeriesData],
    x_type: Option<AxisValueType>,
    cumulative: bool,
) -> AxisData {
    let mut union: IndexMap<AxisKey, Option<NaiveDateTime>> = IndexMap::new();
    for s in series {
        for (key, date) in s.keys.iter().zip(&s.dates) {
            match union.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(*date);
                }
                Entry::Occupied(mut slot) => {
                    if let (Some(new), Some(old)) = (date, *slot.get()) {
                        if *new < old {
                            slot.insert(Some(*new));
                        }
                    }
                }
            }
        }
    }

    let mut keys: Vec<(AxisKey, Option<NaiveDateTime>)> = union.into_iter().collect();
    match x_type {
        Some(AxisValueType::Date) => keys.sort_by_key(|(_, date)| *date),
        Some(AxisValueType::Number) => keys.sort_by(|(a, _), (b, _)| compare_numeric(a, b)),
        _ => {}
    }
    let x: Vec<AxisKey> = keys.into_iter().map(|(key, _)| key).collect();

    let y = series.iter().map(|s| align(s, &x, cumulative)).collect();
    AxisData { x, y }
}

/// Numbers ascending; non-numeric keys keep their relative order after them
fn compare_numeric(a: &AxisKey, b: &AxisKey) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn align(series: &SeriesData, keys: &[AxisKey], cumulative: bool) -> Vec<f64> {
    let mut lookup: HashMap<&AxisKey, f64> = HashMap::with_capacity(series.keys.len());
    for (key, value) in series.keys.iter().zip(&series.values) {
        lookup.entry(key).or_insert(*value);
    }

    let mut previous: Option<f64> = None;
    keys.iter()
        .map(|key| match lookup.get(key) {
            Some(value) => {
                previous = Some(*value);
                *value
            }
            None if cumulative => previous.unwrap_or(0.0),
            None => 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date_str;

    fn series(keys: &[&str], values: &[f64]) -> SeriesData {
        SeriesData {
            keys: keys.iter().map(|k| AxisKey::from(*k)).collect(),
            values: values.to_vec(),
            dates: vec![None; keys.len()],
        }
    }

    #[test]
    fn test_merge_missing_keys() {
        let a = series(&["jan", "feb", "mar"], &[1.0, 2.0, 3.0]);
        let b = series(&["jan", "mar"], &[10.0, 30.0]);

        let merged = merge_series(&[a.clone(), b.clone()], Some(AxisValueType::String), false);
        assert_eq!(merged.x, vec![AxisKey::from("jan"), AxisKey::from("feb"), AxisKey::from("mar")]);
        assert_eq!(merged.y[1], vec![10.0, 0.0, 30.0]);

        let merged = merge_series(&[a, b], Some(AxisValueType::String), true);
        assert_eq!(merged.y[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(merged.y[1], vec![10.0, 10.0, 30.0]);
    }

    #[test]
    fn test_cumulative_fill_before_first_value() {
        let a = series(&["x", "y"], &[1.0, 2.0]);
        let b = series(&["y"], &[5.0]);
        let merged = merge_series(&[a, b], None, true);
        assert_eq!(merged.y[1], vec![0.0, 5.0]);
    }

    #[test]
    fn test_numeric_order() {
        let a = SeriesData {
            keys: vec![AxisKey::Number(10.0), AxisKey::Number(2.0)],
            values: vec![1.0, 2.0],
            dates: vec![None, None],
        };
        let b = SeriesData {
            keys: vec![AxisKey::Number(9.0)],
            values: vec![3.0],
            dates: vec![None],
        };
        let merged = merge_series(&[a, b], Some(AxisValueType::Number), false);
        assert_eq!(merged.x, vec![AxisKey::Number(2.0), AxisKey::Number(9.0), AxisKey::Number(10.0)]);
        assert_eq!(merged.y, vec![vec![2.0, 0.0, 1.0], vec![0.0, 3.0, 0.0]]);
    }

    #[test]
    fn test_date_order_not_lexicographic() {
        let date = |s: &str| parse_date_str(s);
        let a = SeriesData {
            keys: vec![AxisKey::from("Feb 1"), AxisKey::from("Mar 1")],
            values: vec![1.0, 2.0],
            dates: vec![date("2023-02-01"), date("2023-03-01")],
        };
        let b = SeriesData {
            keys: vec![AxisKey::from("Jan 1"), AxisKey::from("Mar 1")],
            values: vec![5.0, 6.0],
            dates: vec![date("2023-01-01"), date("2023-03-01")],
        };
        let merged = merge_series(&[a, b], Some(AxisValueType::Date), false);
        let labels: Vec<String> = merged.x.iter().map(|k| k.to_string()).collect();
        assert_eq!(labels, vec!["Jan 1", "Feb 1", "Mar 1"]);
        assert_eq!(merged.y[0], vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_empty() {
        let merged = merge_series(&[], None, false);
        assert!(merged.x.is_empty());
        assert!(merged.y.is_empty());
    }
}
