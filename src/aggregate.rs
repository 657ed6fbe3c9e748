// Y-axis aggregation: one value per distinct X key

use crate::classify::{classify_values, AxisValueType};
use crate::ir::{
    AxisKey, AxisPoint, FilteredValue, FormattedAxis, RunContext, SeriesData, WarningKind,
    YAxisOperation,
};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde_json::Value;

/// Accumulator for one X key
#[derive(Debug, Clone, Default)]
struct KeyAccumulator {
    date: Option<NaiveDateTime>,
    count: usize,
    sum: f64,
    numeric: usize,
    first: Option<f64>,
}

/// Reduce Y values per formatted X key.
///
/// Keys keep their first-seen order. Synthesized time buckets create keys but
/// contribute nothing, so empty buckets come out as zero. With `cumulative`
/// the reduced values are replaced by their running total; this is the only
/// place a series is accumulated.
pub fn aggregate(
    axis: &FormattedAxis,
    points: &[AxisPoint],
    operation: YAxisOperation,
    cumulative: bool,
    ctx: &mut RunContext,
    dataset: usize,
) -> SeriesData {
    let y_type = classify_values(points.iter().map(|p| &p.y));
    let operation = effective_operation(operation, y_type, ctx, dataset);

    let mut groups: IndexMap<AxisKey, KeyAccumulator> = IndexMap::new();
    let mut unreadable = 0;

    for ((key, filtered), source) in axis.formatted.iter().zip(&axis.filtered).zip(&axis.source) {
        let acc = groups.entry(key.clone()).or_default();
        if let FilteredValue::Date(Some(date)) = filtered {
            if acc.date.map_or(true, |d| *date < d) {
                acc.date = Some(*date);
            }
        }

        let Some(idx) = source else { continue };
        let y = &points[*idx].y;
        acc.count += 1;

        match operation {
            YAxisOperation::Sum | YAxisOperation::Avg => {
                if let Some(n) = y.as_f64() {
                    acc.sum += n;
                    acc.numeric += 1;
                }
            }
            YAxisOperation::None => {
                if acc.first.is_none() {
                    let value = y_as_number(y).unwrap_or_else(|| {
                        unreadable += 1;
                        0.0
                    });
                    acc.first = Some(value);
                }
            }
            YAxisOperation::Count => {}
        }
    }

    if unreadable > 0 {
        ctx.warn(
            dataset,
            WarningKind::NonNumericValue,
            format!("{} Y value(s) are not numbers and were plotted as 0", unreadable),
        );
    }

    let mut series = SeriesData::default();
    for (key, acc) in groups {
        let value = match operation {
            YAxisOperation::Count => acc.count as f64,
            YAxisOperation::Sum => acc.sum,
            YAxisOperation::Avg if acc.numeric == 0 => 0.0,
            YAxisOperation::Avg => round_average(acc.sum / acc.numeric as f64),
            YAxisOperation::None => acc.first.unwrap_or(0.0),
        };
        series.keys.push(key);
        series.values.push(value);
        series.dates.push(acc.date);
    }

    if cumulative {
        running_total(&mut series.values);
    }

    tracing::debug!(dataset, ?operation, keys = series.keys.len(), "series aggregated");
    series
}

/// sum/avg need numeric Y values; anything else is counted instead
fn effective_operation(
    requested: YAxisOperation,
    y_type: Option<AxisValueType>,
    ctx: &mut RunContext,
    dataset: usize,
) -> YAxisOperation {
    match (requested, y_type) {
        (YAxisOperation::Sum | YAxisOperation::Avg, Some(t)) if !t.is_number() => {
            ctx.warn(
                dataset,
                WarningKind::DegradedToCount,
                format!("{:?} requested over {:?} Y values; counting instead", requested, t),
            );
            YAxisOperation::Count
        }
        _ => requested,
    }
}

fn y_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Two decimals, but only when the average is not a whole number
pub fn round_average(value: f64) -> f64 {
    if value.fract() == 0.0 {
        value
    } else {
        (value * 100.0).round() / 100.0
    }
}

/// In-place prefix sum
pub fn running_total(values: &mut [f64]) {
    let mut total = 0.0;
    for v in values.iter_mut() {
        total += *v;
        *v = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_axis;
    use crate::dates::parse_date_str;
    use crate::format::format_axis;
    use crate::ir::ChartSpec;
    use serde_json::json;

    fn ctx() -> RunContext {
        RunContext::new(parse_date_str("2023-06-01").unwrap())
    }

    fn pts(pairs: &[(Value, Value)]) -> Vec<AxisPoint> {
        pairs
            .iter()
            .map(|(x, y)| AxisPoint { x: x.clone(), y: y.clone() })
            .collect()
    }

    fn run(points: &[AxisPoint], chart: &ChartSpec, op: YAxisOperation, ctx: &mut RunContext) -> SeriesData {
        let x_type = classify_axis(points.iter().map(|p| &p.x));
        let axis = format_axis(points, x_type, chart, None, ctx);
        aggregate(&axis, points, op, chart.is_cumulative(), ctx, 0)
    }

    #[test]
    fn test_count() {
        let points = pts(&[(json!("a"), json!(5)), (json!("a"), json!(1)), (json!("b"), json!(2))]);
        let series = run(&points, &ChartSpec::default(), YAxisOperation::Count, &mut ctx());
        assert_eq!(series.keys, vec![AxisKey::from("a"), AxisKey::from("b")]);
        assert_eq!(series.values, vec![2.0, 1.0]);
    }

    #[test]
    fn test_sum() {
        let points = pts(&[(json!("a"), json!(5)), (json!("b"), json!(2)), (json!("a"), json!(1.5))]);
        let series = run(&points, &ChartSpec::default(), YAxisOperation::Sum, &mut ctx());
        assert_eq!(series.values, vec![6.5, 2.0]);
    }

    #[test]
    fn test_average_rounding() {
        let points = pts(&[(json!("k"), json!(1)), (json!("k"), json!(2))]);
        let series = run(&points, &ChartSpec::default(), YAxisOperation::Avg, &mut ctx());
        assert_eq!(series.values, vec![1.5]);

        let points = pts(&[(json!("k"), json!(1)), (json!("k"), json!(1)), (json!("k"), json!(2))]);
        let series = run(&points, &ChartSpec::default(), YAxisOperation::Avg, &mut ctx());
        assert_eq!(series.values, vec![1.33]);

        let points = pts(&[(json!("k"), json!(2)), (json!("k"), json!(4))]);
        let series = run(&points, &ChartSpec::default(), YAxisOperation::Avg, &mut ctx());
        assert_eq!(series.values, vec![3.0]);
    }

    #[test]
    fn test_none_keeps_first_value_per_key() {
        let points = pts(&[(json!(1), json!("7")), (json!(2), json!(true)), (json!(1), json!(9))]);
        let series = run(&points, &ChartSpec::default(), YAxisOperation::None, &mut ctx());
        assert_eq!(series.values, vec![7.0, 1.0]);
    }

    #[test]
    fn test_none_unreadable_values_warn() {
        let mut ctx = ctx();
        let points = pts(&[(json!("a"), json!({"nested": 1})), (json!("b"), json!(3))]);
        let series = run(&points, &ChartSpec::default(), YAxisOperation::None, &mut ctx);
        assert_eq!(series.values, vec![0.0, 3.0]);
        assert_eq!(ctx.warnings[0].kind, WarningKind::NonNumericValue);
    }

    #[test]
    fn test_sum_degrades_to_count() {
        let mut ctx = ctx();
        let points = pts(&[(json!("a"), json!("x")), (json!("a"), json!("y")), (json!("b"), json!("z"))]);
        let series = run(&points, &ChartSpec::default(), YAxisOperation::Sum, &mut ctx);
        assert_eq!(series.values, vec![2.0, 1.0]);
        assert_eq!(ctx.warnings.len(), 1);
        assert_eq!(ctx.warnings[0].kind, WarningKind::DegradedToCount);
    }

    #[test]
    fn test_cumulative() {
        let chart = ChartSpec {
            sub_type: "lcAddTimeseries".to_string(),
            ..Default::default()
        };
        let points = pts(&[(json!("a"), json!(1)), (json!("b"), json!(2)), (json!("c"), json!(3))]);
        let series = run(&points, &chart, YAxisOperation::Sum, &mut ctx());
        assert_eq!(series.values, vec![1.0, 3.0, 6.0]);
    }

    #[test]
    fn test_count_with_zero_buckets() {
        let chart = ChartSpec {
            include_zeros: true,
            ..Default::default()
        };
        let points = pts(&[
            (json!("2023-01-01"), Value::Null),
            (json!("2023-01-01T05:00:00"), Value::Null),
            (json!("2023-01-03"), Value::Null),
        ]);
        let series = run(&points, &chart, YAxisOperation::Count, &mut ctx());
        assert_eq!(series.values, vec![2.0, 0.0, 1.0]);
        assert_eq!(series.dates[1], parse_date_str("2023-01-02"));
    }

    #[test]
    fn test_cumulative_gap_carries_total() {
        let chart = ChartSpec {
            include_zeros: true,
            sub_type: "AddTimeseries".to_string(),
            ..Default::default()
        };
        let points = pts(&[(json!("2023-01-01"), json!(4)), (json!("2023-01-03"), json!(1))]);
        let series = run(&points, &chart, YAxisOperation::None, &mut ctx());
        assert_eq!(series.values, vec![4.0, 4.0, 5.0]);
    }

    #[test]
    fn test_sum_and_avg_over_large_integers() {
        let mut ctx = ctx();
        let points = pts(&[
            (json!("a"), json!(1500000000)),
            (json!("a"), json!(1500000000)),
            (json!("b"), json!(2500000000_i64)),
        ]);
        let series = run(&points, &ChartSpec::default(), YAxisOperation::Sum, &mut ctx);
        assert_eq!(series.values, vec![3e9, 2.5e9]);

        let points = pts(&[(json!("k"), json!(1000000000)), (json!("k"), json!(3000000000_i64))]);
        let series = run(&points, &ChartSpec::default(), YAxisOperation::Avg, &mut ctx);
        assert_eq!(series.values, vec![2e9]);
        assert!(ctx.warnings.is_empty());
    }
}
