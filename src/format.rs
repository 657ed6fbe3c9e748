// Per-axis formatting: turns raw X values into comparable and display forms

use crate::classify::AxisValueType;
use crate::dates::{value_to_date, DateFormat, DateWindow, TimeInterval};
use crate::ir::{AxisKey, AxisPoint, ChartSpec, FilteredValue, FormattedAxis, RunContext};
use chrono::NaiveDateTime;

/// Format the X side of `points` according to the axis type.
///
/// `window` is the active date range, if the chart filters by date; it bounds
/// gap-filling when `include_zeros` is set.
pub fn format_axis(
    points: &[AxisPoint],
    x_type: Option<AxisValueType>,
    chart: &ChartSpec,
    window: Option<DateWindow>,
    ctx: &mut RunContext,
) -> FormattedAxis {
    match x_type {
        Some(AxisValueType::Date) => {
            format_dates(points, chart.time_interval, chart.include_zeros, window, ctx)
        }
        // numbers, strings, booleans, objects and arrays are their own keys
        _ => format_identity(points),
    }
}

fn format_identity(points: &[AxisPoint]) -> FormattedAxis {
    let mut axis = FormattedAxis::default();
    for (idx, point) in points.iter().enumerate() {
        axis.push(
            FilteredValue::Plain(point.x.clone()),
            AxisKey::from_value(&point.x),
            Some(idx),
        );
    }
    axis
}

/// Sort by date, optionally fill empty buckets, and label every slot with the
/// run's date format applied to its bucket start.
fn format_dates(
    points: &[AxisPoint],
    interval: TimeInterval,
    include_zeros: bool,
    window: Option<DateWindow>,
    ctx: &mut RunContext,
) -> FormattedAxis {
    let mut dated: Vec<(usize, Option<NaiveDateTime>)> = points
        .iter()
        .enumerate()
        .map(|(idx, p)| (idx, value_to_date(&p.x)))
        .collect();
    // stable; invalid dates (None) sort first
    dated.sort_by_key(|(_, date)| *date);

    let slots = if include_zeros {
        fill_buckets(&dated, interval, window)
    } else {
        dated
            .into_iter()
            .map(|(idx, date)| (Some(idx), date))
            .collect()
    };

    let first = slots.iter().find_map(|(_, d)| *d);
    let last = slots.iter().rev().find_map(|(_, d)| *d);
    let format = match ctx.date_format {
        Some(format) => format,
        None => {
            let format = DateFormat::select(interval, first, last);
            if first.is_some() {
                tracing::debug!(pattern = format.pattern(), "date format selected");
                ctx.date_format = Some(format);
            }
            format
        }
    };

    let mut axis = FormattedAxis::default();
    for (source, date) in slots {
        let key = AxisKey::Text(format.render(date.map(|d| interval.floor(d))));
        axis.push(FilteredValue::Date(date), key, source);
    }
    axis
}

/// One placeholder per bucket between the window bounds (or the data extent),
/// each followed by the points that fall in it. Points outside the range and
/// invalid dates are left out.
fn fill_buckets(
    dated: &[(usize, Option<NaiveDateTime>)],
    interval: TimeInterval,
    window: Option<DateWindow>,
) -> Vec<(Option<usize>, Option<NaiveDateTime>)> {
    let valid: Vec<(usize, NaiveDateTime)> = dated
        .iter()
        .filter_map(|(idx, date)| date.map(|d| (*idx, d)))
        .collect();

    let bounds = match window {
        Some(w) => Some((w.start, w.end)),
        None => match (valid.first(), valid.last()) {
            (Some(first), Some(last)) => Some((first.1, last.1)),
            _ => None,
        },
    };
    let Some((start, end)) = bounds else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut cursor = 0;
    for bucket in interval.buckets(start, end) {
        slots.push((None, Some(bucket)));
        let next = interval.advance(bucket);
        while cursor < valid.len() && valid[cursor].1 < bucket {
            cursor += 1;
        }
        while cursor < valid.len() && valid[cursor].1 < next {
            slots.push((Some(valid[cursor].0), Some(valid[cursor].1)));
            cursor += 1;
        }
    }
    slots
}
