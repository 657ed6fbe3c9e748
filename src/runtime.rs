// Runtime executor: runs every dataset through the stage pipeline and merges

use crate::aggregate::aggregate;
use crate::classify::{classify_axis, AxisValueType};
use crate::compiler::{build_configuration, ChartConfiguration};
use crate::dates::{DateFormat, DateWindow};
use crate::filter::{date_window_conditions, filter_records};
use crate::format::format_axis;
use crate::ir::{AxisData, ChartSpec, Dataset, RunContext, SeriesData, Warning};
use crate::merge::merge_series;
use crate::parser::parse_path_expr;
use crate::resolve::resolve_points;
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};

/// Everything a derivation run produces
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub axis_data: AxisData,
    /// Type of the first typed X axis, which decided the merge ordering
    pub x_type: Option<AxisValueType>,
    pub date_format: Option<DateFormat>,
    pub warnings: Vec<Warning>,
}

/// Derivation entry point for one chart and its datasets
#[derive(Debug, Clone)]
pub struct AxisChart<'a> {
    chart: &'a ChartSpec,
    datasets: &'a [Dataset],
    now: NaiveDateTime,
}

impl<'a> AxisChart<'a> {
    pub fn new(chart: &'a ChartSpec, datasets: &'a [Dataset]) -> Self {
        Self::with_now(chart, datasets, Utc::now().naive_utc())
    }

    /// Pin the clock used by rolling date windows
    pub fn with_now(chart: &'a ChartSpec, datasets: &'a [Dataset], now: NaiveDateTime) -> Self {
        Self {
            chart,
            datasets,
            now,
        }
    }

    /// Run filter, resolve, format and aggregate per dataset, then merge.
    ///
    /// Any failing dataset aborts the whole run.
    pub fn derive(&self) -> Result<Derivation> {
        let mut ctx = RunContext::new(self.now);
        let window = self.date_window()?;

        let mut series: Vec<SeriesData> = Vec::with_capacity(self.datasets.len());
        let mut x_type = None;
        for (idx, dataset) in self.datasets.iter().enumerate() {
            let (s, t) = self
                .derive_dataset(idx, dataset, window, &mut ctx)
                .with_context(|| format!("Failed to derive dataset {}", idx))?;
            x_type = x_type.or(t);
            series.push(s);
        }

        let axis_data = merge_series(&series, x_type, self.chart.is_cumulative());
        tracing::debug!(
            datasets = series.len(),
            keys = axis_data.x.len(),
            warnings = ctx.warnings.len(),
            "axis data derived"
        );

        Ok(Derivation {
            axis_data,
            x_type,
            date_format: ctx.date_format,
            warnings: ctx.warnings,
        })
    }

    /// Axis data, reusing the chart's cached output when processing is skipped
    pub fn axis_data(&self, skip_data_processing: bool) -> Result<AxisData> {
        if skip_data_processing {
            if let Some(cached) = self.cached_axis_data() {
                tracing::debug!("reusing cached chart data");
                return Ok(cached);
            }
        }
        Ok(self.derive()?.axis_data)
    }

    /// Chart configuration for the renderer
    pub fn plot(&self, skip_data_processing: bool) -> Result<ChartConfiguration> {
        let axis_data = self.axis_data(skip_data_processing)?;
        Ok(build_configuration(self.chart, self.datasets, &axis_data))
    }

    /// The active date window. Only applies when every dataset names a date field
    /// and the chart has both bounds.
    fn date_window(&self) -> Result<Option<DateWindow>> {
        let every_dated = !self.datasets.is_empty()
            && self.datasets.iter().all(|d| d.options.date_field.is_some());
        if !every_dated {
            return Ok(None);
        }
        let bounds = self.chart.date_bounds().context("Failed to read chart date range")?;
        Ok(bounds.map(|(start, end)| {
            DateWindow::resolve(start, end, self.chart.current_end_date, self.now)
        }))
    }

    fn derive_dataset(
        &self,
        idx: usize,
        dataset: &Dataset,
        window: Option<DateWindow>,
        ctx: &mut RunContext,
    ) -> Result<(SeriesData, Option<AxisValueType>)> {
        let options = &dataset.options;
        let x_path = parse_path_expr(&options.x_axis)?;
        let y_path = parse_path_expr(&options.y_axis)?;

        let mut data = filter_records(&dataset.data, &x_path, &options.conditions, ctx, idx)?;
        if let (Some(window), Some(date_field)) = (window, &options.date_field) {
            let date_path = parse_path_expr(date_field)?;
            let conditions = date_window_conditions(date_field, &window);
            data = filter_records(&data, &date_path, &conditions, ctx, idx)?;
        }

        let points = resolve_points(&data, &x_path, &y_path)?;
        let x_type = classify_axis(points.iter().map(|p| &p.x));
        let axis = format_axis(&points, x_type, self.chart, window, ctx);
        let series = aggregate(
            &axis,
            &points,
            options.y_axis_operation,
            self.chart.is_cumulative(),
            ctx,
            idx,
        );

        tracing::debug!(
            dataset = idx,
            points = points.len(),
            ?x_type,
            keys = series.keys.len(),
            "dataset derived"
        );
        Ok((series, x_type))
    }

    fn cached_axis_data(&self) -> Option<AxisData> {
        let cached = self.chart.chart_data.as_ref()?.data.as_ref()?;
        let labels = cached.labels.clone()?;
        let datasets = cached.datasets.as_ref()?;
        Some(AxisData {
            x: labels,
            y: datasets.iter().map(|d| d.data.clone()).collect(),
        })
    }
}
