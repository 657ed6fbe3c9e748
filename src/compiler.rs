// Chart-type adapter: wraps derived axis data into a renderer configuration

use crate::ir::{AxisData, AxisKey, ChartSpec, ChartType, Dataset};
use crate::palette::ColorPalette;
use serde::Serialize;
use serde_json::Value;

/// Chart.js-shaped configuration consumed by the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfiguration {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub data: ConfigData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigData {
    pub labels: Vec<AxisKey>,
    pub datasets: Vec<ConfigDataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDataset {
    pub label: String,
    pub data: Vec<f64>,
    pub border_color: String,
    /// A single colour for line/bar, one colour per label for pie
    pub background_color: Value,
    pub fill: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_radius: Option<u32>,
}

/// Build the configuration for `chart`. Series are matched to datasets by position.
pub fn build_configuration(
    chart: &ChartSpec,
    datasets: &[Dataset],
    axis_data: &AxisData,
) -> ChartConfiguration {
    let palette = ColorPalette::category10();

    let configs = datasets
        .iter()
        .enumerate()
        .map(|(idx, dataset)| {
            let options = &dataset.options;
            let color = options
                .dataset_color
                .clone()
                .unwrap_or_else(|| palette.color(idx));

            let background_color = match (chart.chart_type, &options.fill_color) {
                (ChartType::Pie, Some(Value::Array(colors))) => Value::Array(colors.clone()),
                (ChartType::Pie, _) => Value::from(palette.take(axis_data.x.len())),
                (_, Some(Value::String(fill))) => Value::String(fill.clone()),
                _ => Value::String(color.clone()),
            };

            ConfigDataset {
                label: options
                    .legend
                    .clone()
                    .unwrap_or_else(|| format!("Dataset {}", idx + 1)),
                data: axis_data.y.get(idx).cloned().unwrap_or_default(),
                border_color: color,
                background_color,
                fill: options.fill,
                point_radius: match chart.chart_type {
                    ChartType::Line => options.point_radius,
                    _ => None,
                },
            }
        })
        .collect();

    ChartConfiguration {
        chart_type: chart.chart_type,
        data: ConfigData {
            labels: axis_data.x.clone(),
            datasets: configs,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DatasetSpec;
    use serde_json::json;

    fn dataset(legend: Option<&str>, color: Option<&str>) -> Dataset {
        Dataset {
            options: DatasetSpec {
                x_axis: "root[].x".to_string(),
                y_axis: "root[].y".to_string(),
                legend: legend.map(str::to_string),
                dataset_color: color.map(str::to_string),
                point_radius: Some(3),
                ..Default::default()
            },
            data: json!([]),
        }
    }

    fn axis() -> AxisData {
        AxisData {
            x: vec![AxisKey::from("a"), AxisKey::from("b")],
            y: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        }
    }

    #[test]
    fn test_line_configuration() {
        let chart = ChartSpec::default();
        let datasets = vec![dataset(Some("Revenue"), Some("#000000")), dataset(None, None)];
        let config = build_configuration(&chart, &datasets, &axis());

        assert_eq!(config.data.labels.len(), 2);
        assert_eq!(config.data.datasets[0].label, "Revenue");
        assert_eq!(config.data.datasets[0].border_color, "#000000");
        assert_eq!(config.data.datasets[1].label, "Dataset 2");
        assert_eq!(config.data.datasets[1].border_color, "#ff7f0e");
        assert_eq!(config.data.datasets[1].data, vec![3.0, 4.0]);
        assert_eq!(config.data.datasets[0].point_radius, Some(3));
    }

    #[test]
    fn test_pie_colours_per_label() {
        let chart = ChartSpec {
            chart_type: ChartType::Pie,
            ..Default::default()
        };
        let config = build_configuration(&chart, &[dataset(None, None)], &axis());
        assert_eq!(config.data.datasets[0].background_color, json!(["#1f77b4", "#ff7f0e"]));
        assert_eq!(config.data.datasets[0].point_radius, None);

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["type"], json!("pie"));
        assert!(value["data"]["datasets"][0].get("pointRadius").is_none());
    }
}
