// Library exports for axisgraph

pub mod error;
pub mod palette;
pub mod parser;
pub mod dates;
pub mod classify;

// Derivation stages
pub mod ir;
pub mod resolve;
pub mod filter;
pub mod format;
pub mod aggregate;
pub mod merge;
pub mod runtime;
pub mod compiler;
pub mod export;

pub use compiler::ChartConfiguration;
pub use error::AxisError;
pub use ir::{AxisData, AxisKey, ChartSpec, Dataset, DatasetSpec, Warning};
pub use runtime::{AxisChart, Derivation};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Derived axis data as JSON
    #[serde(rename = "json")]
    #[default]
    Json,
    /// One row per X key
    #[serde(rename = "csv")]
    Csv,
    /// Renderer configuration
    #[serde(rename = "chart")]
    Chart,
}

/// A chart together with its datasets, as read by the command-line tool
#[derive(Debug, Clone, Deserialize)]
pub struct ChartRequest {
    #[serde(default)]
    pub chart: ChartSpec,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}
