use anyhow::{Context, Result};
use axisgraph::dates::parse_date_str;
use axisgraph::export::write_csv;
use axisgraph::{AxisChart, ChartRequest, OutputFormat};
use chrono::{NaiveDateTime, Utc};
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "axisgraph")]
#[command(about = "Derive aligned chart axis data from JSON datasets", long_about = None)]
struct Args {
    /// Request document ({"chart": ..., "datasets": [...]}); reads stdin when omitted
    input: Option<PathBuf>,

    /// What to write to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Clock for rolling date windows (e.g. 2023-06-01T12:00:00)
    #[arg(long)]
    now: Option<String>,

    /// Reuse the chart's cached data instead of deriving
    #[arg(long)]
    skip_processing: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("axisgraph=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let raw = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };
    let request: ChartRequest =
        serde_json::from_str(&raw).context("Failed to parse chart request")?;

    let now = match &args.now {
        Some(s) => parse_now(s)?,
        None => Utc::now().naive_utc(),
    };
    let chart = AxisChart::with_now(&request.chart, &request.datasets, now);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match args.format {
        OutputFormat::Json => {
            let data = chart.axis_data(args.skip_processing)?;
            serde_json::to_writer_pretty(&mut handle, &data)
                .context("Failed to write axis data")?;
            writeln!(handle)?;
        }
        OutputFormat::Csv => {
            let data = chart.axis_data(args.skip_processing)?;
            let headers: Vec<String> = request
                .datasets
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    d.options
                        .legend
                        .clone()
                        .unwrap_or_else(|| format!("series_{}", i + 1))
                })
                .collect();
            write_csv(&data, &headers, &mut handle)?;
        }
        OutputFormat::Chart => {
            let config = chart.plot(args.skip_processing)?;
            serde_json::to_writer_pretty(&mut handle, &config)
                .context("Failed to write chart configuration")?;
            writeln!(handle)?;
        }
    }
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn parse_now(raw: &str) -> Result<NaiveDateTime> {
    parse_date_str(raw).with_context(|| format!("Cannot parse --now value '{}'", raw))
}
