// CSV export of derived axis data

use crate::ir::AxisData;
use anyhow::{Context, Result};
use std::io::Write;

/// Write one row per X key: the key, then each series' value.
///
/// `headers` names the series columns; missing names fall back to `series_N`.
pub fn write_csv<W: Write>(data: &AxisData, headers: &[String], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header_row = vec!["x".to_string()];
    header_row.extend((0..data.y.len()).map(|i| {
        headers
            .get(i)
            .cloned()
            .unwrap_or_else(|| format!("series_{}", i + 1))
    }));
    writer
        .write_record(&header_row)
        .context("Failed to write CSV header")?;

    for (row, key) in data.x.iter().enumerate() {
        let mut record = vec![key.to_string()];
        record.extend(
            data.y
                .iter()
                .map(|series| series.get(row).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer
            .write_record(&record)
            .with_context(|| format!("Failed to write CSV row {}", row))?;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}
