use super::project::Projection;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// One exported line, in the currency and order of the current view.
#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    price: f64,
    portfolio_value: f64,
    market_cap: f64,
    change_pct: f64,
    market_cap_ratio: Option<f64>,
    zone: &'a str,
    currency: &'a str,
}

pub fn write_csv<W: Write>(projection: &Projection, writer: W) -> Result<()> {
    let currency = projection.table.currency();
    let mut csv_writer = csv::Writer::from_writer(writer);

    for row in projection.table.rows() {
        csv_writer.serialize(ExportRecord {
            price: row.price,
            portfolio_value: row.portfolio_value,
            market_cap: row.market_cap,
            change_pct: row.pct_change_from_base * 100.0,
            market_cap_ratio: row.market_cap_ratio,
            zone: row.zone.as_str(),
            currency: currency.code(),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the CSV next to `path` first and moves it into place once
/// complete, so a failed export never leaves a partial file.
pub fn export_to_path<P: AsRef<Path>>(projection: &Projection, path: P) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_csv(projection, staging.as_file_mut())
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;
    staging
        .persist(path)
        .with_context(|| format!("Failed to move export file into place: {}", path.display()))?;

    info!(
        rows = projection.table.len(),
        path = %path.display(),
        "Exported projection"
    );
    Ok(())
}
