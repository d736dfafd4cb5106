// src/export.rs

use crate::pipeline::FlatRow;
use tracing::info;

/// Column order expected by the downstream spreadsheet consumers.
const COLUMNS: [&str; 7] = [
    "document_id",
    "date",
    "submitter",
    "department",
    "item_name",
    "item_amount",
    "total_amount",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to render spreadsheet: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to render spreadsheet: {0}")]
    Io(#[from] std::io::Error),
}

/// Render the flat rows as a CSV spreadsheet. The header is written even
/// when there are no rows, so an empty export is still a readable file.
pub fn render_csv(rows: &[FlatRow]) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut buf);
        writer.write_record(COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    info!(rows = rows.len(), bytes = buf.len(), "Spreadsheet rendered");
    Ok(buf)
}
