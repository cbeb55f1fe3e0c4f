use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::rows::{ResultRow, COLUMNS};

/// Export filename, tagged with the page label and the run date.
pub fn export_filename(page_label: &str) -> String {
    format!(
        "carrousels_cards_url_{}_{}.csv",
        page_label,
        Local::now().format("%Y-%m-%d")
    )
}

/// Write the rows to a semicolon-delimited CSV under `out_dir`, creating the
/// directory when needed. Returns the path of the written file.
pub fn write_csv(rows: &[ResultRow], out_dir: &Path, page_label: &str) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let path = out_dir.join(export_filename(page_label));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}

// ── Tests ──
