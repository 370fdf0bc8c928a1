//! CSV export of per-mantra statistics.

use crate::{AppState, Mantra, Result};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct StatsRow<'a> {
    id: &'a str,
    name: &'a str,
    current_step: u32,
    today_count: u64,
    today_cycles: u64,
    lifetime_count: u64,
    lifetime_cycles: u64,
}

impl<'a> From<&'a Mantra> for StatsRow<'a> {
    fn from(mantra: &'a Mantra) -> Self {
        StatsRow {
            id: mantra.id.as_str(),
            name: &mantra.name,
            current_step: mantra.current_step,
            today_count: mantra.today_count,
            today_cycles: mantra.today_cycles,
            lifetime_count: mantra.lifetime_count,
            lifetime_cycles: mantra.lifetime_cycles,
        }
    }
}

/// Write one row per mantra, in list order, replacing any existing file
///
/// Returns the number of rows written. Headers are written even when there
/// are no mantras.
pub fn write_stats_csv(state: &AppState, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record([
        "id",
        "name",
        "current_step",
        "today_count",
        "today_cycles",
        "lifetime_count",
        "lifetime_cycles",
    ])?;
    for mantra in &state.mantras {
        writer.serialize(StatsRow::from(mantra))?;
    }

    writer.flush()?;
    tracing::info!("Exported {} mantras to {:?}", state.mantras.len(), path);
    Ok(state.mantras.len())
}
