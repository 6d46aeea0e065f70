use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::data::fetch::DataFile;
use crate::data::table::{CaseTable, LocationRow};
use crate::foundation::error::SpreadResult;

/// The dataset variants that can be rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetVariant {
    /// Cumulative confirmed cases, as published.
    Confirmed,
    /// Confirmed minus recovered.
    Active,
    /// Cumulative deaths, as published.
    Deaths,
}

/// Per-variant output settings.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantConfig {
    /// Directory (relative to the frames root) receiving this variant's frames.
    pub frames_dir: PathBuf,
    /// Label drawn next to the running total.
    pub display_text: String,
    /// Marker area per case, in square points.
    pub scale_factor: f64,
}

impl DatasetVariant {
    /// Variants rendered when none are requested explicitly.
    pub const DEFAULT_SET: [DatasetVariant; 2] = [DatasetVariant::Confirmed, DatasetVariant::Active];

    /// Lowercase name used for directories and CLI values.
    pub fn name(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Active => "active",
            Self::Deaths => "deaths",
        }
    }

    /// Hard-coded output settings for this variant.
    pub fn config(self) -> VariantConfig {
        let display_text = match self {
            Self::Confirmed => "CONFIRMED",
            Self::Active => "ACTIVE",
            Self::Deaths => "DEATHS",
        };
        VariantConfig {
            frames_dir: Path::new("frames").join(self.name()),
            display_text: display_text.to_owned(),
            scale_factor: 0.1,
        }
    }
}

/// Load (or derive) the table for `variant` from the cached CSVs in `data_dir`.
pub fn load_variant(variant: DatasetVariant, data_dir: &Path) -> SpreadResult<CaseTable> {
    match variant {
        DatasetVariant::Confirmed => CaseTable::from_path(&DataFile::Confirmed.cached_path(data_dir)),
        DatasetVariant::Deaths => CaseTable::from_path(&DataFile::Deaths.cached_path(data_dir)),
        DatasetVariant::Active => {
            let confirmed = CaseTable::from_path(&DataFile::Confirmed.cached_path(data_dir))?;
            let recovered = CaseTable::from_path(&DataFile::Recovered.cached_path(data_dir))?;
            build_active(&confirmed, &recovered)
        }
    }
}

/// Subtract `recovered` from `confirmed`, aligned by location key and by date.
///
/// Rows and date columns follow `confirmed`. A location or date that `recovered` lacks subtracts
/// zero; recovered-only locations are dropped.
#[tracing::instrument(skip_all, fields(rows = confirmed.rows.len(), dates = confirmed.dates.len()))]
pub fn build_active(confirmed: &CaseTable, recovered: &CaseTable) -> SpreadResult<CaseTable> {
    let recovered_rows: HashMap<_, &LocationRow> = recovered
        .rows
        .iter()
        .map(|r| (r.key.align_key(), r))
        .collect();
    let recovered_cols: HashMap<_, usize> = recovered
        .dates
        .iter()
        .enumerate()
        .map(|(i, d)| (*d, i))
        .collect();

    // For each confirmed date column, the matching recovered column (if any).
    let col_map: Vec<Option<usize>> = confirmed
        .dates
        .iter()
        .map(|d| recovered_cols.get(d).copied())
        .collect();
    let missing_dates = col_map.iter().filter(|c| c.is_none()).count();
    if missing_dates > 0 {
        tracing::warn!(missing_dates, "recovered table lacks some confirmed dates; treating as 0");
    }

    let mut matched = 0usize;
    let rows = confirmed
        .rows
        .iter()
        .map(|row| {
            let rec = recovered_rows.get(&row.key.align_key());
            if rec.is_some() {
                matched += 1;
            }
            let counts = row
                .counts
                .iter()
                .zip(&col_map)
                .map(|(&c, col)| {
                    let r = match (rec, col) {
                        (Some(rec), Some(col)) => rec.counts.get(*col).copied().unwrap_or(0),
                        _ => 0,
                    };
                    c - r
                })
                .collect();
            LocationRow {
                key: row.key.clone(),
                counts,
            }
        })
        .collect();

    let dropped = recovered.rows.len().saturating_sub(matched);
    if dropped > 0 {
        tracing::warn!(dropped, "recovered rows without a confirmed location were dropped");
    }

    CaseTable::new(confirmed.dates.clone(), rows)
}

#[cfg(test)]
#[path = "../../tests/unit/data/dataset.rs"]
mod tests;
