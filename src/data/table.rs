use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::Context as _;
use chrono::NaiveDate;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SpreadError, SpreadResult};

/// Number of leading location columns (`Province/State, Country/Region, Lat, Long`).
pub const KEY_COLUMNS: usize = 4;

/// Header date format used by the upstream time-series tables (`1/22/20`).
pub const DATE_HEADER_FORMAT: &str = "%m/%d/%y";

/// Identity of one table row.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LocationKey {
    /// Province or state; empty for country-level rows.
    pub province: String,
    /// Country or region.
    pub country: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl LocationKey {
    /// Hashable form used to align rows between tables.
    pub(crate) fn align_key(&self) -> (String, String, u64, u64) {
        (
            self.province.clone(),
            self.country.clone(),
            self.lat.to_bits(),
            self.lon.to_bits(),
        )
    }
}

/// One location with its cumulative count per date column.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationRow {
    /// Location identity.
    pub key: LocationKey,
    /// One count per date column; same length as [`CaseTable::dates`].
    pub counts: Vec<i64>,
}

/// Country-level total used by the ranked table.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RankedEntry {
    /// Country or region name.
    pub country: String,
    /// Summed count for the requested date column.
    pub count: i64,
}

/// Daily cumulative counts per location, one column per date.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaseTable {
    /// Date of each count column, in table order.
    pub dates: Vec<NaiveDate>,
    /// Location rows in table order.
    pub rows: Vec<LocationRow>,
}

impl CaseTable {
    /// Build a table, checking that every row has one count per date.
    pub fn new(dates: Vec<NaiveDate>, rows: Vec<LocationRow>) -> SpreadResult<Self> {
        if let Some(bad) = rows.iter().find(|r| r.counts.len() != dates.len()) {
            return Err(SpreadError::data(format!(
                "row '{}/{}' has {} counts for {} dates",
                bad.key.province,
                bad.key.country,
                bad.counts.len(),
                dates.len()
            )));
        }
        Ok(Self { dates, rows })
    }

    /// Load a table from a CSV file on disk.
    pub fn from_path(path: &Path) -> SpreadResult<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open case table '{}'", path.display()))?;
        Self::from_reader(f)
    }

    /// Parse a table from CSV bytes.
    pub fn from_reader(r: impl Read) -> SpreadResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(r);

        let headers = rdr.headers().context("read csv header")?.clone();
        if headers.len() < KEY_COLUMNS {
            return Err(SpreadError::data(format!(
                "expected at least {KEY_COLUMNS} columns, found {}",
                headers.len()
            )));
        }
        let dates = headers
            .iter()
            .skip(KEY_COLUMNS)
            .map(parse_date_header)
            .collect::<SpreadResult<Vec<_>>>()?;

        let mut rows = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("read csv record {}", line + 1))?;
            let field = |i: usize| record.get(i).unwrap_or("").trim();

            let key = LocationKey {
                province: field(0).to_owned(),
                country: field(1).to_owned(),
                lat: parse_coord(field(2))?,
                lon: parse_coord(field(3))?,
            };
            let counts = (0..dates.len())
                .map(|d| parse_count(field(KEY_COLUMNS + d)))
                .collect::<SpreadResult<Vec<_>>>()?;
            rows.push(LocationRow { key, counts });
        }

        Ok(Self { dates, rows })
    }

    /// Number of date columns (and therefore frames).
    pub fn len_dates(&self) -> usize {
        self.dates.len()
    }

    /// Date shown by frame `idx`.
    pub fn date_at(&self, idx: FrameIndex) -> SpreadResult<NaiveDate> {
        self.dates.get(idx.as_usize()).copied().ok_or_else(|| {
            SpreadError::validation(format!(
                "frame {} is outside the {} date columns",
                idx.0,
                self.dates.len()
            ))
        })
    }

    /// Sum of one date column over every row.
    pub fn column_total(&self, idx: FrameIndex) -> i64 {
        let d = idx.as_usize();
        self.rows
            .iter()
            .filter_map(|r| r.counts.get(d))
            .sum()
    }

    /// Top `n` countries for one date column, summed over their provinces.
    ///
    /// Sorted by count descending; ties keep ascending country-name order.
    pub fn top_countries(&self, idx: FrameIndex, n: usize) -> Vec<RankedEntry> {
        let d = idx.as_usize();
        let mut by_country = BTreeMap::<&str, i64>::new();
        for row in &self.rows {
            let count = row.counts.get(d).copied().unwrap_or(0);
            *by_country.entry(row.key.country.as_str()).or_default() += count;
        }

        let mut ranked: Vec<RankedEntry> = by_country
            .into_iter()
            .map(|(country, count)| RankedEntry {
                country: country.to_owned(),
                count,
            })
            .collect();
        // Stable sort keeps the BTreeMap's name order among equal counts.
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }
}

fn parse_date_header(h: &str) -> SpreadResult<NaiveDate> {
    NaiveDate::parse_from_str(h.trim(), DATE_HEADER_FORMAT)
        .map_err(|e| SpreadError::data(format!("invalid date column header \"{h}\": {e}")))
}

fn parse_coord(s: &str) -> SpreadResult<f64> {
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse::<f64>()
        .map_err(|_| SpreadError::data(format!("invalid coordinate \"{s}\"")))
}

fn parse_count(s: &str) -> SpreadResult<i64> {
    if s.is_empty() {
        return Ok(0);
    }
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v.round() as i64),
        Ok(_) => Ok(0),
        Err(_) => Err(SpreadError::data(format!("invalid case count \"{s}\""))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/table.rs"]
mod tests;
