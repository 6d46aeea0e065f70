use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::data::dataset::VariantConfig;
use crate::data::table::{CaseTable, RankedEntry};
use crate::foundation::core::{Canvas, FrameIndex, Point, Rgba8};
use crate::foundation::error::SpreadResult;
use crate::map::projection::MercatorProjection;
use crate::render::svg_raster::{PREFERRED_FONT_FAMILY, escape_xml};

/// Annotation placement and colors. Positions are geographic anchors (degrees) so the layout
/// follows the map when the canvas size changes.
#[derive(Clone, Debug, PartialEq)]
pub struct MapStyle {
    /// Marker fill, including opacity.
    pub marker: Rgba8,
    /// Date and table text color.
    pub text: Rgba8,
    /// Variant label and total color.
    pub accent: Rgba8,
    /// Resolution used to turn point sizes into pixels.
    pub dpi: f64,
    /// Base headline size in points.
    pub headline_pt: f64,
    /// Ranked table size in points.
    pub table_pt: f64,
    /// Rows in the ranked table.
    pub top_n: usize,
    /// Anchor `(lon, lat)` of the date text.
    pub date_anchor: (f64, f64),
    /// Longitude distance from the date to the counter; the total starts at 1.7x this.
    pub counter_spacing: f64,
    /// Longitude gap between the right edge of the variant label and the total.
    pub label_gap: f64,
    /// Anchor `(lon, lat)` of the right edge of the country column; the last row sits on it.
    pub table_anchor: (f64, f64),
    /// Longitude distance from the country column to the right edge of the count column.
    pub table_count_offset: f64,
    /// Line height as a multiple of the font size.
    pub line_spacing: f64,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            marker: Rgba8::rgb(0xff, 0x66, 0x00).with_opacity(0.8),
            text: Rgba8::rgb(0xff, 0xff, 0xff),
            accent: Rgba8::rgb(0xff, 0x66, 0x00),
            dpi: 100.0,
            headline_pt: 28.0,
            table_pt: 12.0,
            top_n: 10,
            date_anchor: (-53.0, -50.0),
            counter_spacing: 65.0,
            label_gap: 4.0,
            table_anchor: (-140.0, -60.0),
            table_count_offset: 15.0,
            line_spacing: 1.2,
        }
    }
}

impl MapStyle {
    /// Convert a size in points to pixels.
    pub fn pt_to_px(&self, pt: f64) -> f64 {
        pt * self.dpi / 72.0
    }

    /// Marker radius in pixels. The marker's area in square points is `count * scale_factor`.
    pub fn marker_radius_px(&self, count: i64, scale_factor: f64) -> f64 {
        let area_pt2 = (count.max(0) as f64) * scale_factor.max(0.0);
        self.pt_to_px(area_pt2.sqrt()) / 2.0
    }
}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    /// Text starts at the anchor.
    Start,
    /// Text ends at the anchor.
    End,
}

/// One circle marker in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    /// Centre in pixels.
    pub center: Point,
    /// Radius in pixels.
    pub radius: f64,
}

/// One positioned line of text; `pos` is the baseline anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    /// Baseline anchor in pixels.
    pub pos: Point,
    /// Content (unescaped).
    pub text: String,
    /// Font size in pixels.
    pub size_px: f64,
    /// Fill color.
    pub color: Rgba8,
    /// Alignment relative to `pos`.
    pub anchor: TextAnchor,
}

/// Everything drawn over the background for one date column.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameScene {
    /// Frame (date column) index.
    pub index: FrameIndex,
    /// Date shown.
    pub date: NaiveDate,
    /// Sum of the column over all locations.
    pub total: i64,
    /// Top countries for the ranked table.
    pub ranking: Vec<RankedEntry>,
    /// Circles for locations with a positive count.
    pub markers: Vec<Marker>,
    /// Date, counter and table text.
    pub texts: Vec<TextItem>,
    canvas: Canvas,
    marker_color: Rgba8,
}

impl FrameScene {
    /// Compute markers and annotations for date column `index`.
    pub fn build(
        table: &CaseTable,
        index: FrameIndex,
        variant: &VariantConfig,
        projection: &MercatorProjection,
        style: &MapStyle,
    ) -> SpreadResult<Self> {
        let date = table.date_at(index)?;
        let d = index.as_usize();

        let markers = table
            .rows
            .iter()
            .filter_map(|row| {
                let count = row.counts.get(d).copied().unwrap_or(0);
                if count <= 0 {
                    return None;
                }
                Some(Marker {
                    center: projection.project(row.key.lon, row.key.lat),
                    radius: style.marker_radius_px(count, variant.scale_factor),
                })
            })
            .collect();

        let total = table.column_total(index);
        let ranking = table.top_countries(index, style.top_n);

        let at = |lon: f64, lat: f64| projection.project(lon, lat);
        let headline_px = style.pt_to_px(style.headline_pt);
        let (date_lon, date_lat) = style.date_anchor;
        let total_lon = date_lon + style.counter_spacing * 1.7;

        let mut texts = vec![
            TextItem {
                pos: at(date_lon, date_lat),
                text: date.format("%b %d, %Y").to_string(),
                size_px: headline_px * 1.3,
                color: style.text,
                anchor: TextAnchor::Start,
            },
            // Right-aligned against the total so labels of any length share one edge.
            TextItem {
                pos: at(total_lon - style.label_gap, date_lat),
                text: variant.display_text.trim().to_owned(),
                size_px: headline_px,
                color: style.accent,
                anchor: TextAnchor::End,
            },
            TextItem {
                pos: at(total_lon, date_lat),
                text: format_thousands(total),
                size_px: headline_px * 1.3,
                color: style.accent,
                anchor: TextAnchor::Start,
            },
        ];

        let table_px = style.pt_to_px(style.table_pt);
        let line_px = table_px * style.line_spacing;
        let (table_lon, table_lat) = style.table_anchor;
        let last_name = at(table_lon, table_lat);
        let last_count = at(table_lon + style.table_count_offset, table_lat);
        let rows_above = ranking.len().saturating_sub(1) as f64;
        for (i, entry) in ranking.iter().enumerate() {
            let dy = (i as f64 - rows_above) * line_px;
            texts.push(TextItem {
                pos: Point::new(last_name.x, last_name.y + dy),
                text: entry.country.clone(),
                size_px: table_px,
                color: style.text,
                anchor: TextAnchor::End,
            });
            texts.push(TextItem {
                pos: Point::new(last_count.x, last_count.y + dy),
                text: entry.count.to_string(),
                size_px: table_px,
                color: style.text,
                anchor: TextAnchor::End,
            });
        }

        Ok(Self {
            index,
            date,
            total,
            ranking,
            markers,
            texts,
            canvas: projection.canvas(),
            marker_color: style.marker,
        })
    }

    /// Serialise the overlay as a transparent SVG the size of the canvas.
    pub fn to_svg(&self) -> String {
        let Canvas { width, height } = self.canvas;
        let mut out = String::with_capacity(256 + self.markers.len() * 64 + self.texts.len() * 160);
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );

        let (fill, opacity) = self.marker_color.to_svg();
        let _ = write!(out, r#"<g fill="{fill}" fill-opacity="{opacity:.3}">"#);
        for m in &self.markers {
            let _ = write!(
                out,
                r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}"/>"#,
                m.center.x, m.center.y, m.radius
            );
        }
        out.push_str("</g>");

        for t in &self.texts {
            let (fill, opacity) = t.color.to_svg();
            let anchor = match t.anchor {
                TextAnchor::Start => "start",
                TextAnchor::End => "end",
            };
            let _ = write!(
                out,
                r#"<text x="{:.1}" y="{:.1}" font-family="{PREFERRED_FONT_FAMILY}, sans-serif" font-size="{:.1}" fill="{fill}" fill-opacity="{opacity:.3}" text-anchor="{anchor}">{}</text>"#,
                t.pos.x,
                t.pos.y,
                t.size_px,
                escape_xml(&t.text)
            );
        }

        out.push_str("</svg>");
        out
    }
}

/// Format an integer with `,` thousands separators.
pub fn format_thousands(v: i64) -> String {
    let digits = v.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if v < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
