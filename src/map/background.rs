use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use geojson::{GeoJson, Geometry, Value};
use resvg::tiny_skia::{Color, Pixmap};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{SpreadError, SpreadResult};
use crate::map::projection::MercatorProjection;
use crate::render::svg_raster::SvgRasterizer;

/// Polyline in `(lon, lat)` degrees.
pub type GeoLine = Vec<(f64, f64)>;

/// What is drawn beneath the markers.
///
/// No map data ships with the crate: with neither `raster` nor `coastlines` set the map area is a
/// plain `ocean` fill with no land.
#[derive(Clone, Debug)]
pub struct BackgroundOpts {
    /// Equirectangular world image (e.g. NASA Blue Marble), reprojected to Mercator.
    pub raster: Option<PathBuf>,
    /// GeoJSON coastlines or country outlines, stroked over the raster.
    pub coastlines: Option<PathBuf>,
    /// Fill for the map area when no raster is given.
    pub ocean: Rgba8,
    /// Coastline stroke color.
    pub coast: Rgba8,
    /// Coastline stroke width in pixels.
    pub coast_width: f64,
}

impl Default for BackgroundOpts {
    fn default() -> Self {
        Self {
            raster: None,
            coastlines: None,
            ocean: Rgba8::rgb(0x0b, 0x16, 0x26),
            coast: Rgba8::rgb(0x5a, 0x6e, 0x86),
            coast_width: 1.0,
        }
    }
}

/// Background pixmap built once per run and copied for every frame.
#[derive(Clone)]
pub struct PreparedBackground {
    pixmap: Pixmap,
}

impl PreparedBackground {
    /// Paint the letterbox, the map area, the optional raster and the optional coastlines.
    #[tracing::instrument(skip_all)]
    pub fn prepare(
        opts: &BackgroundOpts,
        projection: &MercatorProjection,
        rasterizer: &SvgRasterizer,
    ) -> SpreadResult<Self> {
        let canvas = projection.canvas();
        let mut pixmap = Pixmap::new(canvas.width, canvas.height)
            .ok_or_else(|| SpreadError::render("failed to allocate background pixmap"))?;
        pixmap.fill(Color::BLACK);

        match &opts.raster {
            Some(path) => {
                let src = image::open(path)
                    .with_context(|| format!("open background image '{}'", path.display()))?
                    .to_rgba8();
                reproject_equirectangular(&src, projection, &mut pixmap);
                tracing::info!(path = %path.display(), "background image reprojected");
            }
            None => fill_map_rect(opts.ocean, projection, &mut pixmap),
        }

        if let Some(path) = &opts.coastlines {
            let lines = load_coastlines(path)?;
            tracing::info!(lines = lines.len(), "coastlines loaded");
            let svg = coastlines_svg(&lines, projection, opts.coast, opts.coast_width);
            rasterizer.draw_onto(&svg, &mut pixmap)?;
        }

        Ok(Self { pixmap })
    }

    /// Fresh copy to draw a frame on.
    pub fn to_pixmap(&self) -> Pixmap {
        self.pixmap.clone()
    }
}

fn fill_map_rect(color: Rgba8, projection: &MercatorProjection, pixmap: &mut Pixmap) {
    let r = projection.map_rect();
    let Some(rect) = resvg::tiny_skia::Rect::from_ltrb(
        r.x0 as f32,
        r.y0 as f32,
        r.x1 as f32,
        r.y1 as f32,
    ) else {
        return;
    };
    let mut paint = resvg::tiny_skia::Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    pixmap.fill_rect(rect, &paint, resvg::tiny_skia::Transform::identity(), None);
}

/// Nearest-neighbour reprojection of a plate carrée image into the Mercator map rect.
fn reproject_equirectangular(
    src: &image::RgbaImage,
    projection: &MercatorProjection,
    pixmap: &mut Pixmap,
) {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return;
    }
    let width = pixmap.width();
    let rect = projection.map_rect();
    let y0 = rect.y0.floor().max(0.0) as u32;
    let y1 = (rect.y1.ceil() as u32).min(pixmap.height());
    let x0 = rect.x0.floor().max(0.0) as u32;
    let x1 = (rect.x1.ceil() as u32).min(width);

    let data = pixmap.data_mut();
    for py in y0..y1 {
        for px in x0..x1 {
            let (lon, lat) = projection.unproject(crate::foundation::core::Point::new(
                f64::from(px) + 0.5,
                f64::from(py) + 0.5,
            ));
            let sx = (((lon + 180.0) / 360.0) * f64::from(sw)).floor();
            let sy = (((90.0 - lat) / 180.0) * f64::from(sh)).floor();
            let sx = (sx.max(0.0) as u32).min(sw - 1);
            let sy = (sy.max(0.0) as u32).min(sh - 1);

            let [r, g, b, a] = src.get_pixel(sx, sy).0;
            let premul = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
            let i = ((py * width + px) * 4) as usize;
            data[i] = premul(r);
            data[i + 1] = premul(g);
            data[i + 2] = premul(b);
            data[i + 3] = a;
        }
    }
}

/// Read every line and polygon ring from a GeoJSON file.
pub fn load_coastlines(path: &Path) -> SpreadResult<Vec<GeoLine>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read coastlines '{}'", path.display()))?;
    parse_coastlines(&content)
}

/// Parse GeoJSON text into polylines.
pub fn parse_coastlines(content: &str) -> SpreadResult<Vec<GeoLine>> {
    let geojson: GeoJson = content
        .parse()
        .map_err(|e| SpreadError::data(format!("invalid coastline geojson: {e}")))?;

    let mut lines = Vec::new();
    match &geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(geometry) = &feature.geometry {
                    collect_geometry_lines(geometry, &mut lines);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                collect_geometry_lines(geometry, &mut lines);
            }
        }
        GeoJson::Geometry(geometry) => collect_geometry_lines(geometry, &mut lines),
    }
    Ok(lines)
}

fn collect_geometry_lines(geometry: &Geometry, out: &mut Vec<GeoLine>) {
    fn to_line(coords: &[Vec<f64>]) -> GeoLine {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    }

    match &geometry.value {
        Value::LineString(coords) => out.push(to_line(coords)),
        Value::MultiLineString(lines) => out.extend(lines.iter().map(|l| to_line(l))),
        Value::Polygon(rings) => out.extend(rings.iter().map(|r| to_line(r))),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.extend(rings.iter().map(|r| to_line(r)));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_geometry_lines(g, out);
            }
        }
        Value::Point(_) | Value::MultiPoint(_) => {}
    }
}

/// Stroke-only SVG path for the coastlines. Segments crossing the antimeridian are split.
fn coastlines_svg(
    lines: &[GeoLine],
    projection: &MercatorProjection,
    color: Rgba8,
    width: f64,
) -> String {
    let canvas = projection.canvas();
    let (stroke, opacity) = color.to_svg();

    let mut d = String::new();
    for line in lines {
        let mut prev_lon: Option<f64> = None;
        for &(lon, lat) in line {
            let p = projection.project(lon, lat);
            let cmd = match prev_lon {
                Some(prev) if (lon - prev).abs() <= 180.0 => 'L',
                _ => 'M',
            };
            let _ = write!(d, "{cmd}{:.1} {:.1}", p.x, p.y);
            prev_lon = Some(lon);
        }
    }

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><path d="{d}" fill="none" stroke="{stroke}" stroke-opacity="{opacity:.3}" stroke-width="{width}" stroke-linejoin="round"/></svg>"#,
        w = canvas.width,
        h = canvas.height,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/map/background.rs"]
mod tests;
