use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{SpreadError, SpreadResult};

/// Font family tried first for frame annotations.
pub const PREFERRED_FONT_FAMILY: &str = "Open Sans";

/// Parses SVG overlays and rasterises them onto pixmaps with `resvg`.
///
/// The font database is loaded once; every overlay parse shares it.
pub struct SvgRasterizer {
    opts: usvg::Options<'static>,
}

impl SvgRasterizer {
    /// Build a rasteriser using system fonts plus any fonts in `fonts_dir`.
    pub fn new(fonts_dir: Option<&Path>) -> Self {
        let fontdb = build_fontdb(fonts_dir);
        tracing::debug!(faces = fontdb.faces().count(), "font database ready");
        let opts = usvg::Options {
            fontdb,
            font_resolver: make_font_resolver(),
            font_family: PREFERRED_FONT_FAMILY.to_owned(),
            ..Default::default()
        };
        Self { opts }
    }

    /// Number of font faces available to text nodes.
    pub fn font_face_count(&self) -> usize {
        self.opts.fontdb.faces().count()
    }

    /// Parse an SVG document.
    pub fn parse(&self, svg: &str) -> SpreadResult<usvg::Tree> {
        let tree = usvg::Tree::from_str(svg, &self.opts).context("parse svg overlay")?;
        Ok(tree)
    }

    /// Parse `svg` and draw it over `pixmap` at 1 SVG unit per pixel.
    pub fn draw_onto(&self, svg: &str, pixmap: &mut resvg::tiny_skia::Pixmap) -> SpreadResult<()> {
        let tree = self.parse(svg)?;
        let size = tree.size();
        if size.width().ceil() as u32 != pixmap.width()
            || size.height().ceil() as u32 != pixmap.height()
        {
            return Err(SpreadError::render(format!(
                "overlay is {}x{} but target is {}x{}",
                size.width(),
                size.height(),
                pixmap.width(),
                pixmap.height()
            )));
        }
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );
        Ok(())
    }
}

/// Escape text for use inside SVG element content or attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn build_fontdb(fonts_dir: Option<&Path>) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    if let Some(dir) = fonts_dir {
        load_fonts_from_dir(&mut db, dir);
    }
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "fonts dir is not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}

// Requested family first, then generic sans, then any face at all so text never silently
// disappears on minimal systems.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style: usvg::fontdb::Style::Normal,
            };

            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/svg_raster.rs"]
mod tests;
