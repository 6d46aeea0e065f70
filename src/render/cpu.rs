use std::path::PathBuf;

use crate::foundation::core::Canvas;
use crate::foundation::error::SpreadResult;
use crate::map::background::{BackgroundOpts, PreparedBackground};
use crate::map::projection::{GeoExtent, MercatorProjection};
use crate::render::backend::{FrameRGBA, RenderBackend};
use crate::render::scene::{FrameScene, MapStyle};
use crate::render::svg_raster::SvgRasterizer;

/// Options for the CPU frame renderer.
#[derive(Clone, Debug, Default)]
pub struct RendererOpts {
    /// Output size.
    pub canvas: Canvas,
    /// Geographic area shown.
    pub extent: GeoExtent,
    /// Background map sources.
    pub background: BackgroundOpts,
    /// Extra directory scanned for `.ttf`/`.otf`/`.ttc` files.
    pub fonts_dir: Option<PathBuf>,
    /// Annotation style.
    pub style: MapStyle,
}

/// CPU renderer: a prepared background pixmap plus a `resvg` overlay per frame.
pub struct CpuRenderer {
    projection: MercatorProjection,
    style: MapStyle,
    background: PreparedBackground,
    rasterizer: SvgRasterizer,
}

impl CpuRenderer {
    /// Load fonts and paint the background once.
    pub fn new(opts: RendererOpts) -> SpreadResult<Self> {
        let projection = MercatorProjection::new(opts.extent, opts.canvas)?;
        let rasterizer = SvgRasterizer::new(opts.fonts_dir.as_deref());
        if rasterizer.font_face_count() == 0 {
            tracing::warn!("no fonts found; frame text will not be drawn");
        }
        let background = PreparedBackground::prepare(&opts.background, &projection, &rasterizer)?;
        Ok(Self {
            projection,
            style: opts.style,
            background,
            rasterizer,
        })
    }
}

impl RenderBackend for CpuRenderer {
    fn projection(&self) -> &MercatorProjection {
        &self.projection
    }

    fn style(&self) -> &MapStyle {
        &self.style
    }

    #[tracing::instrument(skip_all, fields(frame = scene.index.0, markers = scene.markers.len()))]
    fn render_scene(&mut self, scene: &FrameScene) -> SpreadResult<FrameRGBA> {
        let mut pixmap = self.background.to_pixmap();
        self.rasterizer.draw_onto(&scene.to_svg(), &mut pixmap)?;
        Ok(FrameRGBA {
            width: pixmap.width(),
            height: pixmap.height(),
            data: pixmap.take(),
            premultiplied: true,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
