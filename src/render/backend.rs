use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::unpremultiply_in_place;
use crate::foundation::error::{SpreadError, SpreadResult};
use crate::map::projection::MercatorProjection;
use crate::render::scene::{FrameScene, MapStyle};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha** as produced by the rasteriser. The `premultiplied` flag is
/// included to make this explicit at API boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha copy of the pixels.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_in_place(&mut out);
        }
        out
    }

    /// Encode as PNG at `path`.
    pub fn save_png(&self, path: &Path) -> SpreadResult<()> {
        let expected = (self.width as usize) * (self.height as usize) * 4;
        if self.data.len() != expected {
            return Err(SpreadError::render(format!(
                "frame buffer has {} bytes, expected {expected}",
                self.data.len()
            )));
        }
        image::save_buffer_with_format(
            path,
            &self.to_straight_rgba(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// A renderer that turns a [`FrameScene`] into pixels.
///
/// Scenes are laid out against the backend's projection and style, so callers ask the backend
/// for both before building a scene.
pub trait RenderBackend {
    /// Projection the backend's background was prepared for.
    fn projection(&self) -> &MercatorProjection;

    /// Annotation style.
    fn style(&self) -> &MapStyle;

    /// Draw `scene` over the background.
    fn render_scene(&mut self, scene: &FrameScene) -> SpreadResult<FrameRGBA>;
}
