use crate::data::dataset::VariantConfig;
use crate::data::table::CaseTable;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SpreadError, SpreadResult};
use crate::render::backend::{FrameRGBA, RenderBackend};
use crate::render::scene::FrameScene;

/// Per-variant render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderStats {
    /// Date columns in the table.
    pub frames_total: u64,
    /// Frames rendered and pushed in this run.
    pub frames_rendered: u64,
    /// Frames skipped because the sink already had them.
    pub frames_skipped: u64,
}

/// Renders every date column of one dataset variant.
pub struct RenderSession<'a> {
    table: &'a CaseTable,
    variant: &'a VariantConfig,
    backend: &'a mut dyn RenderBackend,
}

impl<'a> RenderSession<'a> {
    /// Pair a table with its variant settings and a backend.
    pub fn new(
        table: &'a CaseTable,
        variant: &'a VariantConfig,
        backend: &'a mut dyn RenderBackend,
    ) -> Self {
        Self {
            table,
            variant,
            backend,
        }
    }

    /// Number of frames (date columns).
    pub fn len_frames(&self) -> u64 {
        self.table.len_dates() as u64
    }

    /// Build the scene for one frame.
    pub fn scene(&self, idx: FrameIndex) -> SpreadResult<FrameScene> {
        FrameScene::build(
            self.table,
            idx,
            self.variant,
            self.backend.projection(),
            self.backend.style(),
        )
    }

    /// Render a single frame, ignoring any cache.
    #[tracing::instrument(skip(self), fields(variant = %self.variant.display_text))]
    pub fn render_frame(&mut self, idx: FrameIndex) -> SpreadResult<FrameRGBA> {
        if idx.0 >= self.len_frames() {
            return Err(SpreadError::validation(format!(
                "frame {} is outside the {} date columns",
                idx.0,
                self.len_frames()
            )));
        }
        let scene = self.scene(idx)?;
        self.backend.render_scene(&scene)
    }

    /// Render every date column in order into `sink`.
    ///
    /// A frame the sink already holds is never rendered again.
    pub fn render_all(&mut self, sink: &mut dyn FrameSink) -> SpreadResult<RenderStats> {
        let canvas = self.backend.projection().canvas();
        sink.begin(SinkConfig {
            width: canvas.width,
            height: canvas.height,
            label: self.variant.display_text.trim().to_owned(),
            dates: self.table.dates.clone(),
        })?;

        let mut stats = RenderStats {
            frames_total: self.len_frames(),
            ..RenderStats::default()
        };
        for i in 0..stats.frames_total {
            let idx = FrameIndex(i);
            if sink.contains(idx) {
                tracing::debug!(frame = i, "frame exists, skipping");
                stats.frames_skipped += 1;
                continue;
            }

            let date = self.table.date_at(idx)?;
            tracing::info!(frame = i, %date, "working on frame");
            let frame = self.render_frame(idx)?;
            sink.push_frame(idx, &frame)?;
            stats.frames_rendered += 1;
        }

        sink.end()?;
        Ok(stats)
    }
}
