use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::NaiveDate;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SpreadError, SpreadResult};
use crate::render::backend::FrameRGBA;

/// File name of the frame-to-date index written next to the frames.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Configuration provided to a [`FrameSink`] at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Variant label, recorded in the manifest.
    pub label: String,
    /// Date of every frame index, in order.
    pub dates: Vec<NaiveDate>,
}

/// Sink contract for consuming rendered frames in date order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order. Frames for
/// which `contains` returns `true` are not rendered or pushed.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> SpreadResult<()>;
    /// Whether frame `idx` is already stored from an earlier run.
    fn contains(&self, idx: FrameIndex) -> bool;
    /// Store one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SpreadResult<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> SpreadResult<()>;
}

/// One manifest entry.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ManifestFrame {
    /// Frame index.
    pub index: u64,
    /// Date shown, ISO formatted.
    pub date: NaiveDate,
    /// File name relative to the manifest.
    pub file: String,
}

/// Frame index written for external video tools (`ffmpeg -i frame_%06d.png`).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameManifest {
    /// Variant label.
    pub label: String,
    /// Frame size.
    pub width: u32,
    /// Frame size.
    pub height: u32,
    /// Every frame, rendered now or earlier.
    pub frames: Vec<ManifestFrame>,
}

/// Writes `frame_{idx:06}.png` files into one directory and skips frames that already exist.
///
/// Historical case counts are assumed never to change, so an existing file is final. Frames are
/// written to `<name>.part` and renamed, so an interrupted write never looks cached. A directory
/// only ever holds frames of one size: `begin` rejects a size that differs from the manifest of
/// an earlier run.
#[derive(Debug)]
pub struct PngDirSink {
    dir: PathBuf,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl PngDirSink {
    /// Sink writing into `dir` (created on `begin`).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cfg: None,
            last_idx: None,
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for frame `idx`.
    pub fn file_name(idx: FrameIndex) -> String {
        format!("frame_{:06}.png", idx.0)
    }

    /// Full path for frame `idx`.
    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(Self::file_name(idx))
    }

    /// Manifest left by an earlier run, if one exists and parses.
    pub fn read_manifest(&self) -> Option<FrameManifest> {
        let path = self.dir.join(MANIFEST_FILE);
        let bytes = std::fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable manifest");
                None
            }
        }
    }

    fn write_manifest(&self, cfg: &SinkConfig) -> SpreadResult<()> {
        let frames = cfg
            .dates
            .iter()
            .enumerate()
            .map(|(i, date)| ManifestFrame {
                index: i as u64,
                date: *date,
                file: Self::file_name(FrameIndex(i as u64)),
            })
            .collect();
        let manifest = FrameManifest {
            label: cfg.label.clone(),
            width: cfg.width,
            height: cfg.height,
            frames,
        };
        let path = self.dir.join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(&manifest).context("serialize frame manifest")?;
        std::fs::write(&path, json).with_context(|| format!("write '{}'", path.display()))?;
        Ok(())
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

impl FrameSink for PngDirSink {
    fn begin(&mut self, cfg: SinkConfig) -> SpreadResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(SpreadError::validation("sink width/height must be non-zero"));
        }
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| SpreadError::io(format!("create '{}': {e}", self.dir.display())))?;
        if let Some(prev) = self.read_manifest()
            && (prev.width, prev.height) != (cfg.width, cfg.height)
        {
            return Err(SpreadError::validation(format!(
                "'{}' holds {}x{} frames, cannot add {}x{}; use an empty frames directory",
                self.dir.display(),
                prev.width,
                prev.height,
                cfg.width,
                cfg.height
            )));
        }
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn contains(&self, idx: FrameIndex) -> bool {
        self.frame_path(idx).is_file()
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SpreadResult<()> {
        let Some(cfg) = &self.cfg else {
            return Err(SpreadError::validation("push_frame called before begin"));
        };
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(SpreadError::validation(format!(
                "frames must be pushed in increasing order ({} after {})",
                idx.0, last.0
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(SpreadError::validation(format!(
                "frame is {}x{}, sink expects {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        // Encode beside the target and rename, so a frame file on disk is always complete.
        let path = self.frame_path(idx);
        let part = part_path(&path);
        frame.save_png(&part)?;
        std::fs::rename(&part, &path)
            .with_context(|| format!("move '{}' into place", path.display()))?;
        self.last_idx = Some(idx);
        Ok(())
    }

    fn end(&mut self) -> SpreadResult<()> {
        match self.cfg.take() {
            Some(cfg) => self.write_manifest(&cfg),
            None => Ok(()),
        }
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    existing: BTreeSet<FrameIndex>,
    /// Frames in push order.
    pub(crate) frames: Vec<(FrameIndex, FrameRGBA)>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that reports `existing` as already stored.
    pub fn with_existing(existing: impl IntoIterator<Item = FrameIndex>) -> Self {
        Self {
            existing: existing.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> SpreadResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn contains(&self, idx: FrameIndex) -> bool {
        self.existing.contains(&idx)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SpreadResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> SpreadResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
