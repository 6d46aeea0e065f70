//! spreadmap renders a time-lapse of an epidemic's geographic spread.
//!
//! The pipeline is linear:
//!
//! - fetch the daily cumulative case tables ([`Fetcher`])
//! - load a dataset variant, deriving active cases when asked ([`load_variant`])
//! - render one frame per date column ([`RenderSession`]) into a [`FrameSink`], skipping frames
//!   that already exist on disk
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Upstream tables and dataset variants.
pub mod data;
/// Frame sinks and the on-disk frame cache.
pub mod encode;
/// Projection and background map.
pub mod map;
/// Scene building and rasterisation.
pub mod render;
/// Per-variant render loop.
pub mod session;

pub use crate::foundation::core::{Canvas, FrameIndex, Point, Rect, Rgba8};
pub use crate::foundation::error::{SpreadError, SpreadResult};

pub use crate::data::dataset::{DatasetVariant, VariantConfig, build_active, load_variant};
pub use crate::data::fetch::{DataFile, FetchOpts, FetchOutcome, Fetcher};
pub use crate::data::table::{CaseTable, LocationKey, LocationRow, RankedEntry};
pub use crate::encode::sink::{FrameManifest, FrameSink, InMemorySink, PngDirSink, SinkConfig};
pub use crate::map::background::BackgroundOpts;
pub use crate::map::projection::{GeoExtent, MercatorProjection};
pub use crate::render::backend::{FrameRGBA, RenderBackend};
pub use crate::render::cpu::{CpuRenderer, RendererOpts};
pub use crate::render::scene::{FrameScene, MapStyle};
pub use crate::session::render_session::{RenderSession, RenderStats};
