//! Frame sinks.
//!
//! Sinks consume rendered frames in date order and are used by `RenderSession::render_all`.

/// Generic frame sink trait, the PNG directory cache and an in-memory sink.
pub mod sink;
