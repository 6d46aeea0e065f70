/// Per-variant frame loop with the frame cache gate.
pub mod render_session;
