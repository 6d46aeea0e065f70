/// Frame buffers and the renderer trait.
pub mod backend;
/// CPU renderer built on `resvg`.
pub mod cpu;
/// Per-frame markers and annotations.
pub mod scene;
/// SVG parsing, fonts and rasterisation.
pub mod svg_raster;
