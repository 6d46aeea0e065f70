/// Background map (ocean fill, reprojected raster, coastlines).
pub mod background;
/// Mercator projection fitted to the output canvas.
pub mod projection;
