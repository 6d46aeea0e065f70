use std::f64::consts::FRAC_PI_4;

use crate::foundation::core::{Canvas, Point, Rect};
use crate::foundation::error::{SpreadError, SpreadResult};

/// Geographic bounding box in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoExtent {
    /// Western edge.
    pub lon_min: f64,
    /// Eastern edge.
    pub lon_max: f64,
    /// Southern edge.
    pub lat_min: f64,
    /// Northern edge.
    pub lat_max: f64,
}

impl Default for GeoExtent {
    /// Whole world without the polar caps.
    fn default() -> Self {
        Self {
            lon_min: -179.0,
            lon_max: 179.0,
            lat_min: -70.0,
            lat_max: 70.0,
        }
    }
}

impl GeoExtent {
    /// Check ordering and that both latitudes are finite under Mercator.
    pub fn validate(&self) -> SpreadResult<()> {
        let all_finite = [self.lon_min, self.lon_max, self.lat_min, self.lat_max]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(SpreadError::validation("map extent must be finite"));
        }
        if self.lon_min >= self.lon_max || self.lat_min >= self.lat_max {
            return Err(SpreadError::validation("map extent min must be < max"));
        }
        if self.lat_min <= -85.0 || self.lat_max >= 85.0 {
            return Err(SpreadError::validation(
                "map extent latitudes must be within (-85, 85)",
            ));
        }
        if self.lon_min < -180.0 || self.lon_max > 180.0 {
            return Err(SpreadError::validation(
                "map extent longitudes must be within [-180, 180]",
            ));
        }
        Ok(())
    }
}

fn merc_y(lat_deg: f64) -> f64 {
    (FRAC_PI_4 + lat_deg.to_radians() / 2.0).tan().ln()
}

fn inv_merc_y(y: f64) -> f64 {
    (2.0 * y.exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees()
}

/// Spherical Mercator fitted into a canvas, aspect preserved and centred.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MercatorProjection {
    extent: GeoExtent,
    canvas: Canvas,
    x_min: f64,
    y_max: f64,
    scale: f64,
    offset: Point,
}

impl MercatorProjection {
    /// Fit `extent` into `canvas`.
    pub fn new(extent: GeoExtent, canvas: Canvas) -> SpreadResult<Self> {
        extent.validate()?;

        let x_min = extent.lon_min.to_radians();
        let x_max = extent.lon_max.to_radians();
        let y_min = merc_y(extent.lat_min);
        let y_max = merc_y(extent.lat_max);

        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let scale = (w / (x_max - x_min)).min(h / (y_max - y_min));
        let offset = Point::new(
            (w - scale * (x_max - x_min)) / 2.0,
            (h - scale * (y_max - y_min)) / 2.0,
        );

        Ok(Self {
            extent,
            canvas,
            x_min,
            y_max,
            scale,
            offset,
        })
    }

    /// Geographic extent shown.
    pub fn extent(&self) -> GeoExtent {
        self.extent
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Pixel position of `(lon, lat)` in degrees. Points outside the extent project outside
    /// [`Self::map_rect`].
    pub fn project(&self, lon: f64, lat: f64) -> Point {
        let lat = lat.clamp(-89.9, 89.9);
        Point::new(
            self.offset.x + (lon.to_radians() - self.x_min) * self.scale,
            self.offset.y + (self.y_max - merc_y(lat)) * self.scale,
        )
    }

    /// Inverse of [`Self::project`], returning `(lon, lat)` in degrees.
    pub fn unproject(&self, p: Point) -> (f64, f64) {
        let x = self.x_min + (p.x - self.offset.x) / self.scale;
        let y = self.y_max - (p.y - self.offset.y) / self.scale;
        (x.to_degrees(), inv_merc_y(y))
    }

    /// Pixel rectangle covered by the extent.
    pub fn map_rect(&self) -> Rect {
        let tl = self.project(self.extent.lon_min, self.extent.lat_max);
        let br = self.project(self.extent.lon_max, self.extent.lat_min);
        Rect::from_points(tl, br)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/map/projection.rs"]
mod tests;
