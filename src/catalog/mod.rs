//! Static catalog - database schema, geographic regions, parameter vocabulary
//!
//! Everything in this module is immutable knowledge shared by the
//! classifier, SQL synthesizer, geographic validator, and response shaper.
//! No I/O, safe to share across concurrent pipeline invocations.

mod parameters;
mod regions;
mod schema;

pub use parameters::{array_columns, parameters, Parameter};
pub use regions::{coverage, find_region, regions, unsupported_regions, Coverage, Region};
pub use schema::{database_schema, TABLE_FLOATS, TABLE_PROFILES};

/// Closed latitude/longitude rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Rect {
    pub const fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Whether a point lies inside the rectangle (bounds inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }

    /// Whether two rectangles share any area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.lat_min <= other.lat_max
            && other.lat_min <= self.lat_max
            && self.lon_min <= other.lon_max
            && other.lon_min <= self.lon_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(5.0, 25.0, 80.0, 100.0);
        assert!(r.contains(15.0, 90.0));
        assert!(r.contains(5.0, 80.0));
        assert!(!r.contains(4.9, 90.0));
        assert!(!r.contains(15.0, 101.0));
    }

    #[test]
    fn test_rect_intersects() {
        let bengal = Rect::new(5.0, 25.0, 80.0, 100.0);
        let indian = Rect::new(-60.0, 30.0, 20.0, 120.0);
        let atlantic = Rect::new(-60.0, 60.0, -80.0, 20.0);
        assert!(bengal.intersects(&indian));
        assert!(!bengal.intersects(&atlantic));
    }
}
