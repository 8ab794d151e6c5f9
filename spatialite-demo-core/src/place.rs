//! Named geographic fixtures used by the demo scenarios.

use std::fmt;

use geo::{Coord, Point};

/// SRID of WGS-84 longitude/latitude coordinates.
pub const WGS84_SRID: i64 = 4326;

/// A labelled WGS-84 position.
///
/// Coordinates are longitude first, latitude second, in decimal degrees.
///
/// # Examples
/// ```
/// use spatialite_demo_core::Place;
///
/// let rio = Place::new("Rio de Janeiro", -43.1729, -22.9068);
/// assert_eq!(rio.wkt(), "POINT(-43.1729 -22.9068)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Place {
    label: &'static str,
    location: Coord<f64>,
}

impl Place {
    /// Place at (`longitude`, `latitude`).
    #[must_use]
    pub const fn new(label: &'static str, longitude: f64, latitude: f64) -> Self {
        Self {
            label,
            location: Coord {
                x: longitude,
                y: latitude,
            },
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Position as a `geo` point.
    #[must_use]
    pub fn point(&self) -> Point<f64> {
        Point::from(self.location)
    }

    /// Well-Known Text for the position, e.g. `POINT(-43.1729 -22.9068)`.
    #[must_use]
    pub fn wkt(&self) -> String {
        format!("POINT({} {})", self.location.x, self.location.y)
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.wkt())
    }
}

/// Tourist places seeded into the `points` table, in insertion order.
pub const BRAZILIAN_LANDMARKS: [Place; 3] = [
    Place::new("Rio de Janeiro", -43.1729, -22.9068),
    Place::new("Foz do Iguacu", -54.5854, -25.5165),
    Place::new("Fernando de Noronha", -32.423786, -3.853808),
];

/// Places resolved against the imported state boundaries, in lookup order.
///
/// The first three lie inside Brazil; the last two do not.
pub const LOOKUP_PLACES: [Place; 5] = [
    BRAZILIAN_LANDMARKS[0],
    BRAZILIAN_LANDMARKS[1],
    BRAZILIAN_LANDMARKS[2],
    Place::new("Null Island", 0.0, 0.0),
    Place::new("New York", -74.0060, 40.7128),
];
