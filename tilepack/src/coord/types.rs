//! Coordinate types for the Web Mercator tile grid.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum latitude supported by the Web Mercator projection.
pub const MIN_LAT: f64 = -85.05112878;

/// Maximum latitude supported by the Web Mercator projection.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Minimum zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum zoom level supported by the pipeline.
pub const MAX_ZOOM: u8 = 18;

/// Mean Earth radius in kilometres, used for area estimates.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors that can occur during coordinate operations.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Zoom level outside the supported range.
    InvalidZoom(u8),
    /// Bounding box with south edge above north edge.
    InvalidBoundingBox { south: f64, north: f64 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidZoom(zoom) => {
                write!(f, "Zoom level {} exceeds maximum of {}", zoom, MAX_ZOOM)
            }
            CoordError::InvalidBoundingBox { south, north } => {
                write!(
                    f,
                    "Invalid bounding box: south ({}) is above north ({})",
                    south, north
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}

/// A geographic bounding box in degrees.
///
/// Longitude wraparound (a box crossing the antimeridian) is not
/// handled; `east` is assumed to be at or beyond `west`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBox {
    /// Southern edge in degrees.
    pub south: f64,
    /// Western edge in degrees.
    pub west: f64,
    /// Northern edge in degrees.
    pub north: f64,
    /// Eastern edge in degrees.
    pub east: f64,
}

impl GeoBoundingBox {
    /// Creates a bounding box, rejecting one whose south edge lies
    /// above its north edge.
    ///
    /// Latitudes beyond the Web Mercator limit are accepted here; the
    /// projection clamps them (see [`super::tile_range`]).
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, CoordError> {
        if south > north {
            return Err(CoordError::InvalidBoundingBox { south, north });
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }
}

impl fmt::Display for GeoBoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}] .. [{:.4}, {:.4}]",
            self.south, self.west, self.north, self.east
        )
    }
}

/// A tile address in the slippy-map scheme.
///
/// `x` grows west to east, `y` north to south, both in
/// `0..2^zoom`. Unique key for a tile within an export session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Zoom level.
    pub zoom: u8,
    /// Column (west to east).
    pub x: u32,
    /// Row (north to south).
    pub y: u32,
}

impl TileCoord {
    /// Returns the archive entry path for this tile, `z/x/y.png`.
    pub fn entry_path(&self) -> String {
        format!("{}/{}/{}.png", self.zoom, self.x, self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// An inclusive rectangle of tile coordinates at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    /// Zoom level of the range.
    pub zoom: u8,
    /// Westernmost column (inclusive).
    pub x_min: u32,
    /// Easternmost column (inclusive).
    pub x_max: u32,
    /// Northernmost row (inclusive).
    pub y_min: u32,
    /// Southernmost row (inclusive).
    pub y_max: u32,
}

impl TileRange {
    /// Number of tiles covered by this range.
    pub fn count(&self) -> u64 {
        let cols = (self.x_max - self.x_min + 1) as u64;
        let rows = (self.y_max - self.y_min + 1) as u64;
        cols * rows
    }

    /// Iterates the range in planning order: `x` ascending, then `y`
    /// ascending within each column.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let zoom = self.zoom;
        let (y_min, y_max) = (self.y_min, self.y_max);
        (self.x_min..=self.x_max)
            .flat_map(move |x| (y_min..=y_max).map(move |y| TileCoord { zoom, x, y }))
    }
}
