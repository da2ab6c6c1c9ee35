use grid_util::point::Point;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Distance estimate used to order the A* open set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    /// `|dx| + |dy|`
    #[default]
    Manhattan,
    /// `sqrt(dx² + dy²)`
    Euclidean,
}

impl Heuristic {
    /// The raw distance between two cells.
    pub fn distance(&self, p1: &Point, p2: &Point) -> f64 {
        let dx = (p1.x - p2.x).abs() as f64;
        let dy = (p1.y - p2.y).abs() as f64;
        match self {
            Heuristic::Manhattan => dx + dy,
            Heuristic::Euclidean => (dx * dx + dy * dy).sqrt(),
        }
    }

    /// The distance rounded to the nearest integer, which is what enters `f = g + h`.
    pub fn estimate(&self, p1: &Point, p2: &Point) -> f64 {
        self.distance(p1, p2).round()
    }
}

/// Options recognised by every search call.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub heuristic: Heuristic,
    pub allow_diagonal: bool,
}

impl Default for SearchOptions {
    fn default() -> SearchOptions {
        SearchOptions {
            heuristic: Heuristic::Manhattan,
            allow_diagonal: true,
        }
    }
}

impl SearchOptions {
    pub fn new(heuristic: Heuristic, allow_diagonal: bool) -> SearchOptions {
        SearchOptions {
            heuristic,
            allow_diagonal,
        }
    }
}

/// A continuous position on the drawing surface, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    pub fn new(x: f64, y: f64) -> PixelPos {
        PixelPos { x, y }
    }
    pub fn manhattan_distance(&self, other: &PixelPos) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Pixel size of one grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TileSize {
    pub w: f64,
    pub h: f64,
}

impl Default for TileSize {
    fn default() -> TileSize {
        TileSize { w: 20.0, h: 20.0 }
    }
}

impl TileSize {
    pub fn new(w: f64, h: f64) -> TileSize {
        TileSize { w, h }
    }
    /// Top-left pixel corner of a cell.
    pub fn pixel_of(&self, cell: Point) -> PixelPos {
        PixelPos::new(cell.x as f64 * self.w, cell.y as f64 * self.h)
    }
    /// The cell a pointer position falls into. May lie outside the grid; the caller bounds-checks.
    pub fn cell_at(&self, pixel: PixelPos) -> Point {
        Point::new(
            ((pixel.x - self.w / 2.0) / self.w).round() as i32,
            ((pixel.y - self.h / 2.0) / self.h).round() as i32,
        )
    }
}

/// Engine-wide settings. Every field has a default so hosts can supply partial documents.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchOptions,
    pub tile: TileSize,
    /// Length of one simulation tick in milliseconds.
    pub timestep_ms: f64,
    /// Catch-up cap: more ticks than this in one frame drops the backlog.
    pub max_ticks_per_frame: usize,
    /// Frames closer together than `1000 / max_fps` ms are skipped.
    pub max_fps: f64,
    /// Walker speed in pixels per second when none is given.
    pub default_speed: f64,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            search: SearchOptions::default(),
            tile: TileSize::default(),
            timestep_ms: 1000.0 / 24.0,
            max_ticks_per_frame: 240,
            max_fps: 60.0,
            default_speed: 100.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.timestep_ms) {
            return Err(ConfigError::InvalidConfig(format!(
                "timestep_ms must be positive, got {}",
                self.timestep_ms
            )));
        }
        if !positive(self.tile.w) || !positive(self.tile.h) {
            return Err(ConfigError::InvalidConfig(format!(
                "tile size must be positive, got {}x{}",
                self.tile.w, self.tile.h
            )));
        }
        if !positive(self.max_fps) {
            return Err(ConfigError::InvalidConfig(format!(
                "max_fps must be positive, got {}",
                self.max_fps
            )));
        }
        if !positive(self.default_speed) {
            return Err(ConfigError::InvalidConfig(format!(
                "default_speed must be positive, got {}",
                self.default_speed
            )));
        }
        if self.max_ticks_per_frame == 0 {
            return Err(ConfigError::InvalidConfig(
                "max_ticks_per_frame must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}
