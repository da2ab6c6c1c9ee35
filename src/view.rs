use grid_util::point::Point;

use crate::config::{PixelPos, TileSize};
use crate::engine::PathfindingEngine;
use crate::motion::{MotionState, WalkerId};
use crate::weight_grid::{FREE, WALL};

/// Styling hint for one cell. Purely informational; the search never looks at it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellStyle {
    Wall,
    Free,
    /// Passable with a weight other than 1.
    Weighted(f64),
}

impl CellStyle {
    pub fn from_weight(weight: f64) -> CellStyle {
        if weight <= WALL {
            CellStyle::Wall
        } else if weight == FREE {
            CellStyle::Free
        } else {
            CellStyle::Weighted(weight)
        }
    }
}

#[derive(Clone, Debug)]
pub struct WalkerView<'a> {
    pub id: WalkerId,
    pub position: PixelPos,
    pub cell: Point,
    pub state: MotionState,
    pub path: &'a [Point],
    pub target: Point,
    pub target_visible: bool,
}

/// Everything a renderer needs to draw one frame. Borrowed from the engine, so it cannot outlive
/// the next mutation.
#[derive(Clone, Debug)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub tile: TileSize,
    /// Row-major.
    pub cells: Vec<CellStyle>,
    pub walkers: Vec<WalkerView<'a>>,
    pub paths: Vec<&'a [Point]>,
}

impl FrameView<'_> {
    pub fn cell(&self, point: Point) -> Option<CellStyle> {
        if point.x < 0 || point.y < 0 {
            return None;
        }
        let (x, y) = (point.x as usize, point.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }
}

/// Pixel centres of the cells along a path, for drawing it as a polyline.
pub fn polyline(path: &[Point], tile: &TileSize) -> Vec<PixelPos> {
    path.iter()
        .map(|p| {
            let corner = tile.pixel_of(*p);
            PixelPos::new(corner.x + tile.w / 2.0, corner.y + tile.h / 2.0)
        })
        .collect()
}

impl PathfindingEngine {
    pub fn view(&self) -> FrameView<'_> {
        let walkers = self
            .walkers
            .values()
            .map(|w| {
                let target = self.targets.get(&w.target);
                WalkerView {
                    id: w.id,
                    position: w.position,
                    cell: w.cell,
                    state: w.state,
                    path: &w.path,
                    target: target.map(|t| t.cell).unwrap_or(w.cell),
                    target_visible: target.is_some_and(|t| t.visible),
                }
            })
            .collect();
        FrameView {
            width: self.grid.width(),
            height: self.grid.height(),
            tile: self.config.tile,
            cells: self
                .grid
                .cells()
                .map(|(_, w)| CellStyle::from_weight(w))
                .collect(),
            walkers,
            paths: self.paths.values().map(|p| p.path.as_slice()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn snapshot_reflects_engine() {
        let rows = vec![vec![1.0, 0.0, 4.0], vec![1.0, 1.0, 1.0]];
        let mut engine = PathfindingEngine::new(&rows, EngineConfig::default()).unwrap();
        let id = engine.add_walker(Point::new(0, 0), Point::new(2, 1), None).unwrap();
        engine.add_path(Point::new(0, 1), Point::new(2, 0)).unwrap();
        let view = engine.view();
        assert_eq!(view.cell(Point::new(1, 0)), Some(CellStyle::Wall));
        assert_eq!(view.cell(Point::new(2, 0)), Some(CellStyle::Weighted(4.0)));
        assert_eq!(view.cell(Point::new(0, 1)), Some(CellStyle::Free));
        assert_eq!(view.cell(Point::new(3, 0)), None);
        assert_eq!(view.walkers.len(), 1);
        assert_eq!(view.walkers[0].id, id);
        assert_eq!(view.walkers[0].target, Point::new(2, 1));
        assert!(view.walkers[0].target_visible);
        assert_eq!(view.paths.len(), 1);
        assert_eq!(view.paths[0].last(), Some(&Point::new(2, 0)));
    }

    #[test]
    fn polyline_uses_cell_centres() {
        let tile = TileSize::new(10.0, 20.0);
        let line = polyline(&[Point::new(0, 0), Point::new(1, 1)], &tile);
        assert_eq!(line, vec![PixelPos::new(5.0, 10.0), PixelPos::new(15.0, 30.0)]);
    }
}
