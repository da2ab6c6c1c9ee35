use std::f64::consts::SQRT_2;

use grid_util::point::Point;
use log::{debug, warn};

use crate::config::{PixelPos, TileSize};
use crate::search::AstarSolver;
use crate::weight_grid::WeightGrid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalkerId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    /// No usable path. `trapped` means all four orthogonal neighbours are walls, in which case
    /// no search was attempted.
    Idle { trapped: bool },
    /// Moving along a path of at least two cells.
    Following,
    /// Standing on the target.
    Arrived,
}

/// The cell a walker is heading for. Kept apart from the walker so it can be moved on its own;
/// the walker refers to it by id.
#[derive(Clone, Debug)]
pub struct Target {
    pub(crate) id: TargetId,
    pub(crate) cell: Point,
    pub(crate) owner: WalkerId,
    pub(crate) visible: bool,
    pub(crate) hovered: bool,
}

impl Target {
    pub fn id(&self) -> TargetId {
        self.id
    }
    pub fn cell(&self) -> Point {
        self.cell
    }
    pub fn owner(&self) -> WalkerId {
        self.owner
    }
    /// Hidden while the owner is trapped.
    pub fn visible(&self) -> bool {
        self.visible
    }
    pub fn hovered(&self) -> bool {
        self.hovered
    }
}

/// A mobile node. Its discrete cell only changes on arrival at a waypoint, while the pixel
/// position glides between cells tick by tick.
#[derive(Clone, Debug)]
pub struct Walker {
    pub(crate) id: WalkerId,
    pub(crate) cell: Point,
    pub(crate) position: PixelPos,
    pub(crate) target: TargetId,
    pub(crate) path: Vec<Point>,
    pub(crate) speed: f64,
    pub(crate) hovered: bool,
    pub(crate) state: MotionState,
}

impl Walker {
    pub(crate) fn new(
        id: WalkerId,
        cell: Point,
        target: TargetId,
        speed: f64,
        tile: &TileSize,
    ) -> Walker {
        Walker {
            id,
            cell,
            position: tile.pixel_of(cell),
            target,
            path: Vec::new(),
            speed,
            hovered: false,
            state: MotionState::Idle { trapped: false },
        }
    }

    pub fn id(&self) -> WalkerId {
        self.id
    }
    pub fn cell(&self) -> Point {
        self.cell
    }
    pub fn position(&self) -> PixelPos {
        self.position
    }
    pub fn target(&self) -> TargetId {
        self.target
    }
    pub fn path(&self) -> &[Point] {
        &self.path
    }
    /// Pixels per second.
    pub fn speed(&self) -> f64 {
        self.speed
    }
    pub fn hovered(&self) -> bool {
        self.hovered
    }
    pub fn state(&self) -> MotionState {
        self.state
    }
    /// The next cell on the path, if the walker is moving.
    pub fn next_waypoint(&self) -> Option<Point> {
        match self.state {
            MotionState::Following => self.path.get(1).copied(),
            _ => None,
        }
    }

    /// Places the walker on a cell, snapping the pixel position. The path is left untouched and
    /// must be replanned by the caller.
    pub(crate) fn place(&mut self, cell: Point, tile: &TileSize) {
        self.cell = cell;
        self.position = tile.pixel_of(cell);
    }

    /// Recomputes the path from the current cell to `goal`. An enclosed cell is reported as
    /// trapped without searching.
    pub(crate) fn replan(
        &mut self,
        grid: &WeightGrid,
        solver: &AstarSolver,
        goal: Point,
    ) -> MotionState {
        if grid.is_enclosed(self.cell) {
            debug!("Walker {:?} at {} is trapped", self.id, self.cell);
            self.path.clear();
            self.state = MotionState::Idle { trapped: true };
            return self.state;
        }
        self.path = solver
            .find_path(grid, self.cell, goal)
            .unwrap_or_else(|err| {
                warn!("Walker {:?} could not plan: {}", self.id, err);
                Vec::new()
            });
        self.state = match self.path.len() {
            0 => MotionState::Idle { trapped: false },
            1 => MotionState::Arrived,
            _ => MotionState::Following,
        };
        self.state
    }

    /// Moves the walker one tick of `dt_ms` towards its next waypoint. Returns the waypoint when
    /// it is reached during this tick, at which point the discrete cell and the pixel position
    /// both sit exactly on it and the path needs replanning.
    pub(crate) fn advance(&mut self, dt_ms: f64, tile: &TileSize) -> Option<Point> {
        if self.hovered {
            return None;
        }
        let waypoint = self.next_waypoint()?;
        let goal = tile.pixel_of(waypoint);
        let travel = self.speed * dt_ms / 1000.0;
        if self.position.manhattan_distance(&goal) <= travel {
            self.place(waypoint, tile);
            return Some(waypoint);
        }
        let dx = goal.x - self.position.x;
        let dy = goal.y - self.position.y;
        let moving_x = dx.abs() > f64::EPSILON;
        let moving_y = dy.abs() > f64::EPSILON;
        let per_axis = if moving_x && moving_y {
            travel / SQRT_2
        } else {
            travel
        };
        if moving_x {
            self.position.x += dx.signum() * per_axis.min(dx.abs());
        }
        if moving_y {
            self.position.y += dy.signum() * per_axis.min(dy.abs());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchOptions;

    fn walker_on(grid: &WeightGrid, from: Point, to: Point, speed: f64) -> Walker {
        let tile = TileSize::new(10.0, 10.0);
        let mut walker = Walker::new(WalkerId(0), from, TargetId(0), speed, &tile);
        walker.replan(grid, &AstarSolver::new(SearchOptions::default()), to);
        walker
    }

    #[test]
    fn already_there() {
        let grid = WeightGrid::new(3, 3, 1.0).unwrap();
        let mut walker = walker_on(&grid, Point::new(0, 0), Point::new(0, 0), 100.0);
        assert_eq!(walker.state(), MotionState::Arrived);
        let before = walker.position();
        assert_eq!(walker.advance(1000.0, &TileSize::new(10.0, 10.0)), None);
        assert_eq!(walker.position(), before);
    }

    #[test]
    fn trapped_skips_search() {
        // |.#.|
        // |#.#|
        // |.#.|
        let rows = vec![vec![1u8, 0, 1], vec![0, 1, 0], vec![1, 0, 1]];
        let grid = WeightGrid::from_rows(&rows).unwrap();
        let walker = walker_on(&grid, Point::new(1, 1), Point::new(0, 0), 100.0);
        assert_eq!(walker.state(), MotionState::Idle { trapped: true });
        assert!(walker.path().is_empty());
    }

    #[test]
    fn glides_then_snaps() {
        let grid = WeightGrid::new(3, 1, 1.0).unwrap();
        let tile = TileSize::new(10.0, 10.0);
        // 40 px/s with 100 ms ticks: 4 px per tick
        let mut walker = walker_on(&grid, Point::new(0, 0), Point::new(2, 0), 40.0);
        assert_eq!(walker.state(), MotionState::Following);
        assert_eq!(walker.advance(100.0, &tile), None);
        assert_eq!(walker.position(), PixelPos::new(4.0, 0.0));
        assert_eq!(walker.cell(), Point::new(0, 0));
        assert_eq!(walker.advance(100.0, &tile), None);
        // 2 px left, less than one tick of travel
        assert_eq!(walker.advance(100.0, &tile), Some(Point::new(1, 0)));
        assert_eq!(walker.cell(), Point::new(1, 0));
        assert_eq!(walker.position(), PixelPos::new(10.0, 0.0));
    }

    #[test]
    fn diagonal_speed_is_normalised() {
        let grid = WeightGrid::new(2, 2, 1.0).unwrap();
        let tile = TileSize::new(10.0, 10.0);
        let mut walker = walker_on(&grid, Point::new(0, 0), Point::new(1, 1), 10.0 * SQRT_2);
        assert_eq!(walker.next_waypoint(), Some(Point::new(1, 1)));
        assert_eq!(walker.advance(100.0, &tile), None);
        let pos = walker.position();
        assert!((pos.x - 1.0).abs() < 1e-9);
        assert!((pos.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hovered_walker_does_not_move() {
        let grid = WeightGrid::new(3, 1, 1.0).unwrap();
        let mut walker = walker_on(&grid, Point::new(0, 0), Point::new(2, 0), 40.0);
        walker.hovered = true;
        assert_eq!(walker.advance(100.0, &TileSize::new(10.0, 10.0)), None);
        assert_eq!(walker.position(), PixelPos::new(0.0, 0.0));
    }
}
