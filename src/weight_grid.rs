use core::fmt;

use grid_util::grid::{Grid, SimpleGrid};
use grid_util::point::Point;
use itertools::Itertools;
use log::info;
use petgraph::unionfind::UnionFind;

use crate::error::{ConfigError, Result};

/// Weight of a freshly opened cell.
pub const FREE: f64 = 1.0;
/// Weight of a wall.
pub const WALL: f64 = 0.0;

/// The weight grid stores one traversal cost per cell, with 0 marking a wall. In addition it
/// maintains connected components of the passable cells in a [UnionFind] so that searches
/// between disconnected cells can be refused without flood-filling.
///
/// Components are built from the 4-neighbourhood only. Since a diagonal step requires both
/// orthogonal corner cells to be passable, it never joins cells that are not already
/// orthogonally connected, so the components are exact for 8-connected movement as well.
#[derive(Clone, Debug)]
pub struct WeightGrid {
    grid: SimpleGrid<f64>,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
    version: u64,
}

impl WeightGrid {
    /// Creates a grid with every cell set to `weight`.
    pub fn new(width: usize, height: usize, weight: f64) -> Result<WeightGrid> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        check_weight(0, 0, weight)?;
        Ok(<WeightGrid as Grid<f64>>::new(width, height, weight))
    }

    /// Builds a grid from rows of weights. Rows are indexed by `y`, columns by `x`.
    pub fn from_rows<R, T>(rows: &[R]) -> Result<WeightGrid>
    where
        R: AsRef<[T]>,
        T: Copy + Into<f64>,
    {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        let mut values = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(ConfigError::RaggedGrid {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            for (x, w) in row.iter().enumerate() {
                let w: f64 = (*w).into();
                check_weight(x as i32, y as i32, w)?;
                values.push(w);
            }
        }
        Ok(WeightGrid::from_simple(SimpleGrid {
            width,
            height,
            values,
        }))
    }

    fn from_simple(grid: SimpleGrid<f64>) -> WeightGrid {
        let mut weight_grid = WeightGrid {
            components: UnionFind::new(grid.width * grid.height),
            grid,
            components_dirty: false,
            version: 0,
        };
        weight_grid.generate_components();
        weight_grid
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }
    pub fn height(&self) -> usize {
        self.grid.height()
    }
    /// Incremented on every effective mutation; anything computed against an older version is
    /// stale.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn check_bounds(&self, point: Point) -> Result<()> {
        if self.point_in_bounds(point) {
            Ok(())
        } else {
            Err(ConfigError::OutOfBounds {
                x: point.x,
                y: point.y,
                width: self.width(),
                height: self.height(),
            })
        }
    }

    /// Weight of a cell, `None` outside the grid.
    pub fn weight(&self, point: Point) -> Option<f64> {
        self.point_in_bounds(point)
            .then(|| self.grid.get_point(point))
    }
    /// Whether a cell is inside the grid and not a wall.
    pub fn is_passable(&self, point: Point) -> bool {
        self.weight(point).is_some_and(|w| w > WALL)
    }

    /// Sets the weight of a cell after checking the cell and the weight.
    pub fn set_weight(&mut self, point: Point, weight: f64) -> Result<()> {
        self.check_bounds(point)?;
        check_weight(point.x, point.y, weight)?;
        self.set_point(point, weight);
        Ok(())
    }

    /// All four orthogonal neighbours are walls or outside the grid.
    pub fn is_enclosed(&self, point: Point) -> bool {
        point
            .neumann_neighborhood()
            .into_iter()
            .all(|n| !self.is_passable(n))
    }

    /// Checks if start and goal are passable cells on the same connected component. Returns
    /// `None` while the components are dirty, in which case only a search can tell.
    pub fn reachable(&self, start: &Point, goal: &Point) -> Option<bool> {
        if self.components_dirty {
            return None;
        }
        if !self.is_passable(*start) || !self.is_passable(*goal) {
            return Some(false);
        }
        Some(
            self.components
                .equiv(self.get_ix_point(start), self.get_ix_point(goal)),
        )
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            info!("Components are dirty: regenerating components");
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up passable grid neighbours to the same
    /// components.
    pub fn generate_components(&mut self) {
        self.components = UnionFind::new(self.width() * self.height());
        self.components_dirty = false;
        for (y, x) in (0..self.height() as i32).cartesian_product(0..self.width() as i32) {
            let point = Point::new(x, y);
            if !self.is_passable(point) {
                continue;
            }
            let parent_ix = self.get_ix_point(&point);
            for n in [Point::new(point.x + 1, point.y), Point::new(point.x, point.y + 1)] {
                if self.is_passable(n) {
                    let ix = self.get_ix_point(&n);
                    self.components.union(parent_ix, ix);
                }
            }
        }
    }

    /// Iterates over all cells in row-major order together with their weights.
    pub fn cells(&self) -> impl Iterator<Item = (Point, f64)> + '_ {
        (0..self.height() as i32)
            .cartesian_product(0..self.width() as i32)
            .map(move |(y, x)| {
                let p = Point::new(x, y);
                (p, self.grid.get_point(p))
            })
    }

    /// Copies the weights back out as rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.grid
            .values
            .chunks(self.width())
            .map(|row| row.to_vec())
            .collect()
    }
}

impl Grid<f64> for WeightGrid {
    /// Unchecked constructor; [WeightGrid::new] validates its arguments first.
    fn new(width: usize, height: usize, default_value: f64) -> Self {
        WeightGrid::from_simple(SimpleGrid::new(width, height, default_value))
    }
    fn get(&self, x: usize, y: usize) -> f64 {
        self.grid.get(x, y)
    }
    /// Updates a cell. Joins newly connected components and flags the components as dirty if a
    /// passable cell becomes a wall, since that may split a component.
    fn set(&mut self, x: usize, y: usize, weight: f64) {
        let old = self.grid.get(x, y);
        if old == weight {
            return;
        }
        self.grid.set(x, y, weight);
        self.version += 1;
        let p = Point::new(x as i32, y as i32);
        if old > WALL && weight <= WALL {
            self.components_dirty = true;
        } else if old <= WALL && weight > WALL {
            let p_ix = self.get_ix(x, y);
            for n in p.neumann_neighborhood() {
                if self.is_passable(n) {
                    self.components.union(p_ix, self.get_ix_point(&n));
                }
            }
        }
    }
    fn width(&self) -> usize {
        self.grid.width()
    }
    fn height(&self) -> usize {
        self.grid.height()
    }
}

fn check_weight(x: i32, y: i32, weight: f64) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight { x, y, weight })
    }
}

impl fmt::Display for WeightGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Grid:")?;
        for row in self.grid.values.chunks(self.width()) {
            writeln!(f, "{:?}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let rows = vec![vec![1u8, 1, 1], vec![1, 1]];
        assert_eq!(
            WeightGrid::from_rows(&rows).unwrap_err(),
            ConfigError::RaggedGrid {
                row: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn rejects_empty_and_negative() {
        let empty: Vec<Vec<u8>> = vec![];
        assert_eq!(WeightGrid::from_rows(&empty).unwrap_err(), ConfigError::EmptyGrid);
        let rows = vec![vec![1.0, -2.0]];
        assert!(matches!(
            WeightGrid::from_rows(&rows),
            Err(ConfigError::InvalidWeight { x: 1, y: 0, .. })
        ));
    }

    /// Tests whether points are correctly mapped to different connected components
    #[test]
    fn test_component_generation() {
        // |.#.|
        // |.#.|
        let rows = vec![vec![1u8, 0, 1], vec![1, 0, 1]];
        let grid = WeightGrid::from_rows(&rows).unwrap();
        assert_eq!(grid.reachable(&Point::new(0, 0), &Point::new(0, 1)), Some(true));
        assert_eq!(grid.reachable(&Point::new(0, 0), &Point::new(2, 0)), Some(false));
        assert_eq!(grid.reachable(&Point::new(0, 0), &Point::new(1, 0)), Some(false));
    }

    #[test]
    fn walling_marks_components_dirty() {
        let mut grid = WeightGrid::new(3, 1, FREE).unwrap();
        let a = Point::new(0, 0);
        let b = Point::new(2, 0);
        assert_eq!(grid.reachable(&a, &b), Some(true));
        grid.set_weight(Point::new(1, 0), WALL).unwrap();
        assert!(grid.components_dirty);
        assert_eq!(grid.reachable(&a, &b), None);
        grid.update();
        assert_eq!(grid.reachable(&a, &b), Some(false));
        // Reopening joins components without a rebuild.
        grid.set_weight(Point::new(1, 0), 3.0).unwrap();
        assert!(!grid.components_dirty);
        assert_eq!(grid.reachable(&a, &b), Some(true));
    }

    #[test]
    fn version_tracks_effective_changes() {
        let mut grid = WeightGrid::new(2, 2, FREE).unwrap();
        grid.set_weight(Point::new(1, 1), FREE).unwrap();
        assert_eq!(grid.version(), 0);
        grid.set_weight(Point::new(1, 1), WALL).unwrap();
        assert_eq!(grid.version(), 1);
        assert!(grid.set_weight(Point::new(2, 0), WALL).is_err());
    }

    #[test]
    fn grid_trait_access() {
        let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 0.0, 6.0]];
        let mut grid = WeightGrid::from_rows(&rows).unwrap();
        assert_eq!(grid.get(2, 1), 6.0);
        assert_eq!(grid.get_point(Point::new(0, 1)), 4.0);
        assert_eq!(grid.get_ix_point(&Point::new(1, 1)), 4);
        assert!(grid.point_in_bounds(Point::new(2, 1)));
        assert!(!grid.point_in_bounds(Point::new(3, 0)));
        assert_eq!(grid.to_rows(), rows);
        // Setting through the trait keeps the components current.
        grid.set_point(Point::new(1, 0), WALL);
        grid.set_point(Point::new(1, 1), FREE);
        assert!(grid.components_dirty);
        grid.update();
        assert_eq!(grid.reachable(&Point::new(0, 0), &Point::new(2, 0)), Some(true));
        assert_eq!(grid.version(), 2);
    }

    #[test]
    fn enclosed_cell() {
        // |.#.|
        // |#.#|
        // |.#.|
        let rows = vec![vec![1u8, 0, 1], vec![0, 1, 0], vec![1, 0, 1]];
        let grid = WeightGrid::from_rows(&rows).unwrap();
        assert!(grid.is_enclosed(Point::new(1, 1)));
        assert!(grid.is_enclosed(Point::new(0, 0)));
    }
}
