//! Weighted A* over a [WeightGrid], in two flavours: a goal-directed path search and an
//! exhaustive flood that reports every reachable cell with its accumulated cost.
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f64::consts::SQRT_2;

use grid_util::point::Point;
use log::{debug, warn};
use num_traits::Zero;
use ordered_float::OrderedFloat;

use crate::config::SearchOptions;
use crate::error::Result;
use crate::matrix::{SearchMatrix, VisitState};
use crate::neighbors::{is_diagonal, neighbors};
use crate::weight_grid::WeightGrid;

type Cost = OrderedFloat<f64>;

struct SmallestCostHolder {
    estimated_cost: Cost,
    heuristic: Cost,
    cost: Cost,
    order: usize,
    index: usize,
}

impl Eq for SmallestCostHolder {}

impl PartialEq for SmallestCostHolder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for SmallestCostHolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestCostHolder {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lowest f first, then lowest h, then whichever cell entered the open set first
        other
            .estimated_cost
            .cmp(&self.estimated_cost)
            .then_with(|| other.heuristic.cmp(&self.heuristic))
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// One cell of a flood, with the cost of the cheapest known way to reach it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReachableCell {
    pub position: Point,
    pub cost: f64,
    /// The cell lies on one of the eight compass rays from the origin and the ray up to it is
    /// unobstructed.
    pub linear: bool,
}

/// Cost of stepping onto `to`: its weight, scaled by √2 for a diagonal step.
pub fn step_cost(weight: f64, from: &Point, to: &Point) -> f64 {
    if is_diagonal(from, to) {
        weight * SQRT_2
    } else {
        weight
    }
}

#[derive(Clone, Debug, Default)]
pub struct AstarSolver {
    pub options: SearchOptions,
}

impl AstarSolver {
    pub fn new(options: SearchOptions) -> AstarSolver {
        AstarSolver { options }
    }

    /// Computes the cheapest path from `from` to `to`, both included. Returns an empty path when
    /// `to` cannot be reached or either endpoint is a wall, and `[from]` when the endpoints are
    /// equal. Only coordinates outside the grid are an error.
    pub fn find_path(&self, grid: &WeightGrid, from: Point, to: Point) -> Result<Vec<Point>> {
        grid.check_bounds(from)?;
        grid.check_bounds(to)?;
        if !grid.is_passable(from) || !grid.is_passable(to) {
            debug!("{} or {} is a wall, no path", from, to);
            return Ok(Vec::new());
        }
        if from == to {
            return Ok(vec![from]);
        }
        let known_reachable = grid.reachable(&from, &to);
        if known_reachable == Some(false) {
            debug!("{} is not reachable from {}", to, from);
            return Ok(Vec::new());
        }
        let mut matrix = SearchMatrix::build(grid);
        let heuristic = self.options.heuristic;
        let found = self.expand(
            &mut matrix,
            from,
            |p| heuristic.estimate(p, &to),
            |p| *p == to,
            None,
        );
        match found {
            Some(ix) => Ok(matrix.trace_back(ix)),
            None => {
                if known_reachable == Some(true) {
                    warn!("Reachable goal {} could not be pathed to from {}", to, from);
                }
                Ok(Vec::new())
            }
        }
    }

    /// Floods outward from `from` without a goal and returns every reachable cell, `from`
    /// included, in order of non-decreasing cost.
    pub fn reachable_positions(&self, grid: &WeightGrid, from: Point) -> Result<Vec<ReachableCell>> {
        grid.check_bounds(from)?;
        if !grid.is_passable(from) {
            return Ok(Vec::new());
        }
        let mut matrix = SearchMatrix::build(grid);
        let mut expanded = Vec::new();
        self.expand(&mut matrix, from, |_| 0.0, |_| false, Some(&mut expanded));
        Ok(self.annotate(&matrix, from, &expanded))
    }

    /// The cells in the order A* expands them while searching from `from` towards `to`. With
    /// `greedy` the flood stops as soon as `to` is expanded, otherwise it drains the open set.
    pub fn find_flood(
        &self,
        grid: &WeightGrid,
        from: Point,
        to: Point,
        greedy: bool,
    ) -> Result<Vec<ReachableCell>> {
        grid.check_bounds(from)?;
        grid.check_bounds(to)?;
        if !grid.is_passable(from) {
            return Ok(Vec::new());
        }
        let mut matrix = SearchMatrix::build(grid);
        let mut expanded = Vec::new();
        let heuristic = self.options.heuristic;
        self.expand(
            &mut matrix,
            from,
            |p| heuristic.estimate(p, &to),
            |p| greedy && *p == to,
            Some(&mut expanded),
        );
        Ok(self.annotate(&matrix, from, &expanded))
    }

    /// Sums the step costs along a path. Cells outside the grid count as walls.
    pub fn path_cost(&self, grid: &WeightGrid, path: &[Point]) -> f64 {
        path.windows(2)
            .map(|pair| step_cost(grid.weight(pair[1]).unwrap_or(0.0), &pair[0], &pair[1]))
            .sum()
    }

    /// The shared expansion loop. Cells enter the open set at most once and are never reopened
    /// after being closed; a cheaper route to an open cell pushes a fresh heap entry and the
    /// outdated one is skipped when popped.
    fn expand<FH, FS>(
        &self,
        matrix: &mut SearchMatrix,
        start: Point,
        mut heuristic: FH,
        mut success: FS,
        mut expanded: Option<&mut Vec<usize>>,
    ) -> Option<usize>
    where
        FH: FnMut(&Point) -> f64,
        FS: FnMut(&Point) -> bool,
    {
        let start_ix = matrix.index(start)?;
        let h = heuristic(&start);
        {
            let node = matrix.node_mut(start_ix);
            node.g = 0.0;
            node.h = h;
            node.f = h;
            node.state = VisitState::Open;
            node.order = 0;
        }
        let mut next_order = 1;
        let mut to_see = BinaryHeap::new();
        to_see.push(SmallestCostHolder {
            estimated_cost: OrderedFloat(h),
            heuristic: OrderedFloat(h),
            cost: Cost::zero(),
            order: 0,
            index: start_ix,
        });
        while let Some(SmallestCostHolder { cost, index, .. }) = to_see.pop() {
            let (current, current_g) = {
                let node = matrix.node(index);
                // The same cell may sit in the heap several times if a cheaper route was found
                // later; only the entry carrying the current g counts.
                if node.state == VisitState::Closed || cost.0 > node.g {
                    continue;
                }
                (node.position, node.g)
            };
            if let Some(out) = expanded.as_mut() {
                out.push(index);
            }
            if success(&current) {
                return Some(index);
            }
            matrix.node_mut(index).state = VisitState::Closed;

            for n in neighbors(matrix, current, self.options.allow_diagonal) {
                let Some(ni) = matrix.index(n) else {
                    continue;
                };
                let (state, weight, old_g) = {
                    let node = matrix.node(ni);
                    (node.state, node.weight, node.g)
                };
                let g = current_g + step_cost(weight, &current, &n);
                match state {
                    VisitState::Closed => continue,
                    VisitState::Open if g >= old_g => continue,
                    VisitState::Open => {}
                    VisitState::Unvisited => {
                        let h = heuristic(&n);
                        let node = matrix.node_mut(ni);
                        node.h = h;
                        node.order = next_order;
                        node.state = VisitState::Open;
                        next_order += 1;
                    }
                }
                let node = matrix.node_mut(ni);
                node.g = g;
                node.f = g + node.h;
                node.parent = Some(index);
                to_see.push(SmallestCostHolder {
                    estimated_cost: OrderedFloat(node.f),
                    heuristic: OrderedFloat(node.h),
                    cost: OrderedFloat(g),
                    order: node.order,
                    index: ni,
                });
            }
        }
        None
    }

    fn annotate(&self, matrix: &SearchMatrix, origin: Point, expanded: &[usize]) -> Vec<ReachableCell> {
        expanded
            .iter()
            .map(|&ix| {
                let node = matrix.node(ix);
                ReachableCell {
                    position: node.position,
                    cost: node.g,
                    linear: self.is_linear(matrix, origin, node.position),
                }
            })
            .collect()
    }

    /// Walks the compass ray from `origin` to `cell`, if there is one, checking every step.
    fn is_linear(&self, matrix: &SearchMatrix, origin: Point, cell: Point) -> bool {
        let dx = cell.x - origin.x;
        let dy = cell.y - origin.y;
        let straight = dx == 0 || dy == 0;
        let diagonal = dx.abs() == dy.abs();
        if !(straight || (diagonal && self.options.allow_diagonal)) {
            return false;
        }
        let (sx, sy) = (dx.signum(), dy.signum());
        let mut current = origin;
        while current != cell {
            let next = Point::new(current.x + sx, current.y + sy);
            if !neighbors(matrix, current, self.options.allow_diagonal).contains(&next) {
                return false;
            }
            current = next;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Heuristic;

    fn gap_grid() -> WeightGrid {
        let mut rows = vec![vec![1u8; 5]; 5];
        rows[2] = vec![0, 0, 1, 0, 0];
        WeightGrid::from_rows(&rows).unwrap()
    }

    /// Asserts that the case in which start and goal are equal is handled correctly.
    #[test]
    fn equal_start_goal() {
        for allow_diag in [false, true] {
            let grid = WeightGrid::new(1, 1, 1.0).unwrap();
            let solver = AstarSolver::new(SearchOptions::new(Heuristic::Manhattan, allow_diag));
            let start = Point::new(0, 0);
            let path = solver.find_path(&grid, start, start).unwrap();
            assert_eq!(path, vec![start]);
        }
    }

    #[test]
    fn routes_through_gap() {
        let mut grid = gap_grid();
        let solver = AstarSolver::default();
        let from = Point::new(0, 0);
        let to = Point::new(0, 4);
        let path = solver.find_path(&grid, from, to).unwrap();
        assert_eq!(path.first(), Some(&from));
        assert_eq!(path.last(), Some(&to));
        assert!(path.contains(&Point::new(2, 2)));

        grid.set_weight(Point::new(2, 2), 0.0).unwrap();
        assert!(solver.find_path(&grid, from, to).unwrap().is_empty());
        // Same answer once the components are rebuilt.
        grid.update();
        assert!(solver.find_path(&grid, from, to).unwrap().is_empty());
    }

    /// Asserts that the optimal solution is found around a single wall.
    #[test]
    fn solve_simple_problem() {
        for (allow_diag, expected) in [(false, 5), (true, 5)] {
            let mut grid = WeightGrid::new(3, 3, 1.0).unwrap();
            grid.set_weight(Point::new(1, 1), 0.0).unwrap();
            grid.update();
            let solver = AstarSolver::new(SearchOptions::new(Heuristic::Euclidean, allow_diag));
            let path = solver
                .find_path(&grid, Point::new(0, 0), Point::new(2, 2))
                .unwrap();
            assert_eq!(path.len(), expected);
            assert_eq!(solver.path_cost(&grid, &path), 4.0);
        }
    }

    #[test]
    fn diagonal_cost_is_scaled() {
        let grid = WeightGrid::new(2, 2, 3.0).unwrap();
        let solver = AstarSolver::new(SearchOptions::new(Heuristic::Euclidean, true));
        let path = solver
            .find_path(&grid, Point::new(0, 0), Point::new(1, 1))
            .unwrap();
        assert_eq!(path, vec![Point::new(0, 0), Point::new(1, 1)]);
        assert!((solver.path_cost(&grid, &path) - 3.0 * SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn avoids_expensive_terrain() {
        // A 3-wide corridor whose middle row is swamp.
        let rows = vec![
            vec![1.0, 1.0, 1.0, 1.0, 1.0],
            vec![1.0, 9.0, 9.0, 9.0, 1.0],
            vec![1.0, 1.0, 1.0, 1.0, 1.0],
        ];
        let grid = WeightGrid::from_rows(&rows).unwrap();
        let solver = AstarSolver::new(SearchOptions::new(Heuristic::Manhattan, false));
        let path = solver
            .find_path(&grid, Point::new(0, 1), Point::new(4, 1))
            .unwrap();
        assert!(path.iter().all(|p| grid.weight(*p) == Some(1.0)));
        assert_eq!(solver.path_cost(&grid, &path), 6.0);
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let grid = WeightGrid::new(2, 2, 1.0).unwrap();
        let solver = AstarSolver::default();
        assert!(solver
            .find_path(&grid, Point::new(0, 0), Point::new(5, 0))
            .is_err());
        assert!(solver.reachable_positions(&grid, Point::new(-1, 0)).is_err());
    }

    #[test]
    fn wall_endpoints_have_no_path() {
        let rows = vec![vec![1u8, 0, 1]];
        let grid = WeightGrid::from_rows(&rows).unwrap();
        let solver = AstarSolver::default();
        assert!(solver
            .find_path(&grid, Point::new(0, 0), Point::new(1, 0))
            .unwrap()
            .is_empty());
        assert!(solver
            .find_path(&grid, Point::new(1, 0), Point::new(1, 0))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn flood_reports_costs_in_order() {
        let grid = gap_grid();
        let solver = AstarSolver::new(SearchOptions::new(Heuristic::Manhattan, false));
        let flood = solver.reachable_positions(&grid, Point::new(0, 0)).unwrap();
        // 25 cells minus 4 walls
        assert_eq!(flood.len(), 21);
        assert_eq!(flood[0].position, Point::new(0, 0));
        assert_eq!(flood[0].cost, 0.0);
        assert!(flood.windows(2).all(|w| w[0].cost <= w[1].cost));
        let below = flood
            .iter()
            .find(|c| c.position == Point::new(0, 4))
            .unwrap();
        // across to the gap, through it, and back
        assert_eq!(below.cost, 8.0);
    }

    #[test]
    fn linear_corridors() {
        let grid = gap_grid();
        let solver = AstarSolver::default();
        let flood = solver.reachable_positions(&grid, Point::new(2, 0)).unwrap();
        let linear = |p: Point| flood.iter().find(|c| c.position == p).unwrap().linear;
        assert!(linear(Point::new(2, 4)));
        assert!(linear(Point::new(4, 0)));
        assert!(linear(Point::new(3, 1)));
        assert!(!linear(Point::new(0, 4)));
        assert!(!linear(Point::new(3, 4)));
    }

    #[test]
    fn greedy_flood_stops_at_goal() {
        let grid = WeightGrid::new(6, 6, 1.0).unwrap();
        let solver = AstarSolver::default();
        let from = Point::new(0, 0);
        let to = Point::new(3, 0);
        let greedy = solver.find_flood(&grid, from, to, true).unwrap();
        assert_eq!(greedy.last().map(|c| c.position), Some(to));
        let full = solver.find_flood(&grid, from, to, false).unwrap();
        assert_eq!(full.len(), 36);
        assert!(greedy.len() < full.len());
    }

    #[test]
    fn deterministic_paths() {
        let grid = WeightGrid::new(8, 8, 1.0).unwrap();
        let solver = AstarSolver::default();
        let first = solver
            .find_path(&grid, Point::new(0, 0), Point::new(7, 5))
            .unwrap();
        for _ in 0..5 {
            assert_eq!(
                solver
                    .find_path(&grid, Point::new(0, 0), Point::new(7, 5))
                    .unwrap(),
                first
            );
        }
    }
}
