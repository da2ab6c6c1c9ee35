use grid_util::grid::{Grid, SimpleGrid};
use grid_util::point::Point;

use crate::weight_grid::{WeightGrid, WALL};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VisitState {
    #[default]
    Unvisited,
    Open,
    Closed,
}

/// Per-cell search record. Lives for exactly one search.
#[derive(Clone, Copy, Debug)]
pub struct SearchNode {
    pub position: Point,
    pub weight: f64,
    pub g: f64,
    pub f: f64,
    pub h: f64,
    pub parent: Option<usize>,
    pub state: VisitState,
    /// Position in which the cell first entered the open set, used to break ties.
    pub order: usize,
}

/// Scratch matrix built from a [WeightGrid] at the start of every search, so no state can
/// leak from one query into the next. Nodes are addressed by their row-major grid index.
#[derive(Clone, Debug)]
pub struct SearchMatrix {
    nodes: SimpleGrid<SearchNode>,
}

impl SearchMatrix {
    /// Copies the weights and resets g, f and parent links. O(width * height).
    pub fn build(grid: &WeightGrid) -> SearchMatrix {
        let values = grid
            .cells()
            .map(|(position, weight)| SearchNode {
                position,
                weight,
                g: 0.0,
                f: 0.0,
                h: 0.0,
                parent: None,
                state: VisitState::Unvisited,
                order: 0,
            })
            .collect();
        SearchMatrix {
            nodes: SimpleGrid {
                width: grid.width(),
                height: grid.height(),
                values,
            },
        }
    }

    pub fn width(&self) -> usize {
        self.nodes.width()
    }
    pub fn height(&self) -> usize {
        self.nodes.height()
    }

    pub fn index(&self, point: Point) -> Option<usize> {
        self.nodes
            .point_in_bounds(point)
            .then(|| self.nodes.get_ix_point(&point))
    }

    pub fn node(&self, ix: usize) -> &SearchNode {
        &self.nodes.values[ix]
    }
    pub fn node_mut(&mut self, ix: usize) -> &mut SearchNode {
        &mut self.nodes.values[ix]
    }
    pub fn get(&self, point: Point) -> Option<SearchNode> {
        self.nodes
            .point_in_bounds(point)
            .then(|| self.nodes.get_point(point))
    }

    /// Whether a cell exists and has nonzero weight.
    pub fn passable(&self, point: Point) -> bool {
        self.get(point).is_some_and(|n| n.weight > WALL)
    }

    /// Walks the parent links back from `ix` and returns the positions from the root onward.
    pub fn trace_back(&self, ix: usize) -> Vec<Point> {
        let mut path = std::iter::successors(Some(ix), |&i| self.node(i).parent)
            .map(|i| self.node(i).position)
            .collect::<Vec<_>>();
        path.reverse();
        path
    }
}
