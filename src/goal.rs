use std::cell::OnceCell;

use fxhash::FxHashSet;
use grid_util::point::Point;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::motion::Walker;
use crate::search::{AstarSolver, ReachableCell};
use crate::weight_grid::WeightGrid;

/// Cells a walker can reach from where it stands, minus those occupied by other walkers and
/// targets. The flood behind it only runs the first time a policy looks at the cells.
pub struct ReachableSet<'a> {
    source: Option<FloodSource<'a>>,
    cells: OnceCell<Vec<ReachableCell>>,
}

struct FloodSource<'a> {
    solver: &'a AstarSolver,
    grid: &'a WeightGrid,
    origin: Point,
    occupied: &'a FxHashSet<Point>,
}

impl<'a> ReachableSet<'a> {
    pub(crate) fn lazy(
        solver: &'a AstarSolver,
        grid: &'a WeightGrid,
        origin: Point,
        occupied: &'a FxHashSet<Point>,
    ) -> ReachableSet<'a> {
        ReachableSet {
            source: Some(FloodSource {
                solver,
                grid,
                origin,
                occupied,
            }),
            cells: OnceCell::new(),
        }
    }

    /// A set with known contents.
    pub fn from_cells(cells: Vec<ReachableCell>) -> ReachableSet<'static> {
        ReachableSet {
            source: None,
            cells: OnceCell::from(cells),
        }
    }

    pub fn cells(&self) -> &[ReachableCell] {
        self.cells.get_or_init(|| match &self.source {
            Some(source) => source
                .solver
                .reachable_positions(source.grid, source.origin)
                .unwrap_or_default()
                .into_iter()
                .filter(|c| !source.occupied.contains(&c.position))
                .collect(),
            None => Vec::new(),
        })
    }

    pub fn contains(&self, cell: Point) -> bool {
        self.cells().iter().any(|c| c.position == cell)
    }

    /// Whether the cells have been computed yet.
    pub fn is_computed(&self) -> bool {
        self.cells.get().is_some()
    }
}

/// Decides where a walker goes next once its path has run out, either because it reached its
/// target or because the target cannot be reached. The engine never picks goals on its own.
pub trait GoalPolicy {
    /// Returning `None` leaves the walker idle.
    fn select_next(&mut self, walker: &Walker, reachable: &ReachableSet) -> Option<Point>;
}

/// Never reassigns: walkers stop once they arrive.
#[derive(Clone, Copy, Debug, Default)]
pub struct HoldPosition;

impl GoalPolicy for HoldPosition {
    fn select_next(&mut self, _: &Walker, _: &ReachableSet) -> Option<Point> {
        None
    }
}

/// Picks a uniformly random reachable cell other than the walker's own.
#[derive(Clone, Debug)]
pub struct RandomReachableGoal {
    rng: StdRng,
}

impl RandomReachableGoal {
    pub fn new() -> RandomReachableGoal {
        RandomReachableGoal {
            rng: StdRng::from_entropy(),
        }
    }
    pub fn seeded(seed: u64) -> RandomReachableGoal {
        RandomReachableGoal {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomReachableGoal {
    fn default() -> Self {
        Self::new()
    }
}

impl GoalPolicy for RandomReachableGoal {
    fn select_next(&mut self, walker: &Walker, reachable: &ReachableSet) -> Option<Point> {
        let candidates = reachable
            .cells()
            .iter()
            .filter(|c| c.position != walker.cell())
            .collect::<Vec<_>>();
        candidates.choose(&mut self.rng).map(|c| c.position)
    }
}

/// Patrols a fixed list of cells in order, skipping those that are currently unreachable or
/// where the walker already stands.
#[derive(Clone, Debug)]
pub struct GoalSequence {
    goals: Vec<Point>,
    next: usize,
}

impl GoalSequence {
    pub fn new(goals: Vec<Point>) -> GoalSequence {
        GoalSequence { goals, next: 0 }
    }
}

impl GoalPolicy for GoalSequence {
    fn select_next(&mut self, walker: &Walker, reachable: &ReachableSet) -> Option<Point> {
        for _ in 0..self.goals.len() {
            let goal = self.goals[self.next];
            self.next = (self.next + 1) % self.goals.len();
            if goal != walker.cell() && reachable.contains(goal) {
                return Some(goal);
            }
        }
        None
    }
}
