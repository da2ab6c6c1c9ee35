use fxhash::FxBuildHasher;
use grid_util::grid::Grid;
use grid_util::point::Point;
use indexmap::IndexMap;
use log::{debug, info};

use crate::clock::AnimationClock;
use crate::config::{EngineConfig, SearchOptions};
use crate::error::{ConfigError, Result};
use crate::goal::{GoalPolicy, HoldPosition, ReachableSet};
use crate::motion::{MotionState, Target, TargetId, Walker, WalkerId};
use crate::search::{AstarSolver, ReachableCell};
use crate::weight_grid::WeightGrid;

pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(usize);

/// A fixed pair of endpoints whose path is kept current across grid edits.
#[derive(Clone, Debug)]
pub struct StaticPath {
    pub from: Point,
    pub to: Point,
    pub path: Vec<Point>,
}

/// Notifications for the host, queued in the order they happen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WalkerEvent {
    /// The walker snapped onto the next cell of its path.
    PositionChanged { walker: WalkerId, cell: Point },
    /// The walker stands on its target.
    PathEnd { walker: WalkerId, cell: Point },
    /// The target cannot be reached from where the walker stands.
    NoPath { walker: WalkerId, target: Point },
    /// All four orthogonal neighbours of the walker are walls.
    Trapped { walker: WalkerId, cell: Point },
    /// The goal policy moved the walker's target.
    GoalAssigned { walker: WalkerId, target: Point },
}

/// Owns the weight grid, the walkers with their targets and any static paths, and keeps every
/// path consistent with the grid. All mutation goes through `&mut self`, so there is exactly one
/// thread of control.
pub struct PathfindingEngine {
    pub(crate) config: EngineConfig,
    pub(crate) grid: WeightGrid,
    pub(crate) solver: AstarSolver,
    pub(crate) clock: AnimationClock,
    pub(crate) walkers: FxIndexMap<WalkerId, Walker>,
    pub(crate) targets: FxIndexMap<TargetId, Target>,
    pub(crate) paths: FxIndexMap<PathId, StaticPath>,
    pub(crate) policy: Box<dyn GoalPolicy>,
    pub(crate) events: Vec<WalkerEvent>,
    pub(crate) dragging: Option<crate::interaction::EntityRef>,
    next_id: usize,
}

impl PathfindingEngine {
    /// Builds an engine over rows of weights. Walkers stop at their targets until a different
    /// [GoalPolicy] is installed.
    pub fn new<R, T>(rows: &[R], config: EngineConfig) -> Result<PathfindingEngine>
    where
        R: AsRef<[T]>,
        T: Copy + Into<f64>,
    {
        let grid = WeightGrid::from_rows(rows)?;
        PathfindingEngine::with_grid(grid, config)
    }

    pub fn with_grid(grid: WeightGrid, config: EngineConfig) -> Result<PathfindingEngine> {
        config.validate()?;
        Ok(PathfindingEngine {
            solver: AstarSolver::new(config.search),
            clock: AnimationClock::from_config(&config),
            config,
            grid,
            walkers: FxIndexMap::default(),
            targets: FxIndexMap::default(),
            paths: FxIndexMap::default(),
            policy: Box::new(HoldPosition),
            events: Vec::new(),
            dragging: None,
            next_id: 0,
        })
    }

    pub fn set_goal_policy(&mut self, policy: Box<dyn GoalPolicy>) {
        self.policy = policy;
    }

    pub fn with_goal_policy(mut self, policy: Box<dyn GoalPolicy>) -> PathfindingEngine {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
    pub fn grid(&self) -> &WeightGrid {
        &self.grid
    }
    pub fn solver(&self) -> &AstarSolver {
        &self.solver
    }

    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    /// Searches with the configured [SearchOptions].
    pub fn find_path(&self, from: Point, to: Point) -> Result<Vec<Point>> {
        self.solver.find_path(&self.grid, from, to)
    }

    /// Searches with options for this call only; walkers keep using the configured ones.
    pub fn find_path_with(
        &self,
        from: Point,
        to: Point,
        options: SearchOptions,
    ) -> Result<Vec<Point>> {
        AstarSolver::new(options).find_path(&self.grid, from, to)
    }

    pub fn reachable_positions(&self, from: Point) -> Result<Vec<ReachableCell>> {
        self.solver.reachable_positions(&self.grid, from)
    }

    pub fn find_flood(&self, from: Point, to: Point, greedy: bool) -> Result<Vec<ReachableCell>> {
        self.solver.find_flood(&self.grid, from, to, greedy)
    }

    pub fn find_flood_with(
        &self,
        from: Point,
        to: Point,
        options: SearchOptions,
        greedy: bool,
    ) -> Result<Vec<ReachableCell>> {
        AstarSolver::new(options).find_flood(&self.grid, from, to, greedy)
    }

    /// Adds a walker on `from` heading for a new target on `to`, moving at `speed` px/s or the
    /// configured default. The walker plans immediately; if it is already on its target or
    /// cannot reach it, the goal policy is consulted right away.
    pub fn add_walker(&mut self, from: Point, to: Point, speed: Option<f64>) -> Result<WalkerId> {
        self.grid.check_bounds(from)?;
        self.grid.check_bounds(to)?;
        let speed = speed.unwrap_or(self.config.default_speed);
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::InvalidConfig(format!(
                "walker speed must be positive, got {}",
                speed
            )));
        }
        let walker_id = WalkerId(self.next_id());
        let target_id = TargetId(self.next_id());
        self.targets.insert(
            target_id,
            Target {
                id: target_id,
                cell: to,
                owner: walker_id,
                visible: true,
                hovered: false,
            },
        );
        self.walkers.insert(
            walker_id,
            Walker::new(walker_id, from, target_id, speed, &self.config.tile),
        );
        self.replan_walker(walker_id);
        Ok(walker_id)
    }

    /// Removes a walker together with its target.
    pub fn remove_walker(&mut self, id: WalkerId) -> Result<()> {
        let walker = self
            .walkers
            .shift_remove(&id)
            .ok_or(ConfigError::UnknownWalker(id))?;
        self.targets.shift_remove(&walker.target);
        Ok(())
    }

    pub fn set_speed(&mut self, id: WalkerId, speed: f64) -> Result<()> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::InvalidConfig(format!(
                "walker speed must be positive, got {}",
                speed
            )));
        }
        let walker = self
            .walkers
            .get_mut(&id)
            .ok_or(ConfigError::UnknownWalker(id))?;
        walker.speed = speed;
        Ok(())
    }

    pub fn walker(&self, id: WalkerId) -> Option<&Walker> {
        self.walkers.get(&id)
    }
    pub fn walkers(&self) -> impl Iterator<Item = &Walker> {
        self.walkers.values()
    }
    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(&id)
    }
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }
    /// The target a walker is heading for.
    pub fn target_of(&self, id: WalkerId) -> Option<&Target> {
        self.walkers
            .get(&id)
            .and_then(|w| self.targets.get(&w.target))
    }

    /// Adds a static path between two cells. It is recomputed on every grid change.
    pub fn add_path(&mut self, from: Point, to: Point) -> Result<PathId> {
        let path = self.solver.find_path(&self.grid, from, to)?;
        let id = PathId(self.next_id());
        self.paths.insert(id, StaticPath { from, to, path });
        Ok(id)
    }
    pub fn path(&self, id: PathId) -> Option<&StaticPath> {
        self.paths.get(&id)
    }
    pub fn paths(&self) -> impl Iterator<Item = &StaticPath> {
        self.paths.values()
    }
    pub fn clear_paths(&mut self) {
        self.paths.clear();
    }

    /// Replaces the grid wholesale. Walkers and targets outside the new bounds are pulled onto
    /// the nearest edge cell; every path is recomputed. Static paths whose endpoints no longer
    /// exist are dropped.
    pub fn update_grid<R, T>(&mut self, rows: &[R]) -> Result<()>
    where
        R: AsRef<[T]>,
        T: Copy + Into<f64>,
    {
        let grid = WeightGrid::from_rows(rows)?;
        info!(
            "Replacing {}x{} grid with {}x{}",
            self.grid.width(),
            self.grid.height(),
            grid.width(),
            grid.height()
        );
        self.grid = grid;
        let clamp = |p: Point, grid: &WeightGrid| {
            Point::new(
                p.x.clamp(0, grid.width() as i32 - 1),
                p.y.clamp(0, grid.height() as i32 - 1),
            )
        };
        for walker in self.walkers.values_mut() {
            if !self.grid.point_in_bounds(walker.cell) {
                let cell = clamp(walker.cell, &self.grid);
                walker.place(cell, &self.config.tile);
            }
        }
        for target in self.targets.values_mut() {
            target.cell = clamp(target.cell, &self.grid);
        }
        let grid = &self.grid;
        self.paths
            .retain(|_, p| grid.point_in_bounds(p.from) && grid.point_in_bounds(p.to));
        self.grid_changed();
        Ok(())
    }

    /// Runs one fixed-length simulation step for every walker that is not being dragged.
    pub fn tick(&mut self, dt_ms: f64) {
        let ids = self.walkers.keys().copied().collect::<Vec<_>>();
        for id in ids {
            let arrived = match self.walkers.get_mut(&id) {
                Some(walker) => walker.advance(dt_ms, &self.config.tile),
                None => continue,
            };
            if let Some(cell) = arrived {
                self.events
                    .push(WalkerEvent::PositionChanged { walker: id, cell });
                self.replan_walker(id);
            }
        }
    }

    /// Feeds an animation-frame timestamp to the clock and runs the ticks it yields. Returns the
    /// number of ticks run.
    pub fn frame(&mut self, timestamp_ms: f64) -> usize {
        let ticks = self.clock.frame(timestamp_ms);
        let dt = self.clock.timestep_ms();
        for _ in 0..ticks {
            self.tick(dt);
        }
        ticks
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }
    pub fn clock_mut(&mut self) -> &mut AnimationClock {
        &mut self.clock
    }

    /// Takes the queued events.
    pub fn drain_events(&mut self) -> Vec<WalkerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Brings components up to date and replans everything that depends on the grid.
    pub(crate) fn grid_changed(&mut self) {
        self.grid.update();
        let ids = self.walkers.keys().copied().collect::<Vec<_>>();
        for id in ids {
            self.replan_walker(id);
        }
        for path in self.paths.values_mut() {
            path.path = self
                .solver
                .find_path(&self.grid, path.from, path.to)
                .unwrap_or_default();
        }
    }

    /// Replans one walker and, unless it is being dragged, reacts to the outcome: a trapped
    /// walker hides its target, and a walker without a way forward raises [WalkerEvent::PathEnd]
    /// or [WalkerEvent::NoPath] and asks the goal policy for a new target once.
    pub(crate) fn replan_walker(&mut self, id: WalkerId) {
        let Some(state) = self.plan(id) else {
            return;
        };
        let hovered = self.walkers.get(&id).is_some_and(|w| w.hovered);
        if hovered {
            return;
        }
        if self.report(id, state) {
            self.assign_next_goal(id);
        }
    }

    /// Replans without reporting the outcome. Keeps the target hidden while the walker is
    /// trapped.
    fn plan(&mut self, id: WalkerId) -> Option<MotionState> {
        let walker = self.walkers.get_mut(&id)?;
        let target = self.targets.get_mut(&walker.target)?;
        let state = walker.replan(&self.grid, &self.solver, target.cell);
        target.visible = state != MotionState::Idle { trapped: true };
        Some(state)
    }

    /// Queues the event for a replan outcome. Returns whether the walker has run out of path
    /// and needs a new goal.
    fn report(&mut self, id: WalkerId, state: MotionState) -> bool {
        let Some(walker) = self.walkers.get(&id) else {
            return false;
        };
        let cell = walker.cell;
        let target = self
            .targets
            .get(&walker.target)
            .map(|t| t.cell)
            .unwrap_or(cell);
        let event = match state {
            MotionState::Following => return false,
            MotionState::Idle { trapped: true } => {
                self.events.push(WalkerEvent::Trapped { walker: id, cell });
                return false;
            }
            MotionState::Arrived => WalkerEvent::PathEnd { walker: id, cell },
            MotionState::Idle { trapped: false } => WalkerEvent::NoPath { walker: id, target },
        };
        self.events.push(event);
        true
    }

    /// Asks the goal policy for a new target and replans towards it. The outcome of that replan
    /// is reported, but the policy is not asked a second time.
    fn assign_next_goal(&mut self, id: WalkerId) {
        let Some(walker) = self.walkers.get(&id) else {
            return;
        };
        let occupied = self.occupancy_except(walker.id, walker.target);
        let next = {
            let reachable = ReachableSet::lazy(&self.solver, &self.grid, walker.cell, &occupied);
            self.policy.select_next(walker, &reachable)
        };
        let Some(next) = next else {
            return;
        };
        let target_id = walker.target;
        if !self.grid.is_passable(next) || occupied.contains(&next) {
            debug!("Goal policy picked unusable cell {} for {:?}", next, id);
            return;
        }
        let Some(target) = self.targets.get_mut(&target_id) else {
            return;
        };
        if target.cell == next {
            return;
        }
        target.cell = next;
        self.events.push(WalkerEvent::GoalAssigned {
            walker: id,
            target: next,
        });
        if let Some(state) = self.plan(id) {
            self.report(id, state);
        }
    }
}
