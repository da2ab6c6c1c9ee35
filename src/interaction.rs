//! Edits coming from the input layer. Every mutation is checked against the occupancy of walkers
//! and targets first; refused edits are silent no-ops reported by a `false` return.
use fxhash::FxHashSet;
use grid_util::point::Point;
use log::debug;

use crate::engine::PathfindingEngine;
use crate::error::{ConfigError, Result};
use crate::motion::{TargetId, WalkerId};
use crate::weight_grid::{FREE, WALL};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Walker(WalkerId),
    Target(TargetId),
}

/// What a pointer press on a cell would grab.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellContext {
    Target(TargetId),
    Walker(WalkerId),
    Wall,
    /// A passable cell with its weight.
    Free(f64),
    Outside,
}

impl PathfindingEngine {
    /// Cells currently occupied by a walker or a target, derived from the entity lists.
    pub fn occupancy(&self) -> FxHashSet<Point> {
        self.walkers
            .values()
            .map(|w| w.cell)
            .chain(self.targets.values().map(|t| t.cell))
            .collect()
    }

    /// Occupancy ignoring one walker and one target, used when moving either of them.
    pub(crate) fn occupancy_except(&self, walker: WalkerId, target: TargetId) -> FxHashSet<Point> {
        self.walkers
            .values()
            .filter(|w| w.id != walker)
            .map(|w| w.cell)
            .chain(
                self.targets
                    .values()
                    .filter(|t| t.id != target)
                    .map(|t| t.cell),
            )
            .collect()
    }

    pub fn is_occupied(&self, cell: Point) -> bool {
        self.walkers.values().any(|w| w.cell == cell)
            || self.targets.values().any(|t| t.cell == cell)
    }

    pub fn is_passable(&self, cell: Point) -> bool {
        self.grid.is_passable(cell)
    }

    /// Targets take precedence over walkers, walkers over the cell itself.
    pub fn context_at(&self, cell: Point) -> CellContext {
        if let Some(t) = self.targets.values().find(|t| t.cell == cell) {
            return CellContext::Target(t.id);
        }
        if let Some(w) = self.walkers.values().find(|w| w.cell == cell) {
            return CellContext::Walker(w.id);
        }
        match self.grid.weight(cell) {
            None => CellContext::Outside,
            Some(w) if w > WALL => CellContext::Free(w),
            Some(_) => CellContext::Wall,
        }
    }

    /// Turns a wall into a free cell or any passable cell into a wall.
    pub fn toggle_cell(&mut self, cell: Point) -> bool {
        match self.grid.weight(cell) {
            Some(w) => self.paint_cell(cell, w > WALL),
            None => false,
        }
    }

    /// Makes a cell a wall or, with `wall == false`, frees it. A drag applies the same mode to
    /// every cell it crosses; cells already in that state are left alone.
    pub fn paint_cell(&mut self, cell: Point, wall: bool) -> bool {
        let Some(current) = self.grid.weight(cell) else {
            return false;
        };
        if wall == (current <= WALL) {
            return false;
        }
        let weight = if wall { WALL } else { FREE };
        self.apply_weight(cell, weight)
    }

    /// Sets an arbitrary terrain weight. Out-of-bounds cells and invalid weights are errors;
    /// occupied cells are refused.
    pub fn set_weight(&mut self, cell: Point, weight: f64) -> Result<bool> {
        self.grid.check_bounds(cell)?;
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(ConfigError::InvalidWeight {
                x: cell.x,
                y: cell.y,
                weight,
            });
        }
        Ok(self.apply_weight(cell, weight))
    }

    fn apply_weight(&mut self, cell: Point, weight: f64) -> bool {
        if self.is_occupied(cell) {
            debug!("Refusing to edit occupied cell {}", cell);
            return false;
        }
        if self.grid.weight(cell) == Some(weight) {
            return false;
        }
        if self.grid.set_weight(cell, weight).is_err() {
            return false;
        }
        self.grid_changed();
        true
    }

    pub fn relocate(&mut self, entity: EntityRef, cell: Point) -> Result<bool> {
        match entity {
            EntityRef::Walker(id) => self.relocate_walker(id, cell),
            EntityRef::Target(id) => self.relocate_target(id, cell),
        }
    }

    /// Moves a walker onto a passable, unoccupied cell and replans it.
    pub fn relocate_walker(&mut self, id: WalkerId, cell: Point) -> Result<bool> {
        let walker = self.walkers.get(&id).ok_or(ConfigError::UnknownWalker(id))?;
        if walker.cell == cell {
            return Ok(false);
        }
        if !self.grid.is_passable(cell) || self.occupancy().contains(&cell) {
            debug!("Refusing to move walker {:?} onto {}", id, cell);
            return Ok(false);
        }
        if let Some(walker) = self.walkers.get_mut(&id) {
            walker.place(cell, &self.config.tile);
        }
        self.replan_walker(id);
        Ok(true)
    }

    /// Moves a target onto a passable, unoccupied cell. Only its owner replans.
    pub fn relocate_target(&mut self, id: TargetId, cell: Point) -> Result<bool> {
        let target = self.targets.get(&id).ok_or(ConfigError::UnknownTarget(id))?;
        if target.cell == cell {
            return Ok(false);
        }
        if !self.grid.is_passable(cell) || self.occupancy().contains(&cell) {
            debug!("Refusing to move target {:?} onto {}", id, cell);
            return Ok(false);
        }
        let owner = target.owner;
        if let Some(target) = self.targets.get_mut(&id) {
            target.cell = cell;
        }
        self.replan_walker(owner);
        Ok(true)
    }

    /// Marks an entity as held by the pointer. A held walker is not moved by ticks.
    pub fn begin_drag(&mut self, entity: EntityRef) -> Result<()> {
        self.end_drag();
        match entity {
            EntityRef::Walker(id) => {
                self.walkers
                    .get_mut(&id)
                    .ok_or(ConfigError::UnknownWalker(id))?
                    .hovered = true;
            }
            EntityRef::Target(id) => {
                self.targets
                    .get_mut(&id)
                    .ok_or(ConfigError::UnknownTarget(id))?
                    .hovered = true;
            }
        }
        self.dragging = Some(entity);
        Ok(())
    }

    /// Releases the held entity and replans its walker.
    pub fn end_drag(&mut self) {
        let Some(entity) = self.dragging.take() else {
            return;
        };
        let owner = match entity {
            EntityRef::Walker(id) => {
                if let Some(walker) = self.walkers.get_mut(&id) {
                    walker.hovered = false;
                }
                id
            }
            EntityRef::Target(id) => match self.targets.get_mut(&id) {
                Some(target) => {
                    target.hovered = false;
                    target.owner
                }
                None => return,
            },
        };
        self.replan_walker(owner);
    }

    pub fn dragging(&self) -> Option<EntityRef> {
        self.dragging
    }
}
