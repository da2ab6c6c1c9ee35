//! # pathfinding_fx
//!
//! The engine behind an animated grid-pathfinding effect. A weighted grid is searched with
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm), where a cell's weight is the cost of
//! stepping onto it and a weight of 0 marks a wall. Diagonal steps cost √2 times the weight and
//! are only taken when neither orthogonal corner is a wall. On top of the search sit walkers
//! that glide from cell to cell on a fixed timestep, replan whenever they reach a waypoint or the
//! grid changes, and ask a [GoalPolicy] where to go once they run out of path.
//!
//! Drawing and input handling are left to the host: it feeds edits and frame timestamps into a
//! [PathfindingEngine] and draws what [PathfindingEngine::view] returns.
//!
//! ```
//! use grid_util::point::Point;
//! use pathfinding_fx::{EngineConfig, PathfindingEngine};
//!
//! let mut rows = vec![vec![1u8; 5]; 5];
//! rows[2] = vec![0, 0, 1, 0, 0];
//! let engine = PathfindingEngine::new(&rows, EngineConfig::default()).unwrap();
//! let path = engine.find_path(Point::new(0, 0), Point::new(0, 4)).unwrap();
//! assert!(path.contains(&Point::new(2, 2)));
//! ```
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod goal;
pub mod interaction;
pub mod matrix;
pub mod motion;
pub mod neighbors;
pub mod search;
pub mod view;
pub mod weight_grid;

pub use clock::AnimationClock;
pub use config::{EngineConfig, Heuristic, PixelPos, SearchOptions, TileSize};
pub use engine::{PathId, PathfindingEngine, StaticPath, WalkerEvent};
pub use error::{ConfigError, Result};
pub use goal::{GoalPolicy, GoalSequence, HoldPosition, RandomReachableGoal, ReachableSet};
pub use interaction::{CellContext, EntityRef};
pub use matrix::SearchMatrix;
pub use motion::{MotionState, Target, TargetId, Walker, WalkerId};
pub use search::{AstarSolver, ReachableCell};
pub use view::{CellStyle, FrameView, WalkerView};
pub use weight_grid::WeightGrid;

/// Upper bound on the number of neighbours of a cell.
pub const N_SMALLVEC_SIZE: usize = 8;
