use thiserror::Error;

use crate::motion::{TargetId, WalkerId};

/// Caller contract violations. Unreachable goals and refused edits are not errors and never
/// show up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("weight grid has no cells")]
    EmptyGrid,

    #[error("weight grid is not rectangular: row {row} has {found} columns, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid weight {weight} at ({x}, {y}): weights must be finite and non-negative")]
    InvalidWeight { x: i32, y: i32, weight: f64 },

    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    #[error("unknown walker {0:?}")]
    UnknownWalker(WalkerId),

    #[error("unknown target {0:?}")]
    UnknownTarget(TargetId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
