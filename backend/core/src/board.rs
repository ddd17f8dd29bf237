//! The shared grid and its merge operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cell::{Cell, CellUpdate};
use crate::error::GridError;

/// Largest allowed width or height.
pub const MAX_DIMENSION: u32 = 64;

/// Result of merging one `update` command into a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Wrong length or field types; nothing was applied.
    Invalid,
    /// Every position was stale or content-identical.
    Unchanged,
    /// At least one cell was committed.
    Changed,
}

/// Author-side bootstrap format: dimensions plus the solid mask.
#[derive(Debug, Clone, Deserialize)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub grid: Vec<bool>,
}

/// Persisted board: `{width, height, grid}` in row-major order.
///
/// Dimensions and the solid mask never change after construction; only the
/// mutable cell fields move, through [`Board::merge_update`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    width: u32,
    height: u32,
    grid: Vec<Cell>,
}

impl Board {
    /// Build a fresh board from an uploaded layout.
    pub fn from_layout(layout: &Layout) -> Result<Self, GridError> {
        check_dimensions(layout.width, layout.height, layout.grid.len())?;
        Ok(Self {
            width: layout.width,
            height: layout.height,
            grid: layout.grid.iter().map(|&solid| Cell::empty(solid)).collect(),
        })
    }

    /// Parse and validate a persisted board.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GridError> {
        let board: Board = serde_json::from_slice(bytes)?;
        check_dimensions(board.width, board.height, board.grid.len())?;
        let corrupt_solid = board
            .grid
            .iter()
            .any(|c| c.solid && (!c.letter.is_empty() || !c.author.is_empty() || c.certain));
        if corrupt_solid {
            return Err(GridError::MalformedBoard("solid cell carries content"));
        }
        Ok(board)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, GridError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cells(&self) -> &[Cell] {
        &self.grid
    }

    /// Merge a client's view of the whole grid into this board.
    ///
    /// The update is all-or-nothing: a structural problem anywhere rejects
    /// every position.
    pub fn merge_update(&mut self, data: &Value) -> MergeOutcome {
        let updates: Vec<CellUpdate> = match serde_json::from_value(data.clone()) {
            Ok(updates) => updates,
            Err(_) => return MergeOutcome::Invalid,
        };
        if updates.len() != self.grid.len() {
            return MergeOutcome::Invalid;
        }

        let mut changed = false;
        let merged: Vec<Cell> = self
            .grid
            .iter()
            .zip(&updates)
            .map(|(current, incoming)| match current.apply(incoming) {
                Some(next) => {
                    changed = true;
                    next
                }
                None => current.clone(),
            })
            .collect();

        if !changed {
            return MergeOutcome::Unchanged;
        }
        self.grid = merged;
        MergeOutcome::Changed
    }
}

fn check_dimensions(width: u32, height: u32, len: usize) -> Result<(), GridError> {
    if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
        return Err(GridError::MalformedBoard("dimensions out of range"));
    }
    if len != (width * height) as usize {
        return Err(GridError::MalformedBoard("grid size does not match dimensions"));
    }
    Ok(())
}
