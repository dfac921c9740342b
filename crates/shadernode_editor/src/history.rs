// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of graph operations.
//!
//! Each entry is an operation object that captured, while it was applied,
//! everything needed to revert it. The history can drive operations directly
//! against a material (single-threaded use) or hand them out one at a time
//! for the [`GraphExecutor`](crate::executor::GraphExecutor) to run on the
//! engine thread.

use crate::events::GraphEvent;
use crate::operation::{GraphOperation, OperationError};
use shadernode_graph::MaterialDef;
use std::collections::VecDeque;
use thiserror::Error;

/// Maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Another operation is still being applied
    #[error("An operation is already in flight")]
    Busy,

    /// The engine thread is gone
    #[error("Engine thread disconnected")]
    Disconnected,

    /// The engine thread could not be started
    #[error("Failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The operation failed
    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Direction an operation is run in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// First application, recorded as a new entry
    Execute,
    /// Revert the latest entry
    Undo,
    /// Re-apply the latest undone entry
    Redo,
}

impl Direction {
    /// Run an operation in this direction
    pub fn run(
        self,
        operation: &mut dyn GraphOperation,
        material: &mut MaterialDef,
    ) -> std::result::Result<Vec<GraphEvent>, OperationError> {
        tracing::debug!("{self:?}: {} on material {}", operation.description(), material.name);
        match self {
            Self::Execute | Self::Redo => operation.redo(material),
            Self::Undo => operation.undo(material),
        }
    }
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStats {
    /// Total operations in undo stack
    pub undo_count: usize,
    /// Total operations in redo stack
    pub redo_count: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    /// Undo stack, oldest first
    undo_stack: VecDeque<Box<dyn GraphOperation>>,
    /// Redo stack
    redo_stack: Vec<Box<dyn GraphOperation>>,
    /// Maximum history depth
    max_depth: usize,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record an applied operation as the newest entry
    pub fn record(&mut self, operation: Box<dyn GraphOperation>) {
        self.redo_stack.clear();
        self.push_undo(operation);
    }

    /// Put an operation back on the undo stack without touching redo
    pub fn push_undo(&mut self, operation: Box<dyn GraphOperation>) {
        self.undo_stack.push_back(operation);
        while self.undo_stack.len() > self.max_depth {
            if let Some(dropped) = self.undo_stack.pop_front() {
                tracing::trace!("History full, dropping '{}'", dropped.description());
            }
        }
    }

    /// Put an operation on the redo stack
    pub fn push_redo(&mut self, operation: Box<dyn GraphOperation>) {
        self.redo_stack.push(operation);
    }

    /// Take the operation to undo next
    pub fn take_undo(&mut self) -> Result<Box<dyn GraphOperation>> {
        self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)
    }

    /// Take the operation to redo next
    pub fn take_redo(&mut self) -> Result<Box<dyn GraphOperation>> {
        self.redo_stack.pop().ok_or(HistoryError::NothingToRedo)
    }

    /// Apply an operation and record it
    pub fn execute(
        &mut self,
        material: &mut MaterialDef,
        mut operation: Box<dyn GraphOperation>,
    ) -> Result<Vec<GraphEvent>> {
        let events = Direction::Execute.run(operation.as_mut(), material)?;
        self.record(operation);
        Ok(events)
    }

    /// Undo the last operation
    pub fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>> {
        let mut operation = self.take_undo()?;
        match Direction::Undo.run(operation.as_mut(), material) {
            Ok(events) => {
                self.push_redo(operation);
                Ok(events)
            }
            Err(e) => {
                self.push_undo(operation);
                Err(e.into())
            }
        }
    }

    /// Redo the last undone operation
    pub fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>> {
        let mut operation = self.take_redo()?;
        match Direction::Redo.run(operation.as_mut(), material) {
            Ok(events) => {
                self.push_undo(operation);
                Ok(events)
            }
            Err(e) => {
                self.push_redo(operation);
                Err(e.into())
            }
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            max_depth: self.max_depth,
        }
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|op| op.description())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|op| op.description())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
