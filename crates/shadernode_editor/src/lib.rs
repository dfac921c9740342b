// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader node graph editing core.
//!
//! Provides the mutation side of the shader node editor:
//! - Reversible graph operations with undo/redo history
//! - Resolution of attach/detach gestures (legality, swizzles, no-op detection)
//! - An executor applying operations on an engine thread and notifying the UI
//!
//! ## Architecture
//!
//! The material graph lives on the engine thread. The UI thread submits
//! operations through [`GraphExecutor`] and receives [`GraphEvent`]s once
//! they are applied, which it forwards to a [`GraphObserver`]. Only one
//! operation is in flight at a time.

pub mod config;
pub mod events;
pub mod executor;
pub mod gesture;
pub mod history;
pub mod logging;
pub mod operation;
pub mod operations;

pub use config::EditorConfig;
pub use events::{GraphEvent, GraphObserver, Location, NullObserver};
pub use executor::GraphExecutor;
pub use gesture::{can_attach, check_attach, plan_attach, plan_detach, ConnectionError, Endpoint};
pub use history::{Direction, History, HistoryError};
pub use operation::{GraphOperation, MappingSwap, OperationError};
