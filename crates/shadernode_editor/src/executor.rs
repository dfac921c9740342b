// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two-thread operation executor.
//!
//! The engine thread owns the [`MaterialDef`] and is the only place it is
//! mutated. The UI side owns the [`History`] and posts one task at a time
//! over a channel without waiting for it. Gestures are planned on the engine
//! thread against the live graph and applied right away. When the engine is
//! done, the operation travels back together with the events it produced;
//! the UI side then dispatches those events to its observer and files the
//! operation on the right stack. A second submission while one is in flight
//! is refused with [`HistoryError::Busy`].

use crate::config::EditorConfig;
use crate::events::{GraphEvent, GraphObserver, Location};
use crate::gesture;
use crate::history::{Direction, History, HistoryError, Result};
use crate::operation::{GraphOperation, OperationError};
use crate::operations::RemoveShaderNodeOperation;
use shadernode_graph::{MaterialDef, ShaderNodeDefinition, ShaderNodeVariable, VariableMapping};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type InspectFn = Box<dyn FnOnce(&MaterialDef) + Send>;

/// Operation resolved from a gesture, `None` when it would change nothing
type Planned = std::result::Result<Option<Box<dyn GraphOperation>>, OperationError>;

type PlanFn = Box<dyn FnOnce(&MaterialDef) -> Planned + Send>;

/// Work sent to the engine thread
enum EngineTask {
    Apply {
        operation: Box<dyn GraphOperation>,
        direction: Direction,
    },
    Plan(PlanFn),
    Inspect(InspectFn),
    Shutdown,
}

/// Outcome of a task coming back from the engine thread.
///
/// `operation` is `None` when planning found nothing to do or rejected the
/// gesture.
struct Completion {
    operation: Option<Box<dyn GraphOperation>>,
    direction: Direction,
    result: std::result::Result<Vec<GraphEvent>, OperationError>,
}

fn apply(
    material: &mut MaterialDef,
    mut operation: Box<dyn GraphOperation>,
    direction: Direction,
) -> Completion {
    let result = direction.run(operation.as_mut(), material);
    if let Err(e) = &result {
        tracing::warn!("'{}' failed: {e}", operation.description());
    }
    Completion {
        operation: Some(operation),
        direction,
        result,
    }
}

fn plan(material: &mut MaterialDef, build: PlanFn) -> Completion {
    let result = match build(material) {
        Ok(Some(operation)) => return apply(material, operation, Direction::Execute),
        Ok(None) => {
            tracing::debug!("Gesture would not change the graph, skipped");
            Ok(Vec::new())
        }
        Err(e) => {
            tracing::warn!("Gesture rejected: {e}");
            Err(e)
        }
    };
    Completion {
        operation: None,
        direction: Direction::Execute,
        result,
    }
}

fn engine_loop(
    mut material: MaterialDef,
    tasks: Receiver<EngineTask>,
    completions: Sender<Completion>,
) -> MaterialDef {
    tracing::info!("Engine thread started for material {}", material.name);
    while let Ok(task) = tasks.recv() {
        let completion = match task {
            EngineTask::Apply {
                operation,
                direction,
            } => apply(&mut material, operation, direction),
            EngineTask::Plan(build) => plan(&mut material, build),
            EngineTask::Inspect(inspect) => {
                inspect(&material);
                continue;
            }
            EngineTask::Shutdown => break,
        };
        if completions.send(completion).is_err() {
            break;
        }
    }
    tracing::info!("Engine thread stopped");
    material
}

/// Runs graph operations on an engine thread and keeps their history
pub struct GraphExecutor {
    tasks: Sender<EngineTask>,
    completions: Receiver<Completion>,
    engine: Option<JoinHandle<MaterialDef>>,
    history: History,
    in_flight: Option<Direction>,
    active_technique: String,
}

impl GraphExecutor {
    /// Move the material onto a new engine thread
    pub fn spawn(
        material: MaterialDef,
        active_technique: impl Into<String>,
        config: &EditorConfig,
    ) -> Result<Self> {
        let (tasks, task_rx) = mpsc::channel();
        let (completion_tx, completions) = mpsc::channel();
        let engine = thread::Builder::new()
            .name(config.engine_thread_name.clone())
            .spawn(move || engine_loop(material, task_rx, completion_tx))?;

        Ok(Self {
            tasks,
            completions,
            engine: Some(engine),
            history: History::with_max_depth(config.history_depth),
            in_flight: None,
            active_technique: active_technique.into(),
        })
    }

    /// Technique new gestures apply to
    pub fn active_technique(&self) -> &str {
        &self.active_technique
    }

    /// Switch the technique new gestures apply to
    pub fn set_active_technique(&mut self, name: impl Into<String>) {
        self.active_technique = name.into();
    }

    /// The undo/redo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Drop every history entry
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Whether an operation is being applied
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_busy() {
            tracing::warn!("Refusing submission, an operation is in flight");
            return Err(HistoryError::Busy);
        }
        Ok(())
    }

    fn submit(&mut self, operation: Box<dyn GraphOperation>, direction: Direction) -> Result<()> {
        self.tasks
            .send(EngineTask::Apply { operation, direction })
            .map_err(|_| HistoryError::Disconnected)?;
        self.in_flight = Some(direction);
        Ok(())
    }

    /// Submit a new operation
    pub fn execute(&mut self, operation: Box<dyn GraphOperation>) -> Result<()> {
        self.ensure_idle()?;
        self.submit(operation, Direction::Execute)
    }

    /// Submit an undo of the latest entry
    pub fn undo(&mut self) -> Result<()> {
        self.ensure_idle()?;
        let operation = self.history.take_undo()?;
        self.submit(operation, Direction::Undo)
    }

    /// Submit a redo of the latest undone entry
    pub fn redo(&mut self) -> Result<()> {
        self.ensure_idle()?;
        let operation = self.history.take_redo()?;
        self.submit(operation, Direction::Redo)
    }

    /// Run a read-only closure on the engine thread and return its result.
    ///
    /// Blocks until every task submitted before it has been processed.
    pub fn inspect<R, F>(&self, inspect: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&MaterialDef) -> R + Send + 'static,
    {
        let (reply, result) = mpsc::channel();
        self.tasks
            .send(EngineTask::Inspect(Box::new(move |material: &MaterialDef| {
                let _ = reply.send(inspect(material));
            })))
            .map_err(|_| HistoryError::Disconnected)?;
        result.recv().map_err(|_| HistoryError::Disconnected)
    }

    /// Whether `source` could be attached to `target` in the active technique.
    ///
    /// This is a query and waits for the engine thread to answer.
    pub fn can_attach(
        &self,
        source: ShaderNodeVariable,
        target: ShaderNodeVariable,
    ) -> Result<bool> {
        let technique = self.active_technique.clone();
        self.inspect(move |material| {
            let Ok(technique) = material.technique(&technique) else {
                return false;
            };
            match (
                gesture::Endpoint::source(material, technique, &source),
                gesture::Endpoint::target(material, technique, &target),
            ) {
                (Ok(source), Ok(target)) => gesture::can_attach(&source, &target),
                _ => false,
            }
        })
    }

    fn submit_plan<F>(&mut self, build: F) -> Result<()>
    where
        F: FnOnce(&MaterialDef, &str) -> Planned + Send + 'static,
    {
        self.ensure_idle()?;
        let technique = self.active_technique.clone();
        let task = EngineTask::Plan(Box::new(move |material: &MaterialDef| {
            build(material, &technique)
        }));
        self.tasks.send(task).map_err(|_| HistoryError::Disconnected)?;
        self.in_flight = Some(Direction::Execute);
        Ok(())
    }

    /// Attach `source` to `target` in the active technique.
    ///
    /// The gesture is resolved on the engine thread. A rejected gesture is
    /// reported when the task completes, and a mapping that is already in
    /// place completes without touching the history.
    pub fn attach(&mut self, source: ShaderNodeVariable, target: ShaderNodeVariable) -> Result<()> {
        self.submit_plan(move |material, technique| {
            gesture::plan_attach(material, technique, &source, &target)
        })
    }

    /// Detach a mapping from a node of the active technique
    pub fn detach(&mut self, node: impl Into<String>, mapping: VariableMapping) -> Result<()> {
        let node = node.into();
        self.submit_plan(move |material, technique| {
            let operation = gesture::plan_detach(material, technique, &node, &mapping)?;
            Ok(Some(Box::new(operation) as Box<dyn GraphOperation>))
        })
    }

    /// Add a node for a definition.
    ///
    /// The node's unique name is picked on the engine thread and reported
    /// through the added-node notification.
    pub fn add_node(
        &mut self,
        definition: Arc<ShaderNodeDefinition>,
        location: Location,
    ) -> Result<()> {
        self.submit_plan(move |material, technique| {
            let operation = gesture::plan_add_node(material, technique, definition, location)?;
            Ok(Some(Box::new(operation) as Box<dyn GraphOperation>))
        })
    }

    /// Remove a node of the active technique
    pub fn remove_node(&mut self, name: impl Into<String>, location: Location) -> Result<()> {
        let operation =
            RemoveShaderNodeOperation::new(self.active_technique.clone(), name, location);
        self.execute(Box::new(operation))
    }

    /// Handle a finished operation if there is one, without blocking.
    ///
    /// Returns whether an operation finished.
    pub fn pump(&mut self, observer: &mut dyn GraphObserver) -> Result<bool> {
        if self.in_flight.is_none() {
            return Ok(false);
        }
        match self.completions.try_recv() {
            Ok(completion) => self.complete(completion, observer).map(|()| true),
            Err(TryRecvError::Empty) => Ok(false),
            Err(TryRecvError::Disconnected) => Err(self.disconnected()),
        }
    }

    /// Block until the operation in flight, if any, has finished
    pub fn wait(&mut self, observer: &mut dyn GraphObserver) -> Result<()> {
        if self.in_flight.is_none() {
            return Ok(());
        }
        match self.completions.recv() {
            Ok(completion) => self.complete(completion, observer),
            Err(_) => Err(self.disconnected()),
        }
    }

    fn disconnected(&mut self) -> HistoryError {
        self.in_flight = None;
        HistoryError::Disconnected
    }

    fn complete(&mut self, completion: Completion, observer: &mut dyn GraphObserver) -> Result<()> {
        self.in_flight = None;
        let Completion {
            operation,
            direction,
            result,
        } = completion;
        let Some(operation) = operation else {
            return result.map(|_| ()).map_err(HistoryError::from);
        };

        match result {
            Ok(events) => {
                for event in &events {
                    tracing::trace!("Dispatching {}", event.kind());
                    event.dispatch(observer);
                }
                match direction {
                    Direction::Execute => self.history.record(operation),
                    Direction::Undo => self.history.push_redo(operation),
                    Direction::Redo => self.history.push_undo(operation),
                }
                Ok(())
            }
            Err(e) => {
                match direction {
                    Direction::Execute => {}
                    Direction::Undo => self.history.push_undo(operation),
                    Direction::Redo => self.history.push_redo(operation),
                }
                Err(e.into())
            }
        }
    }

    /// Stop the engine thread and take the material back.
    ///
    /// Tasks already queued are processed first.
    pub fn shutdown(mut self) -> Result<MaterialDef> {
        let engine = self.engine.take().ok_or(HistoryError::Disconnected)?;
        let _ = self.tasks.send(EngineTask::Shutdown);
        engine.join().map_err(|_| HistoryError::Disconnected)
    }
}

impl Drop for GraphExecutor {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            let _ = self.tasks.send(EngineTask::Shutdown);
            if engine.join().is_err() {
                tracing::error!("Engine thread panicked");
            }
        }
    }
}
