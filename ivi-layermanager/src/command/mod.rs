//! Commands: named, self-describing scene mutations.
//!
//! A communicator decodes each client request into a [`Command`] and hands it
//! to a [`CommandExecutor`](crate::CommandExecutor). Synchronous commands are
//! applied at once; asynchronous ones wait in their sender's queue until that
//! sender issues a [`CommandKind::Commit`], which applies the whole queue
//! under a single scene lock.

mod kind;

use std::fmt;

use ivi_scene::{Pid, SceneError, SceneState};

pub use kind::CommandKind;

/// When a command takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionType {
    /// Applied immediately in the calling thread.
    Synchronous,
    /// Queued per sender until the sender commits.
    Asynchronous,
}

/// Outcome of executing a command.
///
/// Failure is a value, never a panic: an unknown id or a rejected value
/// yields `Failed` and leaves the rest of the scene untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionResult {
    Success,
    /// Succeeded and changed something the renderer must repaint.
    SuccessRedraw,
    Failed,
    /// At least one part of a batch failed while another part needs a repaint.
    FailedRedraw,
}

impl ExecutionResult {
    pub fn from_parts(failed: bool, redraw: bool) -> Self {
        match (failed, redraw) {
            (false, false) => ExecutionResult::Success,
            (false, true) => ExecutionResult::SuccessRedraw,
            (true, false) => ExecutionResult::Failed,
            (true, true) => ExecutionResult::FailedRedraw,
        }
    }

    pub fn needs_redraw(self) -> bool {
        matches!(self, ExecutionResult::SuccessRedraw | ExecutionResult::FailedRedraw)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, ExecutionResult::Failed | ExecutionResult::FailedRedraw)
    }

    /// Folds the result of another command of the same batch into this one.
    pub fn combine(self, other: ExecutionResult) -> Self {
        Self::from_parts(self.is_failure() || other.is_failure(), self.needs_redraw() || other.needs_redraw())
    }
}

impl From<Result<bool, SceneError>> for ExecutionResult {
    fn from(outcome: Result<bool, SceneError>) -> Self {
        match outcome {
            Ok(redraw) => ExecutionResult::from_parts(false, redraw),
            Err(_) => ExecutionResult::Failed,
        }
    }
}

/// A client request, immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    sender: Pid,
    execution_type: ExecutionType,
    kind: CommandKind,
}

impl Command {
    /// Wraps `kind` with its default execution type.
    ///
    /// Creation, removal, shader management and `Commit` run synchronously so
    /// the client learns the outcome at once. Property and membership changes
    /// are queued until the next commit.
    pub fn new(sender: Pid, kind: CommandKind) -> Self {
        let execution_type = match kind {
            CommandKind::CreateLayer { .. }
            | CommandKind::RemoveLayer(_)
            | CommandKind::CreateSurface { .. }
            | CommandKind::RemoveSurface(_)
            | CommandKind::CreateShader { .. }
            | CommandKind::DestroyShader(_)
            | CommandKind::Commit => ExecutionType::Synchronous,
            _ => ExecutionType::Asynchronous,
        };
        Self { sender, execution_type, kind }
    }

    pub fn synchronous(sender: Pid, kind: CommandKind) -> Self {
        Self::new(sender, kind).with_execution_type(ExecutionType::Synchronous)
    }

    pub fn asynchronous(sender: Pid, kind: CommandKind) -> Self {
        Self::new(sender, kind).with_execution_type(ExecutionType::Asynchronous)
    }

    /// Overrides the execution type. A commit is always synchronous.
    pub fn with_execution_type(mut self, execution_type: ExecutionType) -> Self {
        if !self.is_commit() {
            self.execution_type = execution_type;
        }
        self
    }

    pub fn sender(&self) -> Pid {
        self.sender
    }

    pub fn execution_type(&self) -> ExecutionType {
        self.execution_type
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn is_commit(&self) -> bool {
        matches!(self.kind, CommandKind::Commit)
    }

    /// Applies this command inside an already locked scene.
    ///
    /// A commit applies the batch carried by `context` in FIFO order; one
    /// failing command does not stop the rest.
    pub fn execute(&self, context: &mut ExecutionContext<'_>) -> ExecutionResult {
        if self.is_commit() {
            let batch = std::mem::take(&mut context.batch);
            return batch
                .iter()
                .fold(ExecutionResult::Success, |result, queued| result.combine(context.apply(queued)));
        }
        context.apply(self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

/// Scene access for one locked execution, plus the rejections it produced.
pub struct ExecutionContext<'a> {
    scene: &'a mut SceneState,
    batch: Vec<Command>,
    rejections: Vec<(String, SceneError)>,
}

impl<'a> ExecutionContext<'a> {
    /// `batch` is the sender's drained asynchronous queue; empty unless the
    /// command being executed is a commit.
    pub fn new(scene: &'a mut SceneState, batch: Vec<Command>) -> Self {
        Self { scene, batch, rejections: Vec::new() }
    }

    pub fn scene(&mut self) -> &mut SceneState {
        &mut *self.scene
    }

    /// Description and reason of every command that failed.
    pub fn into_rejections(self) -> Vec<(String, SceneError)> {
        self.rejections
    }

    fn apply(&mut self, command: &Command) -> ExecutionResult {
        match command.kind.apply(self.scene, command.sender) {
            Ok(redraw) => ExecutionResult::from_parts(false, redraw),
            Err(error) => {
                self.rejections.push((command.to_string(), error));
                ExecutionResult::Failed
            }
        }
    }
}
