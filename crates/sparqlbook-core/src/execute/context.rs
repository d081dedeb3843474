//! Execution handles for running cells.
//!
//! A [`CellExecution`] is the ephemeral record of one cell run: when it
//! started, what it has written, and whether it ended successfully. It is
//! created when the cell starts and dropped once its outputs are committed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use crate::output::CellOutput;

/// Handle for cooperative cancellation of cell execution.
///
/// `AbortHandle` can be cloned and shared across tasks; an abort through any
/// clone is visible to all of them.
///
/// # Example
///
/// ```
/// use sparqlbook_core::execute::AbortHandle;
///
/// let handle = AbortHandle::new();
/// let handle_clone = handle.clone();
///
/// assert!(!handle.is_aborted());
/// handle_clone.abort();
/// assert!(handle.is_aborted());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    /// Shared abort flag.
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    /// Create a new abort handle.
    pub fn new() -> Self {
        Self {
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if abort has been requested.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }

    /// Request abort of execution.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }
}

/// The live side of a cell execution, as seen by the pipeline and by endpoints.
///
/// Endpoints receive the handle so they may stream partial output while a
/// request is in flight.
pub trait ExecutionHandle: Send + Sync {
    /// Replace every output of the cell.
    fn replace_output(&self, outputs: Vec<CellOutput>);

    /// Append an output to the cell.
    fn append_output(&self, output: CellOutput);

    /// Finish the execution.
    fn end(&self, success: bool);

    /// Whether the host cancelled this execution.
    fn is_cancelled(&self) -> bool;
}

#[derive(Debug, Default)]
struct ExecutionState {
    outputs: Vec<CellOutput>,
    success: Option<bool>,
    duration: Option<Duration>,
}

/// Record of one cell execution.
#[derive(Debug)]
pub struct CellExecution {
    /// Position of the cell in its notebook
    cell_index: usize,
    /// Display ordering, assigned when the cell starts
    execution_order: u32,
    /// Wall-clock start time
    started_at: SystemTime,
    /// Monotonic start, for the duration
    started: Instant,
    /// Cancellation flag
    abort: AbortHandle,
    state: Mutex<ExecutionState>,
}

impl CellExecution {
    /// Start an execution for the cell at `cell_index`.
    pub fn start(cell_index: usize, execution_order: u32) -> Self {
        Self {
            cell_index,
            execution_order,
            started_at: SystemTime::now(),
            started: Instant::now(),
            abort: AbortHandle::new(),
            state: Mutex::new(ExecutionState::default()),
        }
    }

    /// Position of the executed cell.
    pub fn cell_index(&self) -> usize {
        self.cell_index
    }

    /// Execution order shown next to the cell.
    pub fn execution_order(&self) -> u32 {
        self.execution_order
    }

    /// Handle that cancels this execution.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Cancel the execution. Later writes are ignored and it is never ended.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Whether `end` has been called.
    pub fn is_ended(&self) -> bool {
        self.lock().success.is_some()
    }

    /// Snapshot of the execution.
    pub fn summary(&self) -> ExecutionSummary {
        let state = self.lock();
        ExecutionSummary {
            cell_index: self.cell_index,
            execution_order: self.execution_order,
            started_at: self.started_at,
            success: state.success,
            cancelled: self.abort.is_aborted(),
            duration: state.duration,
            outputs: state.outputs.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ExecutionState> {
        // Outputs are plain data, a poisoned lock still holds a usable value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ExecutionHandle for CellExecution {
    fn replace_output(&self, outputs: Vec<CellOutput>) {
        if self.abort.is_aborted() {
            return;
        }
        self.lock().outputs = outputs;
    }

    fn append_output(&self, output: CellOutput) {
        if self.abort.is_aborted() {
            return;
        }
        self.lock().outputs.push(output);
    }

    fn end(&self, success: bool) {
        if self.abort.is_aborted() {
            return;
        }
        let mut state = self.lock();
        if state.success.is_some() {
            tracing::warn!("Execution of cell {} ended twice", self.cell_index);
            return;
        }
        state.success = Some(success);
        state.duration = Some(self.started.elapsed());
    }

    fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

/// Final state of an execution, committed back into its cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    /// Position of the executed cell
    pub cell_index: usize,
    /// Display ordering
    pub execution_order: u32,
    /// Wall-clock start time
    pub started_at: SystemTime,
    /// `None` when the execution never ended
    pub success: Option<bool>,
    /// Whether the host cancelled the execution
    pub cancelled: bool,
    /// Time between start and end
    pub duration: Option<Duration>,
    /// Outputs at the time of the snapshot
    pub outputs: Vec<CellOutput>,
}

impl ExecutionSummary {
    /// Whether the execution ended successfully.
    pub fn succeeded(&self) -> bool {
        self.success == Some(true)
    }
}
