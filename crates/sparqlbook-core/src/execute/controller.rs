//! Batch execution of notebook cells.
//!
//! Cells are started in document order without waiting for one another;
//! each runs as its own task and is awaited independently.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use futures::future::join_all;
use tokio::task::JoinHandle;

use super::context::{AbortHandle, CellExecution, ExecutionSummary};
use super::executor::CellExecutor;
use crate::config::EndpointConnection;
use crate::notebook::{Cell, Notebook};

/// A started cell execution.
pub struct PendingExecution {
    execution: Arc<CellExecution>,
    task: JoinHandle<()>,
}

impl PendingExecution {
    /// Position of the executing cell.
    pub fn cell_index(&self) -> usize {
        self.execution.cell_index()
    }

    /// Execution order assigned at start.
    pub fn execution_order(&self) -> u32 {
        self.execution.execution_order()
    }

    /// Handle that cancels this execution.
    pub fn abort_handle(&self) -> AbortHandle {
        self.execution.abort_handle()
    }

    /// Cancel the execution. Its pipeline stops writing and never ends it.
    pub fn cancel(&self) {
        self.execution.cancel();
    }

    /// Wait for the pipeline to finish and take the final state.
    pub async fn join(self) -> ExecutionSummary {
        if let Err(e) = self.task.await {
            tracing::error!(
                "Execution task for cell {} failed: {}",
                self.execution.cell_index(),
                e
            );
        }
        self.execution.summary()
    }
}

/// Starts cell executions and hands out execution order numbers.
pub struct NotebookController {
    executor: Arc<CellExecutor>,
    /// Only cross-cell state: incremented once per started cell.
    execution_order: AtomicU32,
}

impl NotebookController {
    /// Create a controller around an executor.
    pub fn new(executor: CellExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
            execution_order: AtomicU32::new(0),
        }
    }

    /// Start executing cells. Must be called within a Tokio runtime.
    ///
    /// Each `(index, cell)` pair is started in the given order; the call
    /// returns as soon as every task has been spawned. `active` is snapshotted
    /// for the whole batch.
    pub fn execute(
        &self,
        cells: impl IntoIterator<Item = (usize, Cell)>,
        active: Option<&EndpointConnection>,
    ) -> Vec<PendingExecution> {
        cells
            .into_iter()
            .map(|(index, cell)| self.start(index, cell, active.cloned()))
            .collect()
    }

    fn start(
        &self,
        index: usize,
        cell: Cell,
        active: Option<EndpointConnection>,
    ) -> PendingExecution {
        let order = self.execution_order.fetch_add(1, Ordering::SeqCst) + 1;
        let execution = Arc::new(CellExecution::start(index, order));
        tracing::debug!("Starting cell {} as [{}]", index, order);

        let executor = Arc::clone(&self.executor);
        let handle = Arc::clone(&execution);
        let task = tokio::spawn(async move {
            executor
                .execute_cell(&cell, active.as_ref(), &*handle)
                .await;
        });

        PendingExecution { execution, task }
    }

    /// Execute the code cells at `indices` (all code cells when `None`) and
    /// commit their outputs into the notebook.
    ///
    /// Outputs of every executed cell are replaced, not appended to.
    pub async fn run_notebook(
        &self,
        notebook: &mut Notebook,
        indices: Option<&[usize]>,
        active: Option<&EndpointConnection>,
    ) -> Vec<ExecutionSummary> {
        let selected: Vec<usize> = match indices {
            Some(indices) => indices
                .iter()
                .copied()
                .filter(|&i| notebook.cells.get(i).is_some_and(Cell::is_code))
                .collect(),
            None => notebook.code_cell_indices(),
        };

        let pending = self.execute(
            selected.iter().map(|&i| (i, notebook.cells[i].clone())),
            active,
        );
        let summaries = join_all(pending.into_iter().map(PendingExecution::join)).await;

        for summary in &summaries {
            if summary.cancelled {
                continue;
            }
            if let Some(cell) = notebook.cells.get_mut(summary.cell_index) {
                cell.outputs = summary.outputs.clone();
            }
        }

        summaries
    }

    /// Execution order of the most recently started cell.
    pub fn last_execution_order(&self) -> u32 {
        self.execution_order.load(Ordering::SeqCst)
    }
}
