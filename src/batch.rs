//! Batch coordinator: fans items out over a bounded worker pool and
//! aggregates one outcome per input row into a [`BatchReport`].
//!
//! A single item's failure never aborts the batch; the only error `run`
//! can return is a configuration one, raised before any work starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::ContractApiClient;
use crate::error::ToolkitError;
use crate::executor::ItemExecutor;
use crate::input::RowOutcome;
use crate::report::{BatchReport, ItemOutcome, ItemStatus};
use crate::workflow::WorkflowDefinition;

/// Cooperative stop flag shared by the coordinator, the executors and the
/// ctrl-c handler. Once set it never clears for the rest of the run.
#[derive(Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Collaborator notified as each item completes, in input order.
/// Keeps the terminal UI out of the engine.
pub trait ProgressSink: Send + Sync {
    fn item_done(&self, outcome: &ItemOutcome);
}

enum Slot {
    Ready(Box<ItemOutcome>),
    Running {
        row: usize,
        identifier: String,
        handle: JoinHandle<ItemOutcome>,
    },
}

pub struct BatchCoordinator {
    client: Arc<ContractApiClient>,
    workflow: Arc<WorkflowDefinition>,
    workers: usize,
    deadline: Option<Duration>,
    stop: StopSignal,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl BatchCoordinator {
    pub fn new(
        client: Arc<ContractApiClient>,
        workflow: WorkflowDefinition,
        workers: usize,
    ) -> Self {
        Self {
            client,
            workflow: Arc::new(workflow),
            workers,
            deadline: None,
            stop: StopSignal::new(),
            progress: None,
        }
    }

    /// Prazo total do lote; expirado, nenhum item novo é despachado.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Handle used by callers (ctrl-c, deadline, tests) to stop the batch.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Runs the whole batch and returns a complete report: exactly one
    /// outcome per input row, in input order, regardless of completion
    /// order, failures or interruption.
    pub async fn run(&self, rows: Vec<RowOutcome>) -> Result<BatchReport, ToolkitError> {
        // Fail-fast validation, before any dispatch.
        self.workflow.validate()?;
        if self.workers == 0 {
            return Err(ToolkitError::InvalidConcurrency(self.workers));
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            workflow = self.workflow.name,
            rows = rows.len(),
            workers = self.workers,
            "iniciando lote"
        );

        let deadline_task = self.deadline.map(|deadline| {
            let stop = self.stop.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                warn!(deadline_secs = deadline.as_secs_f64(), "prazo do lote expirado");
                stop.stop();
            })
        });

        let executor = Arc::new(ItemExecutor::new(
            self.client.clone(),
            self.workflow.clone(),
            self.stop.clone(),
        ));
        let semaphore = Arc::new(Semaphore::new(self.workers));

        let mut slots = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                RowOutcome::Rejected { row, raw, error } => {
                    warn!(row, error = %error, "linha rejeitada");
                    slots.push(Slot::Ready(Box::new(ItemOutcome::rejected(
                        row,
                        raw,
                        error.to_string(),
                    ))));
                }
                RowOutcome::Parsed(item) => {
                    if self.stop.is_stopped() {
                        slots.push(Slot::Ready(Box::new(ItemOutcome::skipped(
                            item.row,
                            item.id.to_string(),
                        ))));
                        continue;
                    }
                    let permit = semaphore
                        .clone()
                        .acquire_owned()
                        .await
                        .expect("semaphore never closed");
                    let executor = executor.clone();
                    let identifier = item.id.to_string();
                    let row = item.row;
                    let handle = tokio::spawn(async move {
                        let _permit = permit;
                        executor.execute(&item).await
                    });
                    slots.push(Slot::Running {
                        row,
                        identifier,
                        handle,
                    });
                }
            }
        }

        // Join in input order so the report stays deterministic even when
        // completion order is not.
        let mut outcomes = Vec::with_capacity(slots.len());
        for slot in slots {
            let outcome = match slot {
                Slot::Ready(outcome) => *outcome,
                Slot::Running {
                    row,
                    identifier,
                    handle,
                } => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => ItemOutcome::new(
                        row,
                        identifier,
                        ItemStatus::Failed,
                        Vec::new(),
                        Some(format!("tarefa do item abortada: {e}")),
                    ),
                },
            };
            if let Some(progress) = &self.progress {
                progress.item_done(&outcome);
            }
            outcomes.push(outcome);
        }

        if let Some(task) = deadline_task {
            task.abort();
        }

        let report = BatchReport {
            run_id,
            workflow: self.workflow.name.to_string(),
            workflow_version: self.workflow.version,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(
            run_id = %run_id,
            succeeded = report.succeeded(),
            partial = report.partial(),
            failed = report.failed(),
            skipped = report.skipped(),
            "lote finalizado"
        );
        Ok(report)
    }
}
