//! Per-item executor: drives one contract through its workflow.
//!
//! Each item moves through PENDING → RUNNING → {SUCCESS, PARTIAL, FAILED}
//! (or SKIPPED when the batch stops before its first step). Steps run
//! strictly in the declared order over a fresh [`StepContext`]; API errors
//! never escape — they become step records in the item's outcome.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{ApiError, ContractApiClient};
use crate::batch::StopSignal;
use crate::input::ContractItem;
use crate::report::{ItemOutcome, ItemStatus, StepRecord};
use crate::workflow::{Fatality, StepContext, WorkflowDefinition, WorkflowStep};

const MAX_DETAIL_LEN: usize = 200;

fn truncate_detail(mut detail: String) -> String {
    if detail.chars().count() > MAX_DETAIL_LEN {
        detail = detail.chars().take(MAX_DETAIL_LEN).collect::<String>() + "…";
    }
    detail
}

pub struct ItemExecutor {
    client: Arc<ContractApiClient>,
    workflow: Arc<WorkflowDefinition>,
    stop: StopSignal,
}

impl ItemExecutor {
    pub fn new(
        client: Arc<ContractApiClient>,
        workflow: Arc<WorkflowDefinition>,
        stop: StopSignal,
    ) -> Self {
        Self {
            client,
            workflow,
            stop,
        }
    }

    /// Runs the full workflow for one item and produces its immutable
    /// outcome. A fatal step failure short-circuits the remaining steps;
    /// a soft failure is recorded and execution continues. The stop
    /// signal is checked before every step: observed before the first
    /// step the item is SKIPPED, observed later it is FAILED with a
    /// reason naming the step it never reached.
    pub async fn execute(&self, item: &ContractItem) -> ItemOutcome {
        let mut ctx = StepContext::default();
        let mut records: Vec<StepRecord> = Vec::new();
        let mut failure_reason: Option<String> = None;

        debug!(item = %item.id, workflow = self.workflow.name, "iniciando item");

        for step in &self.workflow.steps {
            if self.stop.is_stopped() {
                if records.is_empty() {
                    debug!(item = %item.id, "lote interrompido antes do início do item");
                    return ItemOutcome::skipped(item.row, item.id.to_string());
                }
                failure_reason = Some(format!("cancelado antes de {}", step.name()));
                break;
            }

            let record = self.run_step(step.as_ref(), item, &mut ctx).await;
            let failed = !record.ok;
            let detail = record.detail.clone().unwrap_or_default();
            records.push(record);

            if failed {
                match step.fatality() {
                    Fatality::Fatal => {
                        warn!(item = %item.id, step = step.name(), detail, "etapa fatal falhou");
                        failure_reason = Some(format!("{}: {}", step.name(), detail));
                        break;
                    }
                    Fatality::Soft => {
                        warn!(item = %item.id, step = step.name(), detail, "etapa branda falhou");
                    }
                }
            }
        }

        let soft_failures: Vec<&str> = records
            .iter()
            .filter(|r| !r.ok)
            .map(|r| r.step.as_str())
            .collect();

        let (status, reason) = if let Some(reason) = failure_reason {
            (ItemStatus::Failed, Some(reason))
        } else if !soft_failures.is_empty() {
            (
                ItemStatus::Partial,
                Some(format!("etapas brandas falharam: {}", soft_failures.join(", "))),
            )
        } else {
            (ItemStatus::Success, None)
        };

        debug!(item = %item.id, status = %status, "item finalizado");
        ItemOutcome::new(item.row, item.id.to_string(), status, records, reason)
    }

    async fn run_step(
        &self,
        step: &dyn WorkflowStep,
        item: &ContractItem,
        ctx: &mut StepContext,
    ) -> StepRecord {
        let requests = match step.build_requests(item, ctx) {
            Ok(requests) => requests,
            Err(e) => return StepRecord::failed(step.name(), None, e.to_string()),
        };

        let mut last_status = None;
        for request in &requests {
            match self.client.call(request).await {
                Ok(response) => {
                    last_status = Some(response.status);
                    if !step.is_success(&response) {
                        return StepRecord::failed(
                            step.name(),
                            Some(response.status),
                            format!("resposta inesperada (status {})", response.status),
                        );
                    }
                    if let Err(e) = step.absorb(item, &response, ctx) {
                        return StepRecord::failed(
                            step.name(),
                            Some(response.status),
                            e.to_string(),
                        );
                    }
                }
                Err(ApiError::Remote { status, body }) => {
                    return StepRecord::failed(step.name(), Some(status), truncate_detail(body));
                }
                Err(e) => {
                    return StepRecord::failed(step.name(), None, e.to_string());
                }
            }
        }

        StepRecord::ok(step.name(), last_status)
    }
}
