use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal status of one item of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// Every step of the workflow ran and succeeded.
    Success,
    /// Every fatal step succeeded, at least one soft step failed.
    Partial,
    /// A fatal step failed, the row was invalid, or the item was
    /// interrupted mid-workflow.
    Failed,
    /// The item never started (batch stopped before dispatch).
    Skipped,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Success => write!(f, "SUCCESS"),
            ItemStatus::Partial => write!(f, "PARTIAL"),
            ItemStatus::Failed => write!(f, "FAILED"),
            ItemStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Audit entry for one executed workflow step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub ok: bool,
    /// HTTP status of the (last) response, `None` when the failure precedes
    /// any response (transport exhaustion, empty build).
    pub http_status: Option<u16>,
    pub detail: Option<String>,
}

impl StepRecord {
    pub fn ok(step: &str, http_status: Option<u16>) -> Self {
        Self {
            step: step.to_string(),
            ok: true,
            http_status,
            detail: None,
        }
    }

    pub fn failed(step: &str, http_status: Option<u16>, detail: String) -> Self {
        Self {
            step: step.to_string(),
            ok: false,
            http_status,
            detail: Some(detail),
        }
    }
}

/// Immutable per-item result, produced once when the executor finishes
/// (or when the coordinator rejects/skips the row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Input file line this outcome belongs to.
    pub row: usize,
    /// `EC/CONTRATO`, or the raw line text for unparseable rows.
    pub identifier: String,
    pub status: ItemStatus,
    pub steps: Vec<StepRecord>,
    /// Human-readable failure reason, set whenever status is not SUCCESS.
    pub reason: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl ItemOutcome {
    pub fn new(
        row: usize,
        identifier: String,
        status: ItemStatus,
        steps: Vec<StepRecord>,
        reason: Option<String>,
    ) -> Self {
        Self {
            row,
            identifier,
            status,
            steps,
            reason,
            finished_at: Utc::now(),
        }
    }

    /// Outcome for a row rejected before dispatch (parse error, duplicate).
    pub fn rejected(row: usize, raw: String, reason: String) -> Self {
        Self::new(row, raw, ItemStatus::Failed, Vec::new(), Some(reason))
    }

    /// Outcome for an item never dispatched because the batch stopped.
    pub fn skipped(row: usize, identifier: String) -> Self {
        Self::new(
            row,
            identifier,
            ItemStatus::Skipped,
            Vec::new(),
            Some("não iniciado: lote interrompido".into()),
        )
    }
}

/// Aggregated result of one batch run.
///
/// Outcomes are stored in input-row order, one per input row; the
/// identifier is embedded in each record so the association does not
/// depend on completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub workflow: String,
    pub workflow_version: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn count(&self, status: ItemStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(ItemStatus::Success)
    }

    pub fn partial(&self) -> usize {
        self.count(ItemStatus::Partial)
    }

    pub fn failed(&self) -> usize {
        self.count(ItemStatus::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(ItemStatus::Skipped)
    }

    /// Identifiers that did not fully succeed, with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .filter(|o| o.status != ItemStatus::Success)
            .map(|o| {
                (
                    o.identifier.as_str(),
                    o.reason.as_deref().unwrap_or("motivo não registrado"),
                )
            })
    }
}
