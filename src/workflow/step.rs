use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiRequest, ApiResponse, Contract, Equipment, Negotiation, Protocol};
use crate::error::ToolkitError;
use crate::input::ContractItem;

/// Whether a step's failure aborts the rest of the item's workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatality {
    /// Failure aborts the remaining steps for this item.
    Fatal,
    /// Failure is recorded and execution continues.
    Soft,
}

/// Per-item scratch state threaded through the steps of one item.
///
/// Owned exclusively by one executor run; a fresh context is created for
/// every item so nothing leaks between concurrent items.
#[derive(Debug, Default)]
pub struct StepContext {
    pub contract: Option<Contract>,
    pub equipment: Vec<Equipment>,
    pub negotiations: Vec<Negotiation>,
    pub protocols: Vec<Protocol>,
}

/// Failure raised by a step outside the HTTP layer: missing input, filter
/// that matched nothing, undecodable response body.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StepError(pub String);

/// One named remote operation of a workflow.
///
/// `build_requests` returns every HTTP request the step issues for one
/// item — most steps exactly one, fan-out steps (close all open
/// protocols) one per target, and an empty vector means the step is
/// trivially satisfied. `is_success` is the per-step success predicate
/// over a response; `absorb` folds a successful response into the
/// context for later steps.
pub trait WorkflowStep: Send + Sync {
    fn name(&self) -> &'static str;

    fn fatality(&self) -> Fatality {
        Fatality::Fatal
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError>;

    fn is_success(&self, response: &ApiResponse) -> bool {
        (200..300).contains(&response.status)
    }

    fn absorb(
        &self,
        _item: &ContractItem,
        _response: &ApiResponse,
        _ctx: &mut StepContext,
    ) -> Result<(), StepError> {
        Ok(())
    }
}

/// Named, versioned, ordered list of steps. Built once at startup and
/// shared read-only by every concurrent executor.
#[derive(Clone)]
pub struct WorkflowDefinition {
    pub name: &'static str,
    pub version: u32,
    pub steps: Vec<Arc<dyn WorkflowStep>>,
}

impl WorkflowDefinition {
    pub fn new(name: &'static str, version: u32, steps: Vec<Arc<dyn WorkflowStep>>) -> Self {
        Self {
            name,
            version,
            steps,
        }
    }

    /// Rejects definitions that cannot run at all (no steps).
    pub fn validate(&self) -> Result<(), ToolkitError> {
        if self.steps.is_empty() {
            return Err(ToolkitError::EmptyWorkflow(self.name.to_string()));
        }
        Ok(())
    }
}

/// Substitui os placeholders `{ec}` e `{contract}` de um template de
/// endpoint pelos valores do item.
pub fn render_endpoint(template: &str, item: &ContractItem) -> String {
    template
        .replace("{ec}", &item.id.client.to_string())
        .replace("{contract}", &item.id.contract.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ContractId;

    struct NoopStep;

    impl WorkflowStep for NoopStep {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn build_requests(
            &self,
            _item: &ContractItem,
            _ctx: &StepContext,
        ) -> Result<Vec<ApiRequest>, StepError> {
            Ok(Vec::new())
        }
    }

    fn item() -> ContractItem {
        ContractItem {
            row: 2,
            id: ContractId {
                client: 999,
                contract: 12345,
            },
            serial: None,
            new_value: None,
        }
    }

    #[test]
    fn validate_rejects_empty_definition() {
        let def = WorkflowDefinition::new("vazio", 1, Vec::new());
        assert!(matches!(
            def.validate(),
            Err(ToolkitError::EmptyWorkflow(name)) if name == "vazio"
        ));
    }

    #[test]
    fn validate_accepts_non_empty_definition() {
        let def = WorkflowDefinition::new("ok", 1, vec![Arc::new(NoopStep)]);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn default_fatality_is_fatal() {
        assert_eq!(NoopStep.fatality(), Fatality::Fatal);
    }

    #[test]
    fn default_success_is_2xx() {
        let ok = ApiResponse {
            status: 204,
            body: serde_json::Value::Null,
        };
        let err = ApiResponse {
            status: 500,
            body: serde_json::Value::Null,
        };
        assert!(NoopStep.is_success(&ok));
        assert!(!NoopStep.is_success(&err));
    }

    #[test]
    fn render_endpoint_substitutes_placeholders() {
        let rendered = render_endpoint("/contratos/cliente/{ec}", &item());
        assert_eq!(rendered, "/contratos/cliente/999");
        let rendered = render_endpoint("/contratos/{contract}/protocolos", &item());
        assert_eq!(rendered, "/contratos/12345/protocolos");
    }
}
