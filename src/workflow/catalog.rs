//! O catálogo dos quatro fluxos de serviço suportados.
//!
//! Cada fluxo é uma [`WorkflowDefinition`] versionada montada a partir dos
//! templates de endpoint da configuração. Todas as etapas dos fluxos do
//! catálogo são fatais: meio cancelamento não existe.

use std::sync::Arc;

use crate::api::ContractStatus;
use crate::config::ToolkitConfig;

use super::step::WorkflowDefinition;
use super::steps::{
    ActivateEquipment, CancelEquipment, CloseProtocols, FetchContract, FetchEquipment,
    FetchNegotiations, FetchProtocols, FinalizeNegotiations, RepriceNegotiations,
    RequestDeactivation, SetContractStatus,
};

/// Os serviços oferecidos pelo toolkit, um por subcomando da CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Cancelamento direto, sem OS: status, protocolos, negociações e
    /// equipamentos são encerrados pelo próprio toolkit.
    Cancel,
    /// Cancelamento com OS: apenas a solicitação é registrada e o fluxo
    /// de protocolos do sistema remoto assume.
    Deactivate,
    /// Alteração do valor negociado.
    Reprice,
    /// Reativação de contrato cancelado.
    Reactivate,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::Cancel => write!(f, "cancel"),
            Service::Deactivate => write!(f, "deactivate"),
            Service::Reprice => write!(f, "reprice"),
            Service::Reactivate => write!(f, "reactivate"),
        }
    }
}

/// Monta a definição v1 do fluxo pedido com os endpoints configurados.
pub fn definition(service: Service, config: &ToolkitConfig) -> WorkflowDefinition {
    let ep = &config.endpoints;
    match service {
        Service::Cancel => WorkflowDefinition::new(
            "cancel",
            1,
            vec![
                Arc::new(FetchContract {
                    endpoint: ep.get_contracts.clone(),
                }),
                Arc::new(FetchEquipment {
                    endpoint: ep.get_equipment.clone(),
                }),
                Arc::new(FetchNegotiations {
                    endpoint: ep.get_negotiations.clone(),
                }),
                Arc::new(FetchProtocols {
                    endpoint: ep.get_protocols.clone(),
                }),
                Arc::new(SetContractStatus {
                    endpoint: ep.put_contract.clone(),
                    status: ContractStatus::Cancelado,
                }),
                Arc::new(CloseProtocols {
                    endpoint: ep.put_protocol.clone(),
                }),
                Arc::new(FinalizeNegotiations {
                    endpoint: ep.put_negotiation.clone(),
                }),
                Arc::new(CancelEquipment {
                    endpoint: ep.put_equipment.clone(),
                }),
            ],
        ),
        Service::Deactivate => WorkflowDefinition::new(
            "deactivate",
            1,
            vec![Arc::new(RequestDeactivation {
                endpoint: ep.request_deactivation.clone(),
            })],
        ),
        Service::Reprice => WorkflowDefinition::new(
            "reprice",
            1,
            vec![
                Arc::new(FetchNegotiations {
                    endpoint: ep.get_negotiations.clone(),
                }),
                Arc::new(RepriceNegotiations {
                    endpoint: ep.put_negotiation.clone(),
                    default_value: config.reprice.default_value,
                }),
            ],
        ),
        // Nenhuma etapa de negociação aqui: reabrir a negociação
        // finalizada dispararia faturamento indevido.
        Service::Reactivate => WorkflowDefinition::new(
            "reactivate",
            1,
            vec![
                Arc::new(FetchContract {
                    endpoint: ep.get_contracts.clone(),
                }),
                Arc::new(FetchEquipment {
                    endpoint: ep.get_equipment.clone(),
                }),
                Arc::new(SetContractStatus {
                    endpoint: ep.put_contract.clone(),
                    status: ContractStatus::Instalado,
                }),
                Arc::new(ActivateEquipment {
                    endpoint: ep.put_equipment.clone(),
                }),
            ],
        ),
    }
}
