//! Tipos de dados para requisições e respostas da API contratual.
//!
//! Os nomes de campo no JSON seguem o padrão `camelCase` em português do
//! sistema remoto (`cdContrato`, `nrSerie`, ...); as structs usam
//! `#[serde(rename_all = "camelCase")]` sobre campos snake_case em Rust.

use serde::{Deserialize, Serialize};

/// Status de protocolo aberto no sistema remoto.
pub const PROTOCOL_OPEN: &str = "ABERTO";
/// Status de protocolo fechado no sistema remoto.
pub const PROTOCOL_CLOSED: &str = "FECHADO";
/// Status de negociação ativa (faturável).
pub const NEGOTIATION_ACTIVE: &str = "ATIVA";
/// Status de negociação finalizada (não faturável).
pub const NEGOTIATION_FINALIZED: &str = "FINALIZADA";

/// Catálogo de status de contrato do sistema remoto.
///
/// O sistema identifica o status por código numérico (`cdStatus`) e por
/// rótulo (`dsStatus`); ambos são fixados aqui em um único lugar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Instalado,
    CancelamentoSolicitado,
    Cancelado,
}

impl ContractStatus {
    /// Código numérico usado no campo `cdStatus` dos payloads.
    pub fn code(&self) -> u32 {
        match self {
            ContractStatus::Instalado => 2,
            ContractStatus::CancelamentoSolicitado => 4,
            ContractStatus::Cancelado => 6,
        }
    }

    /// Rótulo textual usado no campo `dsStatus` das respostas.
    pub fn label(&self) -> &'static str {
        match self {
            ContractStatus::Instalado => "INSTALADO",
            ContractStatus::CancelamentoSolicitado => "CANCELAMENTO SOLICITADO",
            ContractStatus::Cancelado => "CANCELADO",
        }
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Um contrato como retornado pela consulta por EC (estabelecimento/cliente).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub cd_contrato: u64,
    pub cd_cliente: u64,
    #[serde(default)]
    pub dt_solicitacao: String,
    #[serde(default)]
    pub dt_inicio: String,
    #[serde(default)]
    pub ds_sistema_solicitacao: String,
    #[serde(default)]
    pub ds_usuario_solicitacao: String,
    pub cd_status: u32,
    #[serde(default)]
    pub ds_detalhe_chamado: Option<String>,
    #[serde(default)]
    pub cd_tipo_equipamento: u32,
    #[serde(default)]
    pub cd_contratante: u64,
    #[serde(default)]
    pub cd_solicitacao_sistema_externo: Option<String>,
}

/// Um equipamento vinculado a um contrato.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub cd_contrato_equip: u64,
    pub cd_contrato: u64,
    #[serde(default)]
    pub cd_modelo: u32,
    #[serde(default)]
    pub modelo: String,
    #[serde(default)]
    pub nr_serie: String,
    #[serde(default)]
    pub nr_patrimonio: String,
    #[serde(default)]
    pub data_inicio: String,
    pub ativo: bool,
}

/// Uma negociação (acordo de preço) de um contrato.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Negotiation {
    pub cd_contrato_negociacao: u64,
    pub cd_contrato: u64,
    pub vl_negociacao: f64,
    pub st_negociacao: String,
}

/// Um protocolo/OS pendente contra um contrato.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    pub cd_protocolo: u64,
    pub cd_contrato: u64,
    #[serde(default)]
    pub ds_tipo: String,
    pub st_protocolo: String,
}

/// Corpo fixo da solicitação de descredenciamento (cancelamento com OS).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivationRequest {
    pub usuario_solicitacao: String,
    pub id_canal: String,
    pub ds_sistema: String,
    pub observacao: String,
    pub churn_involuntario: bool,
}

impl Default for DeactivationRequest {
    fn default() -> Self {
        Self {
            usuario_solicitacao: "API".into(),
            id_canal: "API".into(),
            ds_sistema: "API".into(),
            observacao: "OS DE AJUSTE".into(),
            churn_involuntario: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_status_codes_and_labels() {
        assert_eq!(ContractStatus::Instalado.code(), 2);
        assert_eq!(ContractStatus::CancelamentoSolicitado.code(), 4);
        assert_eq!(ContractStatus::Cancelado.code(), 6);
        assert_eq!(ContractStatus::Instalado.label(), "INSTALADO");
        assert_eq!(
            ContractStatus::CancelamentoSolicitado.label(),
            "CANCELAMENTO SOLICITADO"
        );
        assert_eq!(ContractStatus::Cancelado.to_string(), "CANCELADO");
    }

    #[test]
    fn contract_deserialize_from_api_format() {
        let api_json = r#"{
            "cdContrato": 12345,
            "cdCliente": 999,
            "dtSolicitacao": "2024-01-10",
            "dtInicio": "2024-01-15",
            "dsSistemaSolicitacao": "PORTAL",
            "dsUsuarioSolicitacao": "operador",
            "cdStatus": 6,
            "dsDetalheChamado": null,
            "cdTipoEquipamento": 3,
            "cdContratante": 42,
            "cdSolicitacaoSistemaExterno": null
        }"#;
        let contract: Contract = serde_json::from_str(api_json).unwrap();
        assert_eq!(contract.cd_contrato, 12345);
        assert_eq!(contract.cd_cliente, 999);
        assert_eq!(contract.cd_status, 6);
        assert!(contract.ds_detalhe_chamado.is_none());
    }

    #[test]
    fn contract_serializes_camel_case() {
        let contract = Contract {
            cd_contrato: 1,
            cd_cliente: 2,
            dt_solicitacao: String::new(),
            dt_inicio: String::new(),
            ds_sistema_solicitacao: String::new(),
            ds_usuario_solicitacao: String::new(),
            cd_status: 2,
            ds_detalhe_chamado: None,
            cd_tipo_equipamento: 0,
            cd_contratante: 0,
            cd_solicitacao_sistema_externo: None,
        };
        let json = serde_json::to_string(&contract).unwrap();
        assert!(json.contains(r#""cdContrato":1"#));
        assert!(json.contains(r#""cdStatus":2"#));
        assert!(!json.contains("cd_contrato"));
    }

    #[test]
    fn equipment_roundtrip() {
        let equip = Equipment {
            cd_contrato_equip: 10,
            cd_contrato: 12345,
            cd_modelo: 7,
            modelo: "S920".into(),
            nr_serie: "ABC123".into(),
            nr_patrimonio: "P-1".into(),
            data_inicio: "2024-02-01".into(),
            ativo: true,
        };
        let json = serde_json::to_string(&equip).unwrap();
        assert!(json.contains(r#""nrSerie":"ABC123""#));
        let parsed: Equipment = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.nr_serie, "ABC123");
        assert!(parsed.ativo);
    }

    #[test]
    fn negotiation_and_protocol_deserialize() {
        let neg: Negotiation = serde_json::from_str(
            r#"{"cdContratoNegociacao": 5, "cdContrato": 12345, "vlNegociacao": 89.9, "stNegociacao": "ATIVA"}"#,
        )
        .unwrap();
        assert_eq!(neg.vl_negociacao, 89.9);
        assert_eq!(neg.st_negociacao, NEGOTIATION_ACTIVE);

        let proto: Protocol = serde_json::from_str(
            r#"{"cdProtocolo": 77, "cdContrato": 12345, "dsTipo": "DESINSTALACAO", "stProtocolo": "ABERTO"}"#,
        )
        .unwrap();
        assert_eq!(proto.cd_protocolo, 77);
        assert_eq!(proto.st_protocolo, PROTOCOL_OPEN);
    }

    #[test]
    fn deactivation_request_default_body() {
        let body = serde_json::to_value(DeactivationRequest::default()).unwrap();
        assert_eq!(body["usuarioSolicitacao"], "API");
        assert_eq!(body["idCanal"], "API");
        assert_eq!(body["dsSistema"], "API");
        assert_eq!(body["observacao"], "OS DE AJUSTE");
        assert_eq!(body["churnInvoluntario"], false);
    }
}
