//! As operações remotas concretas dos quatro fluxos de serviço.
//!
//! Cada struct carrega o template de endpoint resolvido a partir da
//! configuração; a escolha de quais etapas compõem cada fluxo fica em
//! [`catalog`](crate::workflow::catalog).

use serde::Serialize;
use serde_json::Value;

use crate::api::types::{
    NEGOTIATION_ACTIVE, NEGOTIATION_FINALIZED, PROTOCOL_CLOSED, PROTOCOL_OPEN,
};
use crate::api::{ApiRequest, ApiResponse, Contract, ContractStatus, DeactivationRequest};
use crate::input::ContractItem;

use super::step::{render_endpoint, StepContext, StepError, WorkflowStep};

fn parse_list<T: serde::de::DeserializeOwned>(
    response: &ApiResponse,
    what: &str,
) -> Result<Vec<T>, StepError> {
    if response.body.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(response.body.clone())
        .map_err(|e| StepError(format!("lista de {what} indecodificável: {e}")))
}

fn to_payload<T: Serialize>(value: &T) -> Result<Value, StepError> {
    serde_json::to_value(value).map_err(|e| StepError(format!("payload inválido: {e}")))
}

/// GET dos contratos do EC; guarda no contexto o contrato da linha.
pub struct FetchContract {
    pub endpoint: String,
}

impl WorkflowStep for FetchContract {
    fn name(&self) -> &'static str {
        "buscar_contrato"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        _ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        Ok(vec![ApiRequest::get(render_endpoint(&self.endpoint, item))])
    }

    fn absorb(
        &self,
        item: &ContractItem,
        response: &ApiResponse,
        ctx: &mut StepContext,
    ) -> Result<(), StepError> {
        let contracts: Vec<Contract> = parse_list(response, "contratos")?;
        ctx.contract = contracts
            .into_iter()
            .find(|c| c.cd_contrato == item.id.contract);
        if ctx.contract.is_none() {
            return Err(StepError(format!(
                "contrato {} não localizado para o EC {}",
                item.id.contract, item.id.client
            )));
        }
        Ok(())
    }
}

/// GET dos equipamentos do contrato; guarda a lista no contexto.
/// Lista vazia não é falha aqui — a seleção acontece na etapa que precisa
/// de um equipamento.
pub struct FetchEquipment {
    pub endpoint: String,
}

impl WorkflowStep for FetchEquipment {
    fn name(&self) -> &'static str {
        "buscar_equipamentos"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        _ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        Ok(vec![ApiRequest::get(render_endpoint(&self.endpoint, item))])
    }

    fn absorb(
        &self,
        _item: &ContractItem,
        response: &ApiResponse,
        ctx: &mut StepContext,
    ) -> Result<(), StepError> {
        ctx.equipment = parse_list(response, "equipamentos")?;
        Ok(())
    }
}

/// GET das negociações do contrato; guarda a lista no contexto.
pub struct FetchNegotiations {
    pub endpoint: String,
}

impl WorkflowStep for FetchNegotiations {
    fn name(&self) -> &'static str {
        "buscar_negociacoes"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        _ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        Ok(vec![ApiRequest::get(render_endpoint(&self.endpoint, item))])
    }

    fn absorb(
        &self,
        _item: &ContractItem,
        response: &ApiResponse,
        ctx: &mut StepContext,
    ) -> Result<(), StepError> {
        ctx.negotiations = parse_list(response, "negociações")?;
        Ok(())
    }
}

/// GET dos protocolos/OS do contrato; guarda a lista no contexto.
pub struct FetchProtocols {
    pub endpoint: String,
}

impl WorkflowStep for FetchProtocols {
    fn name(&self) -> &'static str {
        "buscar_protocolos"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        _ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        Ok(vec![ApiRequest::get(render_endpoint(&self.endpoint, item))])
    }

    fn absorb(
        &self,
        _item: &ContractItem,
        response: &ApiResponse,
        ctx: &mut StepContext,
    ) -> Result<(), StepError> {
        ctx.protocols = parse_list(response, "protocolos")?;
        Ok(())
    }
}

/// PUT do contrato coletado com o `cdStatus` substituído.
pub struct SetContractStatus {
    pub endpoint: String,
    pub status: ContractStatus,
}

impl WorkflowStep for SetContractStatus {
    fn name(&self) -> &'static str {
        "alterar_status_contrato"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        let contract = ctx
            .contract
            .as_ref()
            .ok_or_else(|| StepError("contrato não coletado pelas etapas anteriores".into()))?;
        let mut updated = contract.clone();
        updated.cd_contrato = item.id.contract;
        updated.cd_cliente = item.id.client;
        updated.cd_status = self.status.code();
        Ok(vec![ApiRequest::put(
            render_endpoint(&self.endpoint, item),
            to_payload(&updated)?,
        )])
    }

    /// Além do 2xx, confere o status ecoado quando o corpo carrega um.
    fn is_success(&self, response: &ApiResponse) -> bool {
        if !(200..300).contains(&response.status) {
            return false;
        }
        if let Some(code) = response.body.get("cdStatus").and_then(Value::as_u64) {
            return code == u64::from(self.status.code());
        }
        if let Some(label) = response.body.get("dsStatus").and_then(Value::as_str) {
            return label == self.status.label();
        }
        true
    }
}

/// Um PUT por protocolo ABERTO do contexto, com o status FECHADO.
/// Nenhum protocolo aberto significa etapa trivialmente satisfeita.
pub struct CloseProtocols {
    pub endpoint: String,
}

impl WorkflowStep for CloseProtocols {
    fn name(&self) -> &'static str {
        "fechar_protocolos"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        ctx.protocols
            .iter()
            .filter(|p| p.st_protocolo == PROTOCOL_OPEN)
            .map(|p| {
                let mut closed = p.clone();
                closed.st_protocolo = PROTOCOL_CLOSED.to_string();
                Ok(ApiRequest::put(
                    render_endpoint(&self.endpoint, item),
                    to_payload(&closed)?,
                ))
            })
            .collect()
    }
}

/// Um PUT por negociação ATIVA do contexto, com o status FINALIZADA.
pub struct FinalizeNegotiations {
    pub endpoint: String,
}

impl WorkflowStep for FinalizeNegotiations {
    fn name(&self) -> &'static str {
        "finalizar_negociacoes"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        ctx.negotiations
            .iter()
            .filter(|n| n.st_negociacao == NEGOTIATION_ACTIVE)
            .map(|n| {
                let mut finalized = n.clone();
                finalized.st_negociacao = NEGOTIATION_FINALIZED.to_string();
                Ok(ApiRequest::put(
                    render_endpoint(&self.endpoint, item),
                    to_payload(&finalized)?,
                ))
            })
            .collect()
    }
}

/// Um PUT por equipamento ativo do contexto, com `ativo = false`.
pub struct CancelEquipment {
    pub endpoint: String,
}

impl WorkflowStep for CancelEquipment {
    fn name(&self) -> &'static str {
        "cancelar_equipamentos"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        ctx.equipment
            .iter()
            .filter(|e| e.ativo)
            .map(|e| {
                let mut cancelled = e.clone();
                cancelled.ativo = false;
                Ok(ApiRequest::put(
                    render_endpoint(&self.endpoint, item),
                    to_payload(&cancelled)?,
                ))
            })
            .collect()
    }
}

/// PUT único da solicitação de descredenciamento com OS: o corpo é fixo e
/// o fluxo normal de protocolos do sistema remoto assume dali em diante.
pub struct RequestDeactivation {
    pub endpoint: String,
}

impl WorkflowStep for RequestDeactivation {
    fn name(&self) -> &'static str {
        "solicitar_descredenciamento"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        _ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        Ok(vec![ApiRequest::put(
            render_endpoint(&self.endpoint, item),
            to_payload(&DeactivationRequest::default())?,
        )])
    }
}

/// Um PUT por negociação do contexto com `vlNegociacao` substituído pelo
/// valor da linha (ou pelo valor padrão configurado).
pub struct RepriceNegotiations {
    pub endpoint: String,
    pub default_value: Option<f64>,
}

impl WorkflowStep for RepriceNegotiations {
    fn name(&self) -> &'static str {
        "reprecificar_negociacoes"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        let value = item
            .new_value
            .or(self.default_value)
            .ok_or_else(|| StepError("valor de reprecificação ausente (coluna VALOR ou configuração)".into()))?;
        if ctx.negotiations.is_empty() {
            return Err(StepError("nenhuma negociação localizada para o contrato".into()));
        }
        ctx.negotiations
            .iter()
            .map(|n| {
                let mut repriced = n.clone();
                repriced.vl_negociacao = value;
                Ok(ApiRequest::put(
                    render_endpoint(&self.endpoint, item),
                    to_payload(&repriced)?,
                ))
            })
            .collect()
    }
}

/// PUT de um único equipamento com `ativo = true`: o que casa com o SERIAL
/// da linha quando informado, senão o último instalado por `dataInicio`.
pub struct ActivateEquipment {
    pub endpoint: String,
}

impl WorkflowStep for ActivateEquipment {
    fn name(&self) -> &'static str {
        "ativar_equipamento"
    }

    fn build_requests(
        &self,
        item: &ContractItem,
        ctx: &StepContext,
    ) -> Result<Vec<ApiRequest>, StepError> {
        if ctx.equipment.is_empty() {
            return Err(StepError("contrato sem equipamentos coletados".into()));
        }
        let chosen = match &item.serial {
            Some(serial) => ctx
                .equipment
                .iter()
                .find(|e| &e.nr_serie == serial)
                .ok_or_else(|| {
                    StepError(format!("equipamento com serial {serial} não localizado"))
                })?,
            None => ctx
                .equipment
                .iter()
                .max_by(|a, b| a.data_inicio.cmp(&b.data_inicio))
                .ok_or_else(|| StepError("contrato sem equipamentos coletados".into()))?,
        };
        let mut activated = chosen.clone();
        activated.ativo = true;
        Ok(vec![ApiRequest::put(
            render_endpoint(&self.endpoint, item),
            to_payload(&activated)?,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Equipment, HttpMethod, Negotiation, Protocol};
    use crate::input::ContractId;

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

    fn contract() -> Contract {
        Contract {
            cd_contrato: 12345,
            cd_cliente: 999,
            dt_solicitacao: "2024-01-10".into(),
            dt_inicio: "2024-01-15".into(),
            ds_sistema_solicitacao: "PORTAL".into(),
            ds_usuario_solicitacao: "operador".into(),
            cd_status: 6,
            ds_detalhe_chamado: None,
            cd_tipo_equipamento: 3,
            cd_contratante: 42,
            cd_solicitacao_sistema_externo: None,
        }
    }

    fn equipment(id: u64, serial: &str, inicio: &str, ativo: bool) -> Equipment {
        Equipment {
            cd_contrato_equip: id,
            cd_contrato: 12345,
            cd_modelo: 7,
            modelo: "S920".into(),
            nr_serie: serial.into(),
            nr_patrimonio: String::new(),
            data_inicio: inicio.into(),
            ativo,
        }
    }

    fn protocol(id: u64, status: &str) -> Protocol {
        Protocol {
            cd_protocolo: id,
            cd_contrato: 12345,
            ds_tipo: "DESINSTALACAO".into(),
            st_protocolo: status.into(),
        }
    }

    fn negotiation(id: u64, value: f64, status: &str) -> Negotiation {
        Negotiation {
            cd_contrato_negociacao: id,
            cd_contrato: 12345,
            vl_negociacao: value,
            st_negociacao: status.into(),
        }
    }

    fn response(body: Value) -> ApiResponse {
        ApiResponse { status: 200, body }
    }

    // --- testes de coleta ---

    #[test]
    fn fetch_contract_absorbs_matching_contract() {
        let step = FetchContract {
            endpoint: "/contratos/cliente/{ec}".into(),
        };
        let reqs = step.build_requests(&item(), &StepContext::default()).unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].method, HttpMethod::Get);
        assert_eq!(reqs[0].path, "/contratos/cliente/999");

        let mut ctx = StepContext::default();
        let body = serde_json::to_value(vec![contract()]).unwrap();
        step.absorb(&item(), &response(body), &mut ctx).unwrap();
        assert_eq!(ctx.contract.as_ref().unwrap().cd_contrato, 12345);
    }

    #[test]
    fn fetch_contract_fails_when_not_found() {
        let step = FetchContract {
            endpoint: "/contratos/cliente/{ec}".into(),
        };
        let mut ctx = StepContext::default();
        let mut other = contract();
        other.cd_contrato = 777;
        let body = serde_json::to_value(vec![other]).unwrap();
        let err = step.absorb(&item(), &response(body), &mut ctx).unwrap_err();
        assert!(err.to_string().contains("não localizado"));
    }

    #[test]
    fn fetch_equipment_tolerates_empty_list() {
        let step = FetchEquipment {
            endpoint: "/contratos/{contract}/equipamentos".into(),
        };
        let mut ctx = StepContext::default();
        step.absorb(&item(), &response(serde_json::json!([])), &mut ctx)
            .unwrap();
        assert!(ctx.equipment.is_empty());
    }

    // --- testes de mutação ---

    #[test]
    fn set_contract_status_rebuilds_payload() {
        let step = SetContractStatus {
            endpoint: "/contratos".into(),
            status: ContractStatus::Instalado,
        };
        let mut ctx = StepContext::default();
        ctx.contract = Some(contract());
        let reqs = step.build_requests(&item(), &ctx).unwrap();
        assert_eq!(reqs.len(), 1);
        let payload = reqs[0].payload.as_ref().unwrap();
        assert_eq!(payload["cdStatus"], 2);
        assert_eq!(payload["cdContrato"], 12345);
        assert_eq!(payload["cdCliente"], 999);
    }

    #[test]
    fn set_contract_status_requires_collected_contract() {
        let step = SetContractStatus {
            endpoint: "/contratos".into(),
            status: ContractStatus::Cancelado,
        };
        assert!(step.build_requests(&item(), &StepContext::default()).is_err());
    }

    #[test]
    fn set_contract_status_checks_echoed_status() {
        let step = SetContractStatus {
            endpoint: "/contratos".into(),
            status: ContractStatus::Cancelado,
        };
        let echoed_ok = response(serde_json::json!({"cdStatus": 6}));
        let echoed_wrong = response(serde_json::json!({"cdStatus": 2}));
        let no_echo = response(Value::Null);
        assert!(step.is_success(&echoed_ok));
        assert!(!step.is_success(&echoed_wrong));
        assert!(step.is_success(&no_echo));
    }

    #[test]
    fn close_protocols_fans_out_over_open_ones() {
        let step = CloseProtocols {
            endpoint: "/protocolos".into(),
        };
        let mut ctx = StepContext::default();
        ctx.protocols = vec![
            protocol(1, PROTOCOL_OPEN),
            protocol(2, PROTOCOL_CLOSED),
            protocol(3, PROTOCOL_OPEN),
        ];
        let reqs = step.build_requests(&item(), &ctx).unwrap();
        assert_eq!(reqs.len(), 2);
        for req in &reqs {
            assert_eq!(req.payload.as_ref().unwrap()["stProtocolo"], "FECHADO");
        }
    }

    #[test]
    fn close_protocols_with_nothing_open_is_trivially_satisfied() {
        let step = CloseProtocols {
            endpoint: "/protocolos".into(),
        };
        let reqs = step.build_requests(&item(), &StepContext::default()).unwrap();
        assert!(reqs.is_empty());
    }

    #[test]
    fn finalize_negotiations_targets_active_only() {
        let step = FinalizeNegotiations {
            endpoint: "/negociacoes".into(),
        };
        let mut ctx = StepContext::default();
        ctx.negotiations = vec![
            negotiation(1, 89.9, NEGOTIATION_ACTIVE),
            negotiation(2, 10.0, NEGOTIATION_FINALIZED),
        ];
        let reqs = step.build_requests(&item(), &ctx).unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(
            reqs[0].payload.as_ref().unwrap()["stNegociacao"],
            "FINALIZADA"
        );
    }

    #[test]
    fn cancel_equipment_deactivates_active_units() {
        let step = CancelEquipment {
            endpoint: "/equipamentos".into(),
        };
        let mut ctx = StepContext::default();
        ctx.equipment = vec![
            equipment(1, "A", "2024-01-01", true),
            equipment(2, "B", "2024-02-01", false),
        ];
        let reqs = step.build_requests(&item(), &ctx).unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].payload.as_ref().unwrap()["ativo"], false);
        assert_eq!(reqs[0].payload.as_ref().unwrap()["nrSerie"], "A");
    }

    #[test]
    fn request_deactivation_sends_fixed_body() {
        let step = RequestDeactivation {
            endpoint: "/contratos/{contract}/descredenciamento".into(),
        };
        let reqs = step.build_requests(&item(), &StepContext::default()).unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].path, "/contratos/12345/descredenciamento");
        let payload = reqs[0].payload.as_ref().unwrap();
        assert_eq!(payload["observacao"], "OS DE AJUSTE");
        assert_eq!(payload["churnInvoluntario"], false);
    }

    #[test]
    fn reprice_uses_row_value_over_default() {
        let step = RepriceNegotiations {
            endpoint: "/negociacoes".into(),
            default_value: Some(10.0),
        };
        let mut row = item();
        row.new_value = Some(49.9);
        let mut ctx = StepContext::default();
        ctx.negotiations = vec![negotiation(1, 89.9, NEGOTIATION_ACTIVE)];
        let reqs = step.build_requests(&row, &ctx).unwrap();
        assert_eq!(reqs[0].payload.as_ref().unwrap()["vlNegociacao"], 49.9);
    }

    #[test]
    fn reprice_without_any_value_fails_before_requests() {
        let step = RepriceNegotiations {
            endpoint: "/negociacoes".into(),
            default_value: None,
        };
        let mut ctx = StepContext::default();
        ctx.negotiations = vec![negotiation(1, 89.9, NEGOTIATION_ACTIVE)];
        let err = step.build_requests(&item(), &ctx).unwrap_err();
        assert!(err.to_string().contains("valor de reprecificação"));
    }

    #[test]
    fn activate_equipment_matches_row_serial() {
        let step = ActivateEquipment {
            endpoint: "/equipamentos".into(),
        };
        let mut row = item();
        row.serial = Some("B".into());
        let mut ctx = StepContext::default();
        ctx.equipment = vec![
            equipment(1, "A", "2024-03-01", false),
            equipment(2, "B", "2024-01-01", false),
        ];
        let reqs = step.build_requests(&row, &ctx).unwrap();
        assert_eq!(reqs.len(), 1);
        let payload = reqs[0].payload.as_ref().unwrap();
        assert_eq!(payload["nrSerie"], "B");
        assert_eq!(payload["ativo"], true);
    }

    #[test]
    fn activate_equipment_falls_back_to_last_installed() {
        let step = ActivateEquipment {
            endpoint: "/equipamentos".into(),
        };
        let mut ctx = StepContext::default();
        ctx.equipment = vec![
            equipment(1, "A", "2024-01-01", false),
            equipment(2, "B", "2024-05-01", false),
            equipment(3, "C", "2024-03-01", false),
        ];
        let reqs = step.build_requests(&item(), &ctx).unwrap();
        assert_eq!(reqs[0].payload.as_ref().unwrap()["nrSerie"], "B");
    }

    #[test]
    fn activate_equipment_fails_on_unknown_serial_or_empty_list() {
        let step = ActivateEquipment {
            endpoint: "/equipamentos".into(),
        };
        let mut row = item();
        row.serial = Some("X".into());
        let mut ctx = StepContext::default();
        ctx.equipment = vec![equipment(1, "A", "2024-01-01", false)];
        assert!(step.build_requests(&row, &ctx).is_err());
        assert!(step
            .build_requests(&item(), &StepContext::default())
            .is_err());
    }
}
