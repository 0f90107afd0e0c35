//! Configuração do toolkit carregada a partir de `contract-toolkit.toml`.
//!
//! A struct [`ToolkitConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `CONTRACT_API_TOKEN` tem precedência sobre o
//! arquivo para o token de autenticação.

use std::path::Path;

use serde::Deserialize;

use crate::error::ToolkitError;

/// Configuração de nível superior.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolkitConfig {
    /// URL base da API contratual.
    #[serde(default)]
    pub base_url: String,

    /// Token bearer de autenticação. Vazio desabilita o cabeçalho.
    #[serde(default)]
    pub api_token: String,

    /// Tamanho do pool de workers do lote.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Timeout total por requisição, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retentativas adicionais para falhas de transporte.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Atraso base em milissegundos para o backoff exponencial.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Prazo total do lote em segundos; expirado, nenhum item novo é
    /// despachado. Ausente = sem prazo.
    #[serde(default)]
    pub batch_deadline_secs: Option<u64>,

    #[serde(default)]
    pub endpoints: Endpoints,

    #[serde(default)]
    pub reprice: RepriceConfig,
}

/// Templates de endpoint da API contratual, um por operação remota.
/// Aceitam os placeholders `{ec}` e `{contract}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_get_contracts")]
    pub get_contracts: String,
    #[serde(default = "default_put_contract")]
    pub put_contract: String,
    #[serde(default = "default_get_equipment")]
    pub get_equipment: String,
    #[serde(default = "default_put_equipment")]
    pub put_equipment: String,
    #[serde(default = "default_get_negotiations")]
    pub get_negotiations: String,
    #[serde(default = "default_put_negotiation")]
    pub put_negotiation: String,
    #[serde(default = "default_get_protocols")]
    pub get_protocols: String,
    #[serde(default = "default_put_protocol")]
    pub put_protocol: String,
    #[serde(default = "default_request_deactivation")]
    pub request_deactivation: String,
}

/// Parâmetros da reprecificação.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepriceConfig {
    /// Valor aplicado quando a linha não traz a coluna VALOR.
    #[serde(default)]
    pub default_value: Option<f64>,
}

fn default_workers() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_get_contracts() -> String {
    "/contratos/cliente/{ec}".into()
}

fn default_put_contract() -> String {
    "/contratos".into()
}

fn default_get_equipment() -> String {
    "/contratos/{contract}/equipamentos".into()
}

fn default_put_equipment() -> String {
    "/equipamentos".into()
}

fn default_get_negotiations() -> String {
    "/contratos/{contract}/negociacoes".into()
}

fn default_put_negotiation() -> String {
    "/negociacoes".into()
}

fn default_get_protocols() -> String {
    "/contratos/{contract}/protocolos".into()
}

fn default_put_protocol() -> String {
    "/protocolos".into()
}

fn default_request_deactivation() -> String {
    "/contratos/{contract}/descredenciamento".into()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            get_contracts: default_get_contracts(),
            put_contract: default_put_contract(),
            get_equipment: default_get_equipment(),
            put_equipment: default_put_equipment(),
            get_negotiations: default_get_negotiations(),
            put_negotiation: default_put_negotiation(),
            get_protocols: default_get_protocols(),
            put_protocol: default_put_protocol(),
            request_deactivation: default_request_deactivation(),
        }
    }
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            workers: default_workers(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            batch_deadline_secs: None,
            endpoints: Endpoints::default(),
            reprice: RepriceConfig::default(),
        }
    }
}

impl ToolkitConfig {
    /// Carrega a configuração do caminho dado. Usa valores padrão se o
    /// arquivo não existir; um arquivo parcial completa campo a campo.
    pub fn load(path: &Path) -> Result<Self, ToolkitError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<ToolkitConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo para o token.
        if let Ok(token) = std::env::var("CONTRACT_API_TOKEN")
            && !token.is_empty()
        {
            config.api_token = token;
        }

        Ok(config)
    }
}
