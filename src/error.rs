use thiserror::Error;

/// Erros fatais do toolkit — a família "ConfigurationError".
///
/// Um `ToolkitError` nunca descreve a falha de um item individual do lote
/// (essas viram [`ItemOutcome`](crate::report::ItemOutcome)); ele só ocorre
/// quando a execução inteira não pode começar ou terminar: configuração
/// inválida, workflow vazio, arquivo de entrada ilegível.
#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Workflow '{0}' não possui etapas")]
    EmptyWorkflow(String),

    #[error("Número de workers deve ser >= 1 (recebido {0})")]
    InvalidConcurrency(usize),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Erro ao interpretar TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Erro HTTP: {0}")]
    Http(#[from] reqwest::Error),
}
