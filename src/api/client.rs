use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::time::sleep;

use super::error::ApiError;
use crate::config::ToolkitConfig;

/// Verbos HTTP aceitos pela API contratual.
///
/// A construção de requisições é tipada: apenas GET, PUT e POST existem,
/// então um verbo não suportado é impossível de expressar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Uma requisição contra a API contratual: verbo, caminho relativo e
/// payload JSON opcional.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub payload: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            payload: None,
        }
    }

    pub fn put(path: impl Into<String>, payload: Value) -> Self {
        Self {
            method: HttpMethod::Put,
            path: path.into(),
            payload: Some(payload),
        }
    }

    pub fn post(path: impl Into<String>, payload: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            payload: Some(payload),
        }
    }
}

/// Resposta estruturada de uma chamada: status HTTP e corpo JSON.
/// Respostas 204/corpo vazio carregam `Value::Null`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// Política de retentativa para falhas de transporte.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retentativas adicionais após a primeira falha.
    pub max_retries: u32,
    /// Atraso base em milissegundos para backoff exponencial.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Calcula o atraso para uma dada retentativa com backoff exponencial,
    /// saturando em `u64::MAX` para não estourar com políticas longas.
    /// delay = base_delay_ms * 2^(attempt - 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        self.base_delay_ms.saturating_mul(factor)
    }
}

/// Cliente HTTP da API contratual.
///
/// Compartilhado entre workers via `Arc`; o pool de conexões do `reqwest`
/// é o único estado mutável interno e já é seguro para concorrência.
/// Apenas [`ApiError::Transport`] é retentado — um status de erro remoto
/// volta imediatamente para a camada de etapas decidir o que fazer, e
/// PUT/POST nunca são reenviados às cegas sobre estado remoto ambíguo.
pub struct ContractApiClient {
    client: Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
}

impl ContractApiClient {
    pub fn new(config: &ToolkitConfig) -> Self {
        Self::with_base_url(
            config.base_url.clone(),
            config.api_token.clone(),
            config.request_timeout_secs,
            RetryPolicy {
                max_retries: config.max_retries,
                base_delay_ms: config.retry_base_delay_ms,
            },
        )
    }

    /// Cria um cliente apontando para uma URL base arbitrária (útil em testes).
    pub fn with_base_url(
        base_url: String,
        token: String,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url,
            token,
            retry,
        }
    }

    /// Executa uma chamada, retentando apenas falhas de transporte conforme
    /// a política configurada. Esgotadas as retentativas, devolve o último
    /// erro de transporte.
    pub async fn call(&self, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut attempt = 0u32;
        loop {
            match self.send(req).await {
                Err(ApiError::Transport(source)) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay_ms = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        method = %req.method,
                        path = %req.path,
                        attempt,
                        max = self.retry.max_retries,
                        delay_ms,
                        error = %source,
                        "falha de transporte, retentando"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
                other => return other,
            }
        }
    }

    async fn send(&self, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, req.path);
        let mut builder = match req.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        builder = builder.header("content-type", "application/json");
        if !self.token.is_empty() {
            builder = builder.bearer_auth(&self.token);
        }
        if let Some(payload) = &req.payload {
            builder = builder.json(payload);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "erro desconhecido".to_string());
            return Err(ApiError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        // 204 No Content e corpos vazios viram Null.
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()))?
        };

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}
