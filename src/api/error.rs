//! Tipos de erro para o cliente da API contratual.
//!
//! Define [`ApiError`] com variantes para falha de transporte, erro remoto
//! e resposta indecodificável. Usa `thiserror` para derivar `Display` e
//! `Error` automaticamente a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com a API contratual.
///
/// As variantes cobrem os três cenários de falha de uma chamada:
/// - [`Transport`](ApiError::Transport) — falha na camada de rede
///   (DNS, conexão recusada, timeout). Única variante retentável.
/// - [`Remote`](ApiError::Remote) — o servidor respondeu 4xx/5xx; o corpo
///   é preservado para a camada de etapas decidir fatal vs. brando.
/// - [`InvalidResponse`](ApiError::InvalidResponse) — resposta 2xx com
///   corpo que não pôde ser decodificado como JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Falha de rede subjacente. Encapsula o erro original do `reqwest`.
    #[error("erro de rede: {0}")]
    Transport(#[from] reqwest::Error),

    /// Erro retornado pela API (ex.: 404 contrato inexistente, 500 interno).
    /// Nunca é retentado pelo cliente: PUT/POST não são idempotentes e o
    /// estado remoto após um 5xx é ambíguo.
    #[error("erro da API (status {status}): {body}")]
    Remote { status: u16, body: String },

    /// Resposta com status de sucesso mas corpo indecodificável.
    #[error("resposta inválida da API: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display() {
        let err = ApiError::Remote {
            status: 404,
            body: "contrato inexistente".into(),
        };
        assert_eq!(
            err.to_string(),
            "erro da API (status 404): contrato inexistente"
        );
    }

    #[test]
    fn invalid_response_display() {
        let err = ApiError::InvalidResponse("corpo vazio".into());
        assert_eq!(err.to_string(), "resposta inválida da API: corpo vazio");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
