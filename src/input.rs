//! Leitura das linhas de entrada (CSV separado por `;`).
//!
//! O arquivo de entrada tem cabeçalho `EC;CONTRATO[;SERIAL][;VALOR]` e uma
//! linha por contrato. Linhas malformadas não abortam o lote: cada uma vira
//! um [`RowOutcome::Rejected`] que o coordenador registra como FAILED.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::error::ToolkitError;

/// Identificador imutável de um contrato: EC (cliente) + número do contrato.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ContractId {
    pub client: u64,
    pub contract: u64,
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.client, self.contract)
    }
}

/// Uma unidade de trabalho extraída de uma linha válida da entrada.
#[derive(Debug, Clone)]
pub struct ContractItem {
    /// Número da linha no arquivo de entrada (1-based, cabeçalho incluso).
    pub row: usize,
    pub id: ContractId,
    /// Serial do equipamento (coluna SERIAL, quando presente).
    pub serial: Option<String>,
    /// Novo valor de negociação (coluna VALOR, só para reprecificação).
    pub new_value: Option<f64>,
}

/// Erro local a uma linha da entrada. Nunca se propaga: vira um outcome
/// FAILED com o motivo legível.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("campo '{column}' ausente")]
    MissingField { column: &'static str },

    #[error("valor inválido em '{column}': '{value}'")]
    InvalidNumber { column: &'static str, value: String },

    #[error("EC/CONTRATO duplicado (primeira ocorrência na linha {first_row})")]
    Duplicate { first_row: usize },
}

/// Resultado da leitura de uma linha de dados.
#[derive(Debug)]
pub enum RowOutcome {
    Parsed(ContractItem),
    Rejected {
        row: usize,
        raw: String,
        error: RowError,
    },
}

struct Columns {
    ec: usize,
    contract: usize,
    serial: Option<usize>,
    value: Option<usize>,
}

fn parse_header(line: &str) -> Result<Columns, ToolkitError> {
    let mut ec = None;
    let mut contract = None;
    let mut serial = None;
    let mut value = None;
    for (idx, name) in line.split(';').enumerate() {
        match name.trim().to_uppercase().as_str() {
            "EC" => ec = Some(idx),
            "CONTRATO" | "CONTRATOS" => contract = Some(idx),
            "SERIAL" => serial = Some(idx),
            "VALOR" => value = Some(idx),
            _ => {}
        }
    }
    match (ec, contract) {
        (Some(ec), Some(contract)) => Ok(Columns {
            ec,
            contract,
            serial,
            value,
        }),
        _ => Err(ToolkitError::Config(format!(
            "cabeçalho inválido (esperado ao menos EC;CONTRATO): '{}'",
            line.trim()
        ))),
    }
}

fn field<'a>(parts: &'a [&'a str], idx: usize) -> &'a str {
    parts.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn parse_u64(parts: &[&str], idx: usize, column: &'static str) -> Result<u64, RowError> {
    let raw = field(parts, idx);
    if raw.is_empty() {
        return Err(RowError::MissingField { column });
    }
    raw.parse::<u64>().map_err(|_| RowError::InvalidNumber {
        column,
        value: raw.to_string(),
    })
}

/// Interpreta o texto completo do arquivo de entrada.
///
/// Cada linha de dados vira exatamente um [`RowOutcome`]; linhas em branco
/// são puladas. Um EC/CONTRATO repetido é rejeitado apontando a primeira
/// ocorrência, de modo que cada contrato seja despachado no máximo uma vez
/// e a contagem de outcomes continue igual à de linhas.
pub fn parse_rows(text: &str) -> Result<Vec<RowOutcome>, ToolkitError> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| ToolkitError::Config("arquivo de entrada vazio".into()))?;
    let columns = parse_header(header)?;

    let mut outcomes = Vec::new();
    let mut seen: HashMap<ContractId, usize> = HashMap::new();

    for (idx, line) in lines {
        let row = idx + 1;
        let parts: Vec<&str> = line.split(';').collect();

        let parsed = (|| {
            let client = parse_u64(&parts, columns.ec, "EC")?;
            let contract = parse_u64(&parts, columns.contract, "CONTRATO")?;
            let id = ContractId { client, contract };

            if let Some(first_row) = seen.get(&id) {
                return Err(RowError::Duplicate {
                    first_row: *first_row,
                });
            }

            let serial = columns
                .serial
                .map(|i| field(&parts, i))
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            let new_value = match columns.value.map(|i| field(&parts, i)) {
                Some(raw) if !raw.is_empty() => {
                    Some(raw.parse::<f64>().map_err(|_| RowError::InvalidNumber {
                        column: "VALOR",
                        value: raw.to_string(),
                    })?)
                }
                _ => None,
            };

            seen.insert(id, row);
            Ok(ContractItem {
                row,
                id,
                serial,
                new_value,
            })
        })();

        match parsed {
            Ok(item) => outcomes.push(RowOutcome::Parsed(item)),
            Err(error) => outcomes.push(RowOutcome::Rejected {
                row,
                raw: line.trim().to_string(),
                error,
            }),
        }
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_rows() {
        let text = "EC;CONTRATO;SERIAL\n999;12345;ABC123\n999;12346;\n";
        let rows = parse_rows(text).unwrap();
        assert_eq!(rows.len(), 2);
        match &rows[0] {
            RowOutcome::Parsed(item) => {
                assert_eq!(item.row, 2);
                assert_eq!(item.id.client, 999);
                assert_eq!(item.id.contract, 12345);
                assert_eq!(item.serial.as_deref(), Some("ABC123"));
                assert!(item.new_value.is_none());
            }
            other => panic!("esperado Parsed, obtido {other:?}"),
        }
        match &rows[1] {
            RowOutcome::Parsed(item) => assert!(item.serial.is_none()),
            other => panic!("esperado Parsed, obtido {other:?}"),
        }
    }

    #[test]
    fn parses_valor_column() {
        let text = "EC;CONTRATO;VALOR\n1;10;49.9\n1;11;\n";
        let rows = parse_rows(text).unwrap();
        match &rows[0] {
            RowOutcome::Parsed(item) => assert_eq!(item.new_value, Some(49.9)),
            other => panic!("esperado Parsed, obtido {other:?}"),
        }
        match &rows[1] {
            RowOutcome::Parsed(item) => assert!(item.new_value.is_none()),
            other => panic!("esperado Parsed, obtido {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_numbers_without_aborting() {
        let text = "EC;CONTRATO\nabc;12345\n999;12346\n";
        let rows = parse_rows(text).unwrap();
        assert_eq!(rows.len(), 2);
        match &rows[0] {
            RowOutcome::Rejected { row, error, .. } => {
                assert_eq!(*row, 2);
                assert!(matches!(
                    error,
                    RowError::InvalidNumber { column: "EC", .. }
                ));
            }
            other => panic!("esperado Rejected, obtido {other:?}"),
        }
        assert!(matches!(rows[1], RowOutcome::Parsed(_)));
    }

    #[test]
    fn rejects_duplicate_contract() {
        let text = "EC;CONTRATO\n1;10\n1;10\n";
        let rows = parse_rows(text).unwrap();
        match &rows[1] {
            RowOutcome::Rejected { error, .. } => {
                assert!(matches!(error, RowError::Duplicate { first_row: 2 }));
            }
            other => panic!("esperado Rejected, obtido {other:?}"),
        }
    }

    #[test]
    fn skips_blank_lines() {
        let text = "EC;CONTRATO\n\n1;10\n\n\n1;11\n";
        let rows = parse_rows(text).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn missing_header_is_a_startup_error() {
        assert!(parse_rows("FOO;BAR\n1;2\n").is_err());
        assert!(parse_rows("").is_err());
    }

    #[test]
    fn contract_id_display() {
        let id = ContractId {
            client: 999,
            contract: 12345,
        };
        assert_eq!(id.to_string(), "999/12345");
    }

    #[test]
    fn accepts_contratos_header_variant() {
        // O serviço de descredenciamento original usava a coluna CONTRATOS.
        let rows = parse_rows("EC;CONTRATOS\n1;10\n").unwrap();
        assert!(matches!(rows[0], RowOutcome::Parsed(_)));
    }
}
