//! Persistência do relatório do lote.
//!
//! O [`ReportWriter`] é o colaborador externo que recebe o
//! [`BatchReport`] pronto; o motor nunca escreve em disco por conta
//! própria. Duas implementações: planilha CSV separada por `;` (o papel
//! da planilha de resultados original) e JSON completo para auditoria.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ToolkitError;
use crate::report::BatchReport;

pub trait ReportWriter {
    fn write(&self, report: &BatchReport) -> Result<(), ToolkitError>;
}

/// Planilha CSV `EC_CONTRATO;STATUS;ETAPAS_OK;ETAPAS_TOTAL;MOTIVO`.
pub struct CsvReportWriter {
    pub path: PathBuf,
}

impl ReportWriter for CsvReportWriter {
    fn write(&self, report: &BatchReport) -> Result<(), ToolkitError> {
        let mut out = String::from("EC_CONTRATO;STATUS;ETAPAS_OK;ETAPAS_TOTAL;MOTIVO\n");
        for outcome in &report.outcomes {
            let ok_steps = outcome.steps.iter().filter(|s| s.ok).count();
            let reason = outcome.reason.as_deref().unwrap_or("").replace(';', ",");
            let _ = writeln!(
                out,
                "{};{};{};{};{}",
                outcome.identifier,
                outcome.status,
                ok_steps,
                outcome.steps.len(),
                reason
            );
        }
        ensure_parent(&self.path)?;
        fs::write(&self.path, out)?;
        Ok(())
    }
}

/// Relatório completo em JSON identado.
pub struct JsonReportWriter {
    pub path: PathBuf,
}

impl ReportWriter for JsonReportWriter {
    fn write(&self, report: &BatchReport) -> Result<(), ToolkitError> {
        ensure_parent(&self.path)?;
        fs::write(&self.path, serde_json::to_string_pretty(report)?)?;
        Ok(())
    }
}

// Garante que o diretório de saída exista.
fn ensure_parent(path: &Path) -> Result<(), ToolkitError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Escolhe o formato pela extensão do caminho: `.json` → JSON, senão CSV.
pub fn writer_for(path: &Path) -> Box<dyn ReportWriter> {
    if path.extension().is_some_and(|ext| ext == "json") {
        Box::new(JsonReportWriter {
            path: path.to_path_buf(),
        })
    } else {
        Box::new(CsvReportWriter {
            path: path.to_path_buf(),
        })
    }
}
