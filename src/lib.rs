//! contract-toolkit — motor de ajustes de contrato em lote.
//!
//! Lê linhas identificando contratos, aplica a cada uma um fluxo ordenado
//! de chamadas HTTP contra a API contratual (cancelar, descredenciar,
//! reprecificar, reativar), tolera falha parcial e produz um resultado
//! auditável por item, opcionalmente em paralelo sob um pool limitado.

pub mod api;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod input;
pub mod report;
pub mod reporter;
pub mod ui;
pub mod workflow;

pub use batch::{BatchCoordinator, StopSignal};
pub use config::ToolkitConfig;
pub use error::ToolkitError;
pub use report::BatchReport;
