//! Interface de linha de comando do toolkit baseada em clap.
//!
//! Define a struct [`Cli`] com um subcomando [`Command`] por serviço
//! (cancel, deactivate, reprice, reactivate) e flags globais
//! (--config, --workers, --max-retries, --deadline-secs, --verbose).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::workflow::Service;

/// contract-toolkit — Ajustes de contrato em lote contra a API contratual.
#[derive(Debug, Parser)]
#[command(name = "contract-toolkit", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração TOML.
    #[arg(long, global = true, default_value = "contract-toolkit.toml")]
    pub config: PathBuf,

    /// Número de workers do pool (sobrepõe a configuração).
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Retentativas máximas para falha de transporte (sobrepõe a configuração).
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Prazo total do lote em segundos (sobrepõe a configuração).
    #[arg(long, global = true)]
    pub deadline_secs: Option<u64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Argumentos de entrada/saída comuns a todos os serviços.
#[derive(Debug, Args)]
pub struct IoArgs {
    /// Arquivo CSV de entrada (separado por ';', cabeçalho EC;CONTRATO;...).
    #[arg(long)]
    pub input: PathBuf,

    /// Arquivo de saída (.json para relatório completo, senão CSV).
    /// Padrão: output/<serviço>.csv
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cancela contratos diretamente, sem abertura de OS.
    Cancel {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Solicita o descredenciamento com OS; o fluxo remoto assume.
    Deactivate {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Altera o valor negociado dos contratos.
    Reprice {
        #[command(flatten)]
        io: IoArgs,

        /// Valor aplicado às linhas sem a coluna VALOR.
        #[arg(long)]
        value: Option<f64>,
    },

    /// Reativa contratos cancelados.
    Reactivate {
        #[command(flatten)]
        io: IoArgs,
    },
}

impl Command {
    pub fn service(&self) -> Service {
        match self {
            Command::Cancel { .. } => Service::Cancel,
            Command::Deactivate { .. } => Service::Deactivate,
            Command::Reprice { .. } => Service::Reprice,
            Command::Reactivate { .. } => Service::Reactivate,
        }
    }

    pub fn io(&self) -> &IoArgs {
        match self {
            Command::Cancel { io }
            | Command::Deactivate { io }
            | Command::Reactivate { io } => io,
            Command::Reprice { io, .. } => io,
        }
    }
}
