//! Binário do contract-toolkit.
//!
//! Carrega a configuração, monta o fluxo do serviço pedido e entrega o
//! lote ao coordenador; ctrl-c interrompe cooperativamente o lote e o
//! relatório parcial ainda é gravado.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contract_toolkit::api::ContractApiClient;
use contract_toolkit::batch::BatchCoordinator;
use contract_toolkit::cli::{Cli, Command};
use contract_toolkit::config::ToolkitConfig;
use contract_toolkit::input::parse_rows;
use contract_toolkit::reporter::writer_for;
use contract_toolkit::ui::BatchProgress;
use contract_toolkit::workflow::definition;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,contract_toolkit=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ToolkitConfig::load(&cli.config)?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(max_retries) = cli.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(deadline) = cli.deadline_secs {
        config.batch_deadline_secs = Some(deadline);
    }
    if let Command::Reprice {
        value: Some(value), ..
    } = &cli.command
    {
        config.reprice.default_value = Some(*value);
    }

    if config.base_url.is_empty() {
        anyhow::bail!("base_url não configurada em {}", cli.config.display());
    }

    let service = cli.command.service();
    let io = cli.command.io();
    let output = io
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("output/{service}.csv")));

    let text = std::fs::read_to_string(&io.input)
        .with_context(|| format!("não foi possível ler a entrada {}", io.input.display()))?;
    let rows = parse_rows(&text)?;

    tracing::info!(
        service = %service,
        input = %io.input.display(),
        rows = rows.len(),
        workers = config.workers,
        "serviço iniciado"
    );

    let client = Arc::new(ContractApiClient::new(&config));
    let workflow = definition(service, &config);
    let progress = Arc::new(BatchProgress::start(rows.len() as u64, &service.to_string()));

    let coordinator = BatchCoordinator::new(client, workflow, config.workers)
        .with_deadline(config.batch_deadline_secs.map(Duration::from_secs))
        .with_progress(progress.clone());

    // ctrl-c interrompe o lote cooperativamente: itens em voo terminam a
    // etapa corrente, o resto é marcado como SKIPPED.
    let stop = coordinator.stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("sinal de interrupção recebido, parando o lote");
            stop.stop();
        }
    });

    let report = coordinator.run(rows).await?;

    writer_for(&output).write(&report)?;
    progress.summarize(&report);
    tracing::info!(output = %output.display(), run_id = %report.run_id, "relatório gravado");

    Ok(())
}
