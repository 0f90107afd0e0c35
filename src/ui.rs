//! Interface de terminal do toolkit — barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso do lote e `console`
//! para estilização com cores. O [`BatchProgress`] acompanha visualmente a
//! execução no terminal e imprime o resumo final por status.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::ProgressSink;
use crate::report::{BatchReport, ItemOutcome, ItemStatus};

/// Indicador visual de progresso para a execução de um lote no terminal.
///
/// Exibe uma barra com o total de itens e mensagens coloridas no resumo:
/// sucesso em verde, falha em vermelho, pulados em amarelo.
pub struct BatchProgress {
    // Barra de progresso do indicatif.
    pb: ProgressBar,
    // Estilo verde para sucesso.
    green: Style,
    // Estilo vermelho para falha.
    red: Style,
    // Estilo amarelo para parcial/pulado.
    yellow: Style,
}

impl BatchProgress {
    /// Inicia a barra com o total de itens e a descrição do serviço.
    pub fn start(total: u64, service: &str) -> Self {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
                .expect("invalid template"),
        );
        pb.set_message(service.to_string());

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Finaliza a barra e imprime o resumo colorido do lote.
    pub fn summarize(&self, report: &BatchReport) {
        self.pb.finish_and_clear();

        println!();
        println!(
            "  {} {} sucesso(s), {} parcial(is), {} falha(s), {} pulado(s)",
            if report.failed() == 0 {
                self.green.apply_to("✓")
            } else {
                self.red.apply_to("✗")
            },
            self.green.apply_to(report.succeeded()),
            self.yellow.apply_to(report.partial()),
            self.red.apply_to(report.failed()),
            self.yellow.apply_to(report.skipped()),
        );

        for (identifier, reason) in report.failures() {
            println!("  {} {identifier}: {reason}", self.red.apply_to("→"));
        }
    }
}

impl ProgressSink for BatchProgress {
    fn item_done(&self, outcome: &ItemOutcome) {
        if outcome.status != ItemStatus::Success {
            self.pb.println(format!(
                "  {} {}: {}",
                self.yellow.apply_to("!"),
                outcome.identifier,
                outcome.reason.as_deref().unwrap_or(""),
            ));
        }
        self.pb.inc(1);
    }
}
