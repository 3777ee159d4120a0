//! Interface de terminal do surfadapt: spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. O [`JobProgress`] acompanha visualmente
//! as etapas de um job no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::state_machine::{JobReport, ResultStatus, Stage};
use crate::timer::Elapsed;

/// Indicador visual de progresso para a execução de um job no terminal.
///
/// Exibe um spinner animado durante as etapas e mensagens coloridas
/// para sucesso (verde), falha leve (amarelo) e falha grave (vermelho).
pub struct JobProgress {
    // Spinner do indicatif; oculto quando os logs vão para o terminal.
    pb: ProgressBar,
    green: Style,
    yellow: Style,
    red: Style,
}

impl JobProgress {
    /// Inicia o spinner com o nome da malha de entrada.
    pub fn start(input: &str, hidden: bool) -> Self {
        let pb = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        // Template fixo; um erro aqui só perde a formatação.
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{}: {input}", Stage::Init));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            yellow: Style::new().yellow().bold(),
            red: Style::new().red().bold(),
        }
    }

    /// Atualiza a mensagem do spinner para a etapa atual.
    pub fn update_stage(&self, stage: Stage) {
        self.pb.set_message(format!("{stage}"));
    }

    /// Finaliza o spinner e exibe o status final.
    pub fn complete(&self, status: ResultStatus) {
        self.pb.finish_and_clear();
        let (style, mark) = match status {
            ResultStatus::Success => (&self.green, "✓"),
            ResultStatus::LowFailure => (&self.yellow, "!"),
            ResultStatus::StrongFailure => (&self.red, "✗"),
        };
        println!("  {} {status}", style.apply_to(mark));
    }

    /// Imprime o relatório do job formatado em JSON.
    pub fn print_report(&self, report: &JobReport) {
        let style = match report.status {
            ResultStatus::Success => &self.green,
            ResultStatus::LowFailure => &self.yellow,
            ResultStatus::StrongFailure => &self.red,
        };
        println!();
        println!("{}", style.apply_to("─── Job Report ───"));
        println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
    }
}

/// Linha final com o tempo total do processo, impressa em qualquer desfecho.
pub fn print_elapsed(elapsed: Elapsed) {
    println!("{}", elapsed_line(elapsed));
}

fn elapsed_line(elapsed: Elapsed) -> String {
    format!("\n   ELAPSED TIME  {elapsed}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn elapsed_line_carries_the_formatted_time() {
        let elapsed = Elapsed(Duration::from_millis(1500));
        let line = elapsed_line(elapsed);
        assert!(line.starts_with("\n   ELAPSED TIME  "));
        assert!(line.ends_with(&elapsed.to_string()));
    }
}
