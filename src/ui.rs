//! Interface de terminal do labelscribe: barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso da execução e `console`
//! para estilização com cores e leitura da decisão do operador. O
//! [`RunProgress`] acompanha visualmente o processamento dos jobs.

use std::io;

use console::{Style, Term};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::error::LabelscribeError;
use crate::registry::ModelSpec;
use crate::state_machine::{Decision, Job, JobStatus, RunState, RunSummary};

/// Indicador visual de progresso de uma execução no terminal.
///
/// Exibe uma barra com o número de jobs finalizados e mensagens coloridas
/// para sucesso (verde), falha (vermelho) e pausa (amarelo).
pub struct RunProgress {
    // Barra de progresso do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl RunProgress {
    /// Inicia a barra com o total de jobs e quantos já estão finalizados.
    pub fn start(state: &RunState, model: &str) -> Self {
        let pb = ProgressBar::with_draw_target(
            Some(state.jobs().len() as u64),
            ProgressDrawTarget::stdout(),
        );
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        pb.set_style(style);
        pb.set_position(state.completed().count() as u64);
        pb.set_message(model.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }

    /// Atualiza a barra e imprime o resultado do último job processado.
    pub fn job_finished(&self, state: &RunState, job: &Job) {
        self.pb.set_position(state.completed().count() as u64);
        match (job.status, &job.last_error) {
            (JobStatus::Success, _) => {
                let confident = job.result.as_ref().map(|r| r.confident_count()).unwrap_or(0);
                let total = job.result.as_ref().map(|r| r.len()).unwrap_or(0);
                self.pb.println(format!(
                    "  {} {} {}",
                    self.green.apply_to("✓"),
                    job.id,
                    self.dim.apply_to(format!("({confident}/{total} fields)"))
                ));
            }
            (JobStatus::Failed, Some(err)) => {
                self.pb.println(format!(
                    "  {} {} [{}] {}",
                    self.red.apply_to("✗"),
                    job.id,
                    err.kind,
                    err.message
                ));
            }
            _ => {}
        }
    }

    /// Mostra os jobs falhos que aguardam uma decisão do operador.
    pub fn paused(&self, state: &RunState) {
        let failed: Vec<&Job> = state
            .pending_decision()
            .map(|p| p.failed.iter().filter_map(|id| state.job(id)).collect())
            .unwrap_or_default();

        self.pb.suspend(|| {
            println!();
            println!(
                "{}",
                self.yellow.apply_to(format!(
                    "─── Paused: {} failed job(s), {} queued ───",
                    failed.len(),
                    state.to_process().count()
                ))
            );
            for job in failed {
                let exhausted = job.attempts >= state.max_attempts();
                let attempts = format!("attempt {}/{}", job.attempts, state.max_attempts());
                match &job.last_error {
                    Some(err) => println!(
                        "  {} {} [{}] {}{}\n      {}",
                        self.red.apply_to("✗"),
                        job.id,
                        err.kind,
                        err.message,
                        if exhausted { " (no attempts left)" } else { "" },
                        self.dim.apply_to(format!("{attempts}; {}", err.kind.hint()))
                    ),
                    None => println!("  {} {} {attempts}", self.red.apply_to("✗"), job.id),
                }
            }
        });
    }

    /// Suspende a barra enquanto o operador responde.
    pub fn ask_decision(&self, term: &Term) -> io::Result<Decision> {
        self.pb.suspend(|| prompt_decision(term))
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// Pergunta a decisão ao operador até receber uma resposta válida.
fn prompt_decision(term: &Term) -> io::Result<Decision> {
    let yellow = Style::new().yellow();
    loop {
        term.write_line(&format!(
            "{} [r]etry failed, [s]kip failed, [a]bort, [w]ait (save and exit)",
            yellow.apply_to("?")
        ))?;
        let answer = term.read_line()?;
        match answer.parse::<Decision>() {
            Ok(decision) => return Ok(decision),
            Err(LabelscribeError::InvalidDecision(text)) => {
                term.write_line(&format!(
                    "  {} not a decision: {text:?}",
                    Style::new().red().apply_to("✗")
                ))?;
            }
            Err(e) => return Err(io::Error::other(e.to_string())),
        }
    }
}

/// Imprime o resumo da execução com contagens e custos.
pub fn print_summary(summary: &RunSummary) {
    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    let yellow = Style::new().yellow();

    println!();
    println!("{}", green.apply_to("─── Run Summary ───"));
    println!("  total:   {}", summary.total);
    println!("  success: {}", green.apply_to(summary.success));
    println!("  failed:  {}", red.apply_to(summary.failed));
    println!("  skipped: {}", yellow.apply_to(summary.skipped));
    println!("  pending: {}", summary.pending);
    let costs = &summary.costs;
    println!(
        "  tokens:  {} in / {} out ({} total)",
        costs.input_tokens,
        costs.output_tokens,
        costs.total_tokens()
    );
    println!(
        "  cost:    ${:.4} (input ${:.4}, output ${:.4})",
        costs.total_cost(),
        costs.input_cost,
        costs.output_cost
    );
}

/// Lista os modelos do registro.
pub fn print_models(models: &[ModelSpec]) {
    let bold = Style::new().bold();
    let dim = Style::new().dim();
    for spec in models {
        let family = spec
            .family()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "?".to_string());
        let mut caps = Vec::new();
        if spec.supports_structured_output {
            caps.push("structured");
        }
        if spec.supports_inference_profile {
            caps.push("profile");
        }
        println!(
            "{} {} [{family}] {}",
            bold.apply_to(&spec.display_name),
            dim.apply_to(spec.invocation_target()),
            caps.join(", ")
        );
        println!(
            "    ${:.2} / ${:.2} per million tokens (in/out), max {} tokens",
            spec.pricing.input_per_million, spec.pricing.output_per_million, spec.max_tokens
        );
    }
}
