//! Interface de linha de comando do labelscribe baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, resume, models)
//! e flags globais (--max-attempts, --output, --registry, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::writer::OutputFormat;

/// labelscribe: transcrição em lote, retomável, de etiquetas de espécimes com modelos de visão.
#[derive(Debug, Parser)]
#[command(name = "labelscribe", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Número máximo de tentativas de invocação por imagem.
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Diretório raiz dos resultados (sobrepõe `output_dir`).
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Caminho do registro de modelos (sobrepõe `registry_path`).
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inicia uma nova execução sobre uma lista de URLs de imagens.
    Run {
        /// Arquivo com uma URL (ou caminho) de imagem por linha.
        #[arg(long)]
        urls: PathBuf,

        /// Arquivo de prompt (texto com linhas `campo: descrição`, ou JSON).
        #[arg(long)]
        prompt: PathBuf,

        /// Id do modelo, id do perfil de inferência ou nome de exibição.
        #[arg(long)]
        model: String,

        /// Onde salvar o checkpoint da execução.
        #[arg(long)]
        checkpoint: Option<PathBuf>,

        /// Formato do arquivo combinado exportado ao final.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Retoma uma execução salva em checkpoint.
    Resume {
        /// Arquivo de checkpoint gerado por `run`.
        checkpoint: PathBuf,

        /// Formato do arquivo combinado exportado ao final.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Lista os modelos do registro com capacidades e preços.
    Models,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_run_subcommand() {
        let cli = Cli::parse_from([
            "labelscribe",
            "run",
            "--urls",
            "urls.txt",
            "--prompt",
            "prompts/herbarium.txt",
            "--model",
            "amazon.nova-lite-v1:0",
        ]);
        match cli.command {
            Command::Run {
                urls,
                prompt,
                model,
                checkpoint,
                format,
            } => {
                assert_eq!(urls, PathBuf::from("urls.txt"));
                assert_eq!(prompt, PathBuf::from("prompts/herbarium.txt"));
                assert_eq!(model, "amazon.nova-lite-v1:0");
                assert!(checkpoint.is_none());
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "labelscribe",
            "--max-attempts",
            "5",
            "--output",
            "out",
            "--verbose",
            "models",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.max_attempts, Some(5));
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert!(cli.registry.is_none());
        assert!(matches!(cli.command, Command::Models));
    }

    #[test]
    fn cli_parses_resume_with_format() {
        let cli = Cli::parse_from(["labelscribe", "resume", "run.json", "--format", "txt"]);
        match cli.command {
            Command::Resume { checkpoint, format } => {
                assert_eq!(checkpoint, PathBuf::from("run.json"));
                assert_eq!(format, OutputFormat::Txt);
            }
            _ => panic!("expected Resume command"),
        }
    }

    #[test]
    fn cli_requires_model_for_run() {
        let result = Cli::try_parse_from(["labelscribe", "run", "--urls", "u", "--prompt", "p"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
