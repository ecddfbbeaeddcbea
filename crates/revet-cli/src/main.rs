//! CLI entry point for revet.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and
//! exit codes. All orchestration lives in the `revet-app` crate.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use revet_app::{
    find_policy_file, results_envelope, run_exit_code, run_policy, serialize_envelope,
    PolicySource, RunInput,
};
use revet_context::InputDocument;
use revet_runtime::ExecutionBudgets;
use std::io::Read;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "revet",
    version,
    about = "Policy execution engine for code-review automation"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a policy script against a review-context document.
    Run {
        /// Path to the policy file (default: revetfile.ts / revetfile.js
        /// in the working directory).
        #[arg(long)]
        policy: Option<Utf8PathBuf>,

        /// Remote policy reference (`owner/repo/path[@branch]`), fetched
        /// from the source-control host instead of disk.
        #[arg(long, conflicts_with = "policy")]
        remote: Option<String>,

        /// Input document JSON; `-` reads standard input. Omitted means an
        /// empty review context.
        #[arg(long)]
        input: Option<Utf8PathBuf>,

        /// Where to write the results JSON (default: standard output).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Run {
            policy,
            remote,
            input,
            output,
        } => match cmd_run(policy, remote, input, output) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("revet: {err:#}");
                ExitCode::from(2)
            }
        },
    }
}

fn cmd_run(
    policy: Option<Utf8PathBuf>,
    remote: Option<String>,
    input: Option<Utf8PathBuf>,
    output: Option<Utf8PathBuf>,
) -> anyhow::Result<ExitCode> {
    let cwd = Utf8PathBuf::from_path_buf(std::env::current_dir().context("working directory")?)
        .map_err(|p| anyhow::anyhow!("non-UTF-8 working directory: {}", p.display()))?;

    let source = if let Some(reference) = remote {
        PolicySource::Remote(reference)
    } else if let Some(path) = policy {
        PolicySource::Local(path)
    } else {
        let discovered = find_policy_file(&cwd)
            .context("no revetfile.ts or revetfile.js in the working directory")?;
        PolicySource::Local(discovered)
    };

    let document = read_input_document(input.as_deref())?;

    let outcome = run_policy(RunInput {
        policy: source,
        document,
        cwd,
        budgets: ExecutionBudgets::default(),
    });

    match outcome {
        Ok(results) => {
            let text = serialize_envelope(&results_envelope(results.clone()))?;
            match output {
                Some(path) => {
                    std::fs::write(path.as_std_path(), text)
                        .with_context(|| format!("write results to {path}"))?;
                }
                None => println!("{text}"),
            }
            Ok(ExitCode::from(run_exit_code(&results) as u8))
        }
        Err(err) => {
            eprintln!("revet[{}]: {err}", err.kind().as_str());
            Ok(ExitCode::from(2))
        }
    }
}

fn read_input_document(input: Option<&camino::Utf8Path>) -> anyhow::Result<InputDocument> {
    let Some(path) = input else {
        return Ok(InputDocument::default());
    };
    let text = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read input document from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path.as_std_path())
            .with_context(|| format!("read input document {path}"))?
    };
    InputDocument::from_json_str(&text).context("parse input document")
}
