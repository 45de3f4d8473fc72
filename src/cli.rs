use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::client::Client;
use crate::client_adapter::DryRunClient;
use crate::config::{Config, LoggingSettings};
use crate::interpreter::{Compiler, Program, Stmt, VM};
use crate::supervisor::TaskSupervisor;

#[derive(Parser)]
#[command(name = "deimos")]
#[command(about = "Deimos - compile and dry-run deimoslang bot scripts", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides ./deimos.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a parsed script (JSON AST) and print the program
    Compile {
        /// Path to the JSON statement list
        ast: PathBuf,

        /// Print the program as JSON instead of the debug listing
        #[arg(long)]
        json: bool,
    },

    /// Run a parsed script against simulated clients
    DryRun {
        /// Path to the JSON statement list
        ast: PathBuf,

        /// Number of simulated clients (p1, p2, ...)
        #[arg(long, default_value = "1")]
        clients: usize,

        /// Stop after this many instructions
        #[arg(long)]
        max_steps: Option<u64>,
    },
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

/// Install the stderr subscriber; `RUST_LOG` wins over the configured filter
pub fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.filter));
    // Already installed (e.g. by an embedding application) is fine
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    let config = Config::builder()
        .config_path(cli.config)
        .build()
        .context("Failed to load configuration")?;
    init_logging(&config.logging);

    match cli.command {
        Commands::Compile { ast, json } => {
            let program = compile_file(&ast)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&program)?);
            } else {
                print!("{}", program);
            }
            println!("fingerprint: {}", program.fingerprint());
        }

        Commands::DryRun {
            ast,
            clients,
            max_steps,
        } => {
            let program = compile_file(&ast)?;
            dry_run(&config, program, clients, max_steps).await?;
        }
    }

    Ok(())
}

fn compile_file(path: &Path) -> Result<Program> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let stmts: Vec<Stmt> = serde_json::from_str(&source)
        .with_context(|| format!("Failed to parse AST in {}", path.display()))?;
    Compiler::compile(&stmts).with_context(|| format!("Failed to compile {}", path.display()))
}

async fn dry_run(
    config: &Config,
    program: Program,
    client_count: usize,
    max_steps: Option<u64>,
) -> Result<()> {
    let clients: Vec<Arc<DryRunClient>> = (1..=client_count)
        .map(|n| Arc::new(DryRunClient::new(format!("p{}", n))))
        .collect();
    let handles: Vec<Arc<dyn Client>> = clients
        .iter()
        .map(|c| Arc::clone(c) as Arc<dyn Client>)
        .collect();

    let mut vm = VM::new(handles).with_settings(config.vm.clone());
    vm.load(program);

    // Background work runs under the supervisor; its first failure ends the run
    let supervisor = TaskSupervisor::new(&config.supervisor);
    supervisor.start();

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    supervisor.spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for ctrl-c")?;
        ctrl_c.cancel();
        Ok(())
    });

    let watch = supervisor.join();
    tokio::pin!(watch);
    let mut watching = true;

    let mut steps: u64 = 0;
    vm.start();
    while vm.is_running() {
        if max_steps.is_some_and(|max| steps >= max) {
            println!("Stopped after {} steps (--max-steps)", steps);
            vm.stop();
            break;
        }
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = &mut watch, if watching => {
                watching = false;
                if let Err(err) = result {
                    supervisor.shutdown();
                    return Err(err).context("Background task failed");
                }
                continue;
            }
            result = vm.step() => Some(result),
        };
        match outcome {
            None => {
                println!("Interrupted");
                vm.stop();
            }
            Some(result) => {
                if let Err(err) = result {
                    supervisor.shutdown();
                    return Err(err).with_context(|| format!("Instruction {} failed", vm.ip()));
                }
                steps += 1;
            }
        }
    }
    supervisor.shutdown();

    println!("Steps: {}", steps);
    println!("Killed: {}", vm.is_killed());
    for client in &clients {
        println!("  {}: {} action(s)", client.title(), client.actions());
    }
    Ok(())
}
