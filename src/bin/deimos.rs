//! Deimos CLI
//!
//! Compiles deimoslang ASTs and dry-runs them against simulated clients.

use deimos_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
