//! imgsweep CLI entry point
//!
//! Parses arguments, runs the sweep and renders failures with context and
//! suggestions. Any failure exits with status 1.

use anyhow::Result;
use clap::Parser;
use imgsweep_cli::cli;
use imgsweep_cli::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
