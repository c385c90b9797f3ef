//! ininal-sync - Sync Ininal wallet transactions into PocketSmith
//!
//! Login vào Ininal (OTP nếu bị challenge), mirror từng account trong ví
//! thành một PocketSmith account rồi reconcile lịch sử giao dịch - mỗi
//! transaction chỉ được tạo một lần dù chạy lại bao nhiêu lần.

mod cli;
mod config;
mod error;
mod ininal;
mod pocketsmith;
mod sync;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("ininal_pocketsmith={}", log_level).parse().unwrap()),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Sync {
            ininal,
            token,
            transaction_limit,
            history_months,
        } => {
            cli::commands::sync(ininal, token, transaction_limit, history_months)?;
        }
        Commands::Accounts { ininal } => {
            cli::commands::accounts(ininal)?;
        }
    }

    Ok(())
}
