//! Command implementations cho ininal-sync CLI.
//!
//! Các commands chính:
//! - sync: login (OTP nếu bị challenge) rồi reconcile toàn bộ accounts
//! - accounts: login rồi liệt kê accounts trong ví, không ghi gì

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use super::IninalArgs;
use crate::config::Config;
use crate::ininal::{AuthSession, IninalClient, LoginOutcome};
use crate::pocketsmith::PocketsmithClient;
use crate::sync::{SyncEngine, SyncOptions, SyncReport};

/// Đồng bộ toàn bộ wallet accounts sang PocketSmith.
pub fn sync(
    args: IninalArgs,
    token: String,
    transaction_limit: u32,
    history_months: u32,
) -> Result<()> {
    println!("{}", "Syncing Ininal wallet to PocketSmith...".cyan().bold());

    let config = build_config(args, transaction_limit, history_months)?;

    // PocketSmith user trước để fail sớm khi developer key sai
    let ledger = PocketsmithClient::new(&token);
    let user = ledger
        .current_user()
        .context("Cannot fetch PocketSmith user")?;
    println!("  {} PocketSmith user: {}", "✓".green(), user.id);

    let wallet = IninalClient::new(&config);
    let (user_token, session_token) = authenticate(&wallet, &config)?;

    let progress = spinner("Fetching wallet accounts...");
    let card_account = wallet.card_account(&user_token, &session_token);
    progress.finish_and_clear();
    let card_account = card_account.context("Cannot fetch wallet accounts")?;

    if card_account.account_list_response.is_empty() {
        println!("{}", "No wallet accounts found.".yellow());
        return Ok(());
    }
    println!(
        "  {} {} wallet account(s)",
        "✓".green(),
        card_account.account_list_response.len()
    );

    let engine = SyncEngine::new(
        &wallet,
        &ledger,
        user.id,
        &user_token,
        &card_account.access_token,
        SyncOptions {
            transaction_limit: config.transaction_limit,
            history_months: config.history_months,
        },
    );

    let progress = spinner("Reconciling transactions...");
    let report = engine.run(&card_account.account_list_response);
    progress.finish_and_clear();

    print_report(&report);

    if report.has_failures() {
        println!("\n{}", "Completed with failures, see warnings above.".yellow());
    } else {
        println!("\n{}", "Sync complete!".green().bold());
    }
    Ok(())
}

/// Liệt kê accounts trong ví cùng thông tin chủ tài khoản.
pub fn accounts(args: IninalArgs) -> Result<()> {
    println!("{}", "Listing Ininal wallet accounts...".cyan());

    let config = build_config(
        args,
        crate::config::DEFAULT_TRANSACTION_LIMIT,
        crate::config::DEFAULT_HISTORY_MONTHS,
    )?;
    let wallet = IninalClient::new(&config);
    let (user_token, session_token) = authenticate(&wallet, &config)?;

    let details = wallet
        .user_details(&user_token, &session_token)
        .context("Cannot fetch user details")?;
    println!(
        "\n{} {} <{}>",
        details.name.white().bold(),
        details.surname.white().bold(),
        details.email
    );
    println!(
        "  {} - {} - total balance {:.2}",
        details.gsm_number.dimmed(),
        details.user_status_text,
        details.total_active_card_balance
    );

    let card_account = wallet
        .card_account(&user_token, &session_token)
        .context("Cannot fetch wallet accounts")?;

    if card_account.account_list_response.is_empty() {
        println!("{}", "No wallet accounts found.".yellow());
        return Ok(());
    }

    println!();
    for (idx, account) in card_account.account_list_response.iter().enumerate() {
        println!(
            "  {}. {} [{}]",
            (idx + 1).to_string().cyan(),
            account.account_name.white().bold(),
            account.account_status.dimmed()
        );
        println!(
            "     {} - {:.2} {}",
            account.account_number.dimmed(),
            account.account_balance,
            account.currency
        );
        if !account.iban.is_empty() {
            println!("     {}", account.iban.dimmed());
        }
    }

    println!();
    Ok(())
}

/// Build Config bất biến từ CLI args; prompt password nếu chưa có.
fn build_config(
    args: IninalArgs,
    transaction_limit: u32,
    history_months: u32,
) -> Result<Config> {
    let password = match args.password {
        Some(password) if !password.is_empty() => password,
        _ => prompt_password("Ininal password: ")?,
    };

    Ok(Config {
        password,
        device_id: args.device_id,
        device_signature: args.device_signature,
        login_credential: args.login_credential,
        login_token: args.login_token,
        bearer_token: args.bearer_token,
        device_name: args.device_name,
        app_version: args.app_version,
        transaction_limit,
        history_months,
    })
}

/// Prompt cho password (không hiển thị input).
fn prompt_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let password = rpassword::read_password().context("Cannot read password")?;
    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    Ok(password)
}

/// Login flow: submit login, prompt OTP và resume nếu bị challenge.
///
/// State machine không tự block chờ input - prompt nằm ở đây, giữa hai
/// bước submit.
fn authenticate(wallet: &IninalClient, config: &Config) -> Result<(String, String)> {
    println!("\n{}", "Ininal Login".cyan().bold());

    let mut session = AuthSession::new(wallet, &config.login_token, &config.bearer_token);

    let mut outcome = session.submit_login().context("Login failed")?;
    if matches!(outcome, LoginOutcome::OtpRequired { .. }) {
        println!(
            "  {} OTP required, check the phone registered with Ininal",
            "→".cyan()
        );
        let code: String = Input::new()
            .with_prompt("OTP code")
            .interact_text()
            .context("Cannot read OTP code")?;
        outcome = session
            .submit_otp(code.trim())
            .context("OTP verification failed")?;
    } else {
        println!("  {} OTP not required", "→".cyan());
    }

    match outcome {
        LoginOutcome::Authenticated {
            user_token,
            session_token,
        } => {
            println!("  {} Authenticated", "✓".green());
            Ok((user_token, session_token))
        }
        // submit_otp chỉ trả Authenticated hoặc Err, nhánh này không xảy ra
        LoginOutcome::OtpRequired { .. } => bail!("login did not reach authenticated state"),
    }
}

/// In summary per-account sau khi engine chạy xong.
fn print_report(report: &SyncReport) {
    println!();
    for account in &report.accounts {
        println!(
            "{} {}",
            account.account_name.white().bold(),
            format!("→ {}", account.ledger_account_name).dimmed()
        );

        if let Some(error) = &account.error {
            println!("  {} aborted: {}", "✗".red(), error);
            continue;
        }

        println!(
            "  balance {:.2} - fetched {}, created {}, existing {}, failed {}",
            account.balance,
            account.fetched,
            account.created.to_string().green(),
            account.skipped_existing,
            account.failed
        );
        if account.early_exit {
            println!(
                "  {}",
                "stopped early: remaining history already synced".dimmed()
            );
        }
    }

    println!(
        "\n{} created, {} already existing",
        report.total_created().to_string().green().bold(),
        report.total_skipped()
    );
}

fn spinner(message: &str) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
