use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{anyhow, Result};
use tempfile::tempdir;

const DEMO_LOGIN: [&str; 4] = ["--email", "demo@omsin.com", "--password", "demo123"];
const JANE_LOGIN: [&str; 4] = ["--email", "jane@omsin.com", "--password", "fatou123"];

fn run_cli(data_file: &Path, args: &[&str]) -> Result<Output> {
    let binary_path = env!("CARGO_BIN_EXE_omsin-ledger");

    let output = Command::new(binary_path)
        .arg("--data")
        .arg(data_file)
        .args(args)
        .env_remove("RUST_LOG")
        .output()?;

    Ok(output)
}

fn stdout_of(output: &Output) -> Result<String> {
    Ok(String::from_utf8(output.stdout.clone())?)
}

fn history_rows(data_file: &Path, login: &[&str], extra: &[&str]) -> Result<Vec<Vec<String>>> {
    let mut args = vec!["history"];
    args.extend_from_slice(login);
    args.extend_from_slice(extra);

    let output = run_cli(data_file, &args)?;
    assert!(output.status.success());

    let stdout = stdout_of(&output)?;
    let mut lines = stdout.lines();

    assert_eq!(lines.next(), Some("id,date,type,amount,description,balance"));

    Ok(lines.map(|line| line.split(',').map(str::to_string).collect()).collect())
}

#[test]
fn test_cli_lists_seeded_accounts_on_first_run() -> Result<()> {
    let directory = tempdir()?;
    let data_file = directory.path().join("ledger.json");

    let output = run_cli(&data_file, &["accounts"])?;

    assert!(output.status.success());
    assert!(data_file.exists());

    let stdout = stdout_of(&output)?;
    let mut lines = stdout.lines();

    assert_eq!(lines.next(), Some("account_number,name,account_type,balance"));
    assert_eq!(lines.next(), Some("1234567890,Omar Sima,Savings,15750.50"));
    assert_eq!(lines.next(), Some("0987654321,Fatou Kah,Checking,8920.75"));
    assert_eq!(lines.next(), Some("0747954315,Cheikh Peters,Checking,2000.25"));
    assert_eq!(lines.next(), None);

    Ok(())
}

#[test]
fn test_cli_transfer_updates_both_histories() -> Result<()> {
    let directory = tempdir()?;
    let data_file = directory.path().join("ledger.json");

    let mut args = vec!["transfer"];
    args.extend_from_slice(&DEMO_LOGIN);
    args.extend_from_slice(&["--to", "0987654321", "--amount", "100.00", "--description", "Rent"]);

    let output = run_cli(&data_file, &args)?;
    assert!(output.status.success());

    let stdout = stdout_of(&output)?;
    assert!(stdout.contains("Successfully transferred $100.00 to Fatou Kah"));
    assert!(stdout.contains("New balance: $15,650.50"));

    let sender_rows = history_rows(&data_file, &DEMO_LOGIN, &[])?;
    assert_eq!(sender_rows.len(), 1);
    assert_eq!(sender_rows[0][2], "debit");
    assert_eq!(sender_rows[0][3], "100.00");
    assert_eq!(sender_rows[0][5], "15650.50");

    let recipient_rows = history_rows(&data_file, &JANE_LOGIN, &[])?;
    assert_eq!(recipient_rows.len(), 1);
    assert_eq!(recipient_rows[0][2], "credit");
    assert_eq!(recipient_rows[0][5], "9020.75");

    let credits_only = history_rows(&data_file, &DEMO_LOGIN, &["--type", "credit"])?;
    assert!(credits_only.is_empty());

    Ok(())
}

#[test]
fn test_cli_rejects_transfer_above_limit_without_changing_data() -> Result<()> {
    let directory = tempdir()?;
    let data_file = directory.path().join("ledger.json");

    run_cli(&data_file, &["accounts"])?;
    let before = fs::read_to_string(&data_file)?;

    let mut args = vec!["transfer"];
    args.extend_from_slice(&DEMO_LOGIN);
    args.extend_from_slice(&["--to", "0987654321", "--amount", "10000.01", "--description", "Car"]);

    let output = run_cli(&data_file, &args)?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr)?.contains("Transfer limit exceeded. Maximum transfer amount is $10,000.00"));
    assert_eq!(fs::read_to_string(&data_file)?, before);

    Ok(())
}

#[test]
fn test_cli_reports_invalid_credentials() -> Result<()> {
    let directory = tempdir()?;
    let data_file = directory.path().join("ledger.json");

    let output = run_cli(&data_file, &["dashboard", "--email", "demo@omsin.com", "--password", "wrong"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr)?.contains("Invalid email or password"));

    Ok(())
}

#[test]
fn test_cli_profile_update_changes_login_email() -> Result<()> {
    let directory = tempdir()?;
    let data_file = directory.path().join("ledger.json");

    let mut args = vec!["profile"];
    args.extend_from_slice(&DEMO_LOGIN);
    args.extend_from_slice(&["--name", "Omar Sima", "--new-email", "omar@omsin.com", "--phone", "+220 555 0100"]);

    let output = run_cli(&data_file, &args)?;
    assert!(output.status.success());
    assert!(stdout_of(&output)?.contains("Profile updated successfully!"));

    let old_login = run_cli(&data_file, &["dashboard", "--email", "demo@omsin.com", "--password", "demo123"])?;
    assert!(!old_login.status.success());

    let new_login = run_cli(&data_file, &["dashboard", "--email", "omar@omsin.com", "--password", "demo123"])?;
    assert!(new_login.status.success());
    assert!(stdout_of(&new_login)?.contains("Welcome back, Omar Sima"));

    Ok(())
}

#[test]
fn test_cli_in_memory_dashboard_uses_fresh_demo_data() -> Result<()> {
    let binary_path = env!("CARGO_BIN_EXE_omsin-ledger");

    let output = Command::new(binary_path)
        .arg("--in-memory")
        .arg("dashboard")
        .args(DEMO_LOGIN)
        .output()?;

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let balance_line = stdout.lines()
        .find(|line| line.starts_with("Balance:"))
        .ok_or_else(|| anyhow!("Balance line missing from dashboard"))?;

    assert_eq!(balance_line, "Balance: $15,750.50");
    assert!(stdout.contains("No recent transactions"));

    Ok(())
}
