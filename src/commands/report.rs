use std::io::Write;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Account, Totals, Transaction, TransferReceipt};
use crate::types::format_currency;

#[derive(Serialize)]
struct AccountRow<'a> {
    account_number: &'a str,
    name: &'a str,
    account_type: &'a str,
    balance: Decimal
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    id: &'a str,
    date: String,
    #[serde(rename = "type")]
    transaction_type: String,
    amount: String,
    description: &'a str,
    balance: Decimal
}

pub fn write_accounts<W: Write>(output: W, accounts: &[Account]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);

    for account in accounts {
        writer.serialize(AccountRow {
            account_number: &account.account_number,
            name: &account.name,
            account_type: &account.account_type,
            balance: account.balance
        })?;
    }

    writer.flush()?;

    Ok(())
}

pub fn write_history<W: Write>(output: W, transactions: &[Transaction]) -> Result<()> {
    //NOTE: Headers are written by hand so that an empty history still produces a header line
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(output);
    writer.write_record(["id", "date", "type", "amount", "description", "balance"])?;

    for transaction in transactions {
        writer.serialize(HistoryRow {
            id: &transaction.id,
            date: transaction.date.to_rfc3339(),
            transaction_type: transaction.transaction_type.to_string(),
            amount: transaction.amount.to_string(),
            description: &transaction.description,
            balance: transaction.balance
        })?;
    }

    writer.flush()?;

    Ok(())
}

pub fn write_dashboard<W: Write>(output: &mut W, account: &Account, recent: &[Transaction]) -> Result<()> {
    writeln!(output, "Welcome back, {}", account.name)?;
    writeln!(output, "Account: {} ({})", account.account_number, account.account_type)?;
    writeln!(output, "Balance: {}", format_currency(account.balance))?;
    writeln!(output)?;

    if recent.is_empty() {
        writeln!(output, "No recent transactions")?;
        return Ok(());
    }

    writeln!(output, "Recent transactions:")?;

    for transaction in recent {
        writeln!(
            output,
            "  {}  {:<6}  {:>12}  {}",
            transaction.date.format("%Y-%m-%d %H:%M"),
            transaction.transaction_type,
            format_currency(transaction.signed_amount()),
            transaction.description
        )?;
    }

    Ok(())
}

pub fn write_overview<W: Write>(output: &mut W, account: &Account, totals: &Totals, monthly_change: Decimal) -> Result<()> {
    writeln!(output, "Account holder: {}", account.name)?;
    writeln!(output, "Account number: {}", account.account_number)?;
    writeln!(output, "Account type:   {}", account.account_type)?;
    writeln!(output, "Balance:        {}", format_currency(account.balance))?;
    writeln!(output, "Total credits:  {}", format_currency(totals.credits))?;
    writeln!(output, "Total debits:   {}", format_currency(totals.debits))?;
    writeln!(output, "Net flow:       {}", format_currency(totals.net()))?;
    writeln!(output, "Last month:     {}", format_currency(monthly_change))?;

    Ok(())
}

pub fn write_receipt<W: Write>(output: &mut W, receipt: &TransferReceipt) -> Result<()> {
    writeln!(
        output,
        "Successfully transferred {} to {}",
        format_currency(receipt.amount().value()),
        receipt.recipient_name
    )?;
    writeln!(output, "Reference: {}", receipt.debit.id)?;
    writeln!(output, "New balance: {}", format_currency(receipt.sender_balance()))?;

    Ok(())
}

pub fn write_profile<W: Write>(output: &mut W, account: &Account) -> Result<()> {
    writeln!(output, "Profile updated successfully!")?;
    writeln!(output, "Name:    {}", account.name)?;
    writeln!(output, "Email:   {}", account.email)?;
    writeln!(output, "Phone:   {}", account.phone.as_deref().unwrap_or("-"))?;
    writeln!(output, "Address: {}", account.address.as_deref().unwrap_or("-"))?;

    Ok(())
}
