mod report;

use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::models::{Account, ProfileUpdate, SortOrder, TransactionQuery, TransactionType, TransferRequest};
use crate::storage::Storage;
use crate::store::{LedgerStore, SessionId};

#[derive(Parser)]
#[command(name = "omsin-ledger", about = "Demo personal-banking ledger: accounts, history, profile and transfers.")]
pub struct Cli {
    /// JSON document holding accounts and transactions (overrides the config file)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,
    /// Run against a fresh in-memory ledger seeded with the demo accounts
    #[arg(long, global = true, conflicts_with = "data")]
    pub in_memory: bool,
    /// Path to a JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command
}

#[derive(Args)]
pub struct Credentials {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String
}

#[derive(Subcommand)]
pub enum Command {
    /// List every account as CSV.
    Accounts,
    /// List the accounts you can send money to, as CSV.
    Recipients {
        #[command(flatten)]
        credentials: Credentials
    },
    /// Show the balance and most recent transactions.
    Dashboard {
        #[command(flatten)]
        credentials: Credentials
    },
    /// Show account details, totals and the change over the last month.
    Overview {
        #[command(flatten)]
        credentials: Credentials
    },
    /// Print the transaction history as CSV.
    History {
        #[command(flatten)]
        credentials: Credentials,
        /// Only show credits or debits
        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,
        /// Case-insensitive text to look for in descriptions
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = OrderArg::Newest)]
        order: OrderArg,
        #[arg(long)]
        limit: Option<usize>
    },
    /// Send money to another account.
    Transfer {
        #[command(flatten)]
        credentials: Credentials,
        /// Recipient account number
        #[arg(long)]
        to: String,
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        #[arg(long)]
        description: String
    },
    /// Update name, email and contact details.
    Profile {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        name: String,
        #[arg(long = "new-email")]
        new_email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>
    },
    /// Restore the demo accounts and clear all transactions.
    Reset
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Credit,
    Debit
}

impl From<KindArg> for TransactionType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Credit => TransactionType::Credit,
            KindArg::Debit => TransactionType::Debit
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Newest,
    Oldest
}

impl From<OrderArg> for SortOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Newest => SortOrder::NewestFirst,
            OrderArg::Oldest => SortOrder::OldestFirst
        }
    }
}

/// Executes one command against `store`, writing results to stdout.
pub async fn run<S: Storage>(store: &LedgerStore<S>, command: Command) -> Result<()> {
    let mut output = BufWriter::new(stdout());

    match command {
        Command::Accounts => {
            report::write_accounts(&mut output, &store.accounts().await)?;
        },
        Command::Recipients { credentials } => {
            let (session, account) = sign_in(store, &credentials).await?;

            report::write_accounts(&mut output, &store.recipients(&account.id).await?)?;
            store.logout(&session).await;
        },
        Command::Dashboard { credentials } => {
            let (session, account) = sign_in(store, &credentials).await?;
            let recent = store.recent_transactions(&account.id).await?;

            report::write_dashboard(&mut output, &account, &recent)?;
            store.logout(&session).await;
        },
        Command::Overview { credentials } => {
            let (session, account) = sign_in(store, &credentials).await?;
            let totals = store.totals(&account.id).await?;
            let monthly_change = store.monthly_change(&account.id, Utc::now()).await?;

            report::write_overview(&mut output, &account, &totals, monthly_change)?;
            store.logout(&session).await;
        },
        Command::History { credentials, kind, search, order, limit } => {
            let (session, account) = sign_in(store, &credentials).await?;
            let query = TransactionQuery {
                transaction_type: kind.map(TransactionType::from),
                search,
                order: order.into(),
                limit
            };

            report::write_history(&mut output, &store.transactions(&account.id, &query).await?)?;
            store.logout(&session).await;
        },
        Command::Transfer { credentials, to, amount, description } => {
            let (session, account) = sign_in(store, &credentials).await?;
            let request = TransferRequest {
                recipient: to,
                amount,
                description
            };

            let receipt = store.transfer(&account.id, &request).await?;

            report::write_receipt(&mut output, &receipt)?;
            store.logout(&session).await;
        },
        Command::Profile { credentials, name, new_email, phone, address } => {
            let (session, account) = sign_in(store, &credentials).await?;
            let update = ProfileUpdate {
                name,
                email: new_email,
                phone,
                address
            };

            let updated = store.update_profile(&account.id, &update).await?;

            report::write_profile(&mut output, &updated)?;
            store.logout(&session).await;
        },
        Command::Reset => {
            store.reset().await?;
            writeln!(output, "Demo data restored")?;
        }
    }

    output.flush()?;

    Ok(())
}

async fn sign_in<S: Storage>(store: &LedgerStore<S>, credentials: &Credentials) -> Result<(SessionId, Account)> {
    let session = store.authenticate(&credentials.email, &credentials.password).await?;
    let account = store.session_account(&session).await?;

    Ok((session, account))
}
