mod ledger_store;
mod seed;
mod session;
#[cfg(test)]
mod tests;

pub use ledger_store::LedgerStore;
pub use seed::demo_accounts;
pub use session::{SessionId, SessionRegistry};
