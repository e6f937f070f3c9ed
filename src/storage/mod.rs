mod errors;
mod file_storage;
mod memory_storage;

pub use errors::StorageError;
pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;

/// Names of the persisted records. Each record holds one JSON-encoded array.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RecordKey {
    Accounts,
    Transactions
}

impl RecordKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::Accounts => "accounts",
            RecordKey::Transactions => "transactions"
        }
    }
}

/// Persistence backend injected into the ledger store.
pub trait Storage: Send + Sync + 'static {
    /// Returns the raw JSON for `key`, or `None` when the record has never been written.
    fn load(&self, key: RecordKey) -> Result<Option<String>, StorageError>;

    /// Writes every record in `batch` as one unit: afterwards either all of them are
    /// visible or none of them are.
    fn commit(&self, batch: &[(RecordKey, String)]) -> Result<(), StorageError>;
}
