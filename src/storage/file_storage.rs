use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::storage::{RecordKey, Storage, StorageError};

type Document = BTreeMap<String, Value>;

/// Keeps every record in one JSON document on disk.
///
/// Commits write the complete document to a temporary file next to the target and rename
/// it into place, so a crash mid-write leaves the previous document intact.
pub struct FileStorage {
    path: PathBuf
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Document::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(error) => Err(error.into())
        }
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new(".")
        }
    }
}

impl Storage for FileStorage {
    fn load(&self, key: RecordKey) -> Result<Option<String>, StorageError> {
        let document = self.read_document()?;

        Ok(document.get(key.as_str()).map(Value::to_string))
    }

    fn commit(&self, batch: &[(RecordKey, String)]) -> Result<(), StorageError> {
        let mut document = self.read_document()?;

        for (key, value) in batch {
            document.insert(key.as_str().to_string(), serde_json::from_str(value)?);
        }

        let directory = self.directory();
        fs::create_dir_all(directory)?;

        let mut file = NamedTempFile::new_in(directory)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        file.as_file().sync_all()?;

        file.persist(&self.path).map_err(|error| StorageError::Persist {
            path: self.path.clone(),
            source: error.error
        })?;

        debug!("Committed {} record(s) to {}", batch.len(), self.path.display());

        Ok(())
    }
}
