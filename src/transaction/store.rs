//! The durable slot and the transaction store that guards it.
//!
//! The whole transaction list lives under a single key as a JSON array. The
//! store validates records on the way in and on the way out with the same
//! predicate, and never fails its caller: a missing backend turns every
//! operation into a no-op.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    Error,
    backup::BackupWriter,
    transaction::record::{Transaction, sanitize},
};

/// The key of the durable slot holding the transaction list.
pub const STORAGE_KEY: &str = "keuangan_transactions";

/// A named key-value slot that outlives the process.
///
/// A single read or write is atomic; nothing stronger is promised.
pub trait DurableSlot: Send + Sync {
    /// Read the text stored under `key`, `None` if the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>, Error>;

    /// Replace the text stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), Error>;
}

/// Create the key-value table backing [SqliteSlot].
pub fn create_slot_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS key_value (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// A durable slot in a SQLite key-value table.
#[derive(Debug, Clone)]
pub struct SqliteSlot {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSlot {
    /// Wrap `connection`, creating the key-value table if needed.
    ///
    /// # Errors
    /// Returns an error if the table cannot be created.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Result<Self, Error> {
        {
            let guard = connection.lock().map_err(|_| Error::DatabaseLockError)?;
            create_slot_table(&guard)?;
        }

        Ok(Self { connection })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

impl DurableSlot for SqliteSlot {
    fn read(&self, key: &str) -> Result<Option<String>, Error> {
        let connection = self.lock()?;

        connection
            .query_row(
                "SELECT value FROM key_value WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Error::from)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Error> {
        let connection = self.lock()?;

        connection.execute(
            "INSERT INTO key_value (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;

        Ok(())
    }
}

/// Owns the authoritative transaction list at the persistence boundary.
///
/// Callers hold their own copies obtained from [TransactionStore::load] and
/// hand back complete lists to [TransactionStore::save]. The last save wins.
#[derive(Clone)]
pub struct TransactionStore {
    slot: Option<Arc<dyn DurableSlot>>,
    backup: Option<Arc<BackupWriter>>,
}

impl std::fmt::Debug for TransactionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionStore")
            .field("available", &self.is_available())
            .field("backup", &self.backup)
            .finish()
    }
}

impl TransactionStore {
    /// Create a store over `slot` without continuous backups.
    pub fn new(slot: impl DurableSlot + 'static) -> Self {
        Self {
            slot: Some(Arc::new(slot)),
            backup: None,
        }
    }

    /// Create a store with no reachable backend.
    ///
    /// Loads return an empty list and saves return `false`.
    pub fn unavailable() -> Self {
        Self {
            slot: None,
            backup: None,
        }
    }

    /// Write a backup file after every successful save.
    pub fn with_backup(mut self, backup: BackupWriter) -> Self {
        self.backup = Some(Arc::new(backup));
        self
    }

    /// Whether a durable backend is reachable.
    pub fn is_available(&self) -> bool {
        self.slot.is_some()
    }

    /// Read the transaction list.
    ///
    /// Returns an empty list if the backend is unavailable, the slot is empty
    /// or its contents are not a JSON array. Records failing validation are
    /// left out. This never fails; problems are logged.
    pub fn load(&self) -> Vec<Transaction> {
        let Some(slot) = &self.slot else {
            tracing::debug!("No storage backend available, loading an empty list");
            return Vec::new();
        };

        let text = match slot.read(STORAGE_KEY) {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => return Vec::new(),
            Err(error) => {
                tracing::error!("Error fetching transactions: {error}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(records)) => sanitize(&records),
            Ok(_) => {
                tracing::error!("Stored transactions are not a JSON array, ignoring them");
                Vec::new()
            }
            Err(error) => {
                tracing::error!("Failed to parse transactions: {error}");
                Vec::new()
            }
        }
    }

    /// Validate and persist `transactions`.
    ///
    /// See [TransactionStore::save_records].
    pub fn save(&self, transactions: &[Transaction]) -> bool {
        let records: Vec<Value> = transactions
            .iter()
            .filter_map(|transaction| {
                serde_json::to_value(transaction)
                    .inspect_err(|error| {
                        tracing::warn!(
                            "Could not serialize transaction {}: {error}",
                            transaction.id
                        )
                    })
                    .ok()
            })
            .collect();

        self.save_records(&records)
    }

    /// Validate and persist raw records, then write a backup if configured.
    ///
    /// Records failing validation are dropped silently; the save still
    /// succeeds. Returns `false` only when the backend is unavailable or the
    /// write fails. A failed backup is logged and does not change the result.
    pub fn save_records(&self, records: &[Value]) -> bool {
        let Some(slot) = &self.slot else {
            tracing::warn!("No storage backend available, transactions were not saved");
            return false;
        };

        let transactions = sanitize(records);

        let text = match serde_json::to_string(&transactions) {
            Ok(text) => text,
            Err(error) => {
                tracing::error!("Error saving transactions: {error}");
                return false;
            }
        };

        if let Err(error) = slot.write(STORAGE_KEY, &text) {
            tracing::error!("Error saving transactions: {error}");
            return false;
        }

        if let Some(backup) = &self.backup {
            if let Err(error) = backup.write(&transactions, OffsetDateTime::now_utc()) {
                tracing::error!("Error writing transaction backup: {error}");
            }
        }

        true
    }
}
