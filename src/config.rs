//! Command line arguments and environment configuration for the server.

use std::{
    env,
    fmt,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use clap::Parser;
use rusqlite::Connection;

use crate::{
    BackupWriter, Error,
    transaction::{SqliteSlot, TransactionStore},
};

/// The environment variable holding the account user name.
pub const ADMIN_USER_VAR: &str = "ADMIN_USER";
/// The environment variable holding the account password.
pub const ADMIN_PASS_VAR: &str = "ADMIN_PASS";

/// The web server for Keuangan, a personal finance tracker.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// File path to the SQLite database holding the transaction list.
    #[arg(long)]
    pub db_path: PathBuf,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Directory that backups are written to after every save.
    #[arg(long, default_value = "backups")]
    pub backup_dir: PathBuf,

    /// Do not write a backup file after every save.
    #[arg(long)]
    pub no_backup_on_save: bool,

    /// The local timezone as a canonical timezone name.
    #[arg(long, default_value = "Asia/Jakarta")]
    pub timezone: String,

    /// File path for the debug log.
    #[arg(long, default_value = "debug.log")]
    pub log_path: PathBuf,
}

impl Args {
    /// Open the transaction store described by these arguments.
    ///
    /// A database that cannot be opened does not stop the server: the store
    /// is returned unavailable and the failure is logged. An invalid timezone
    /// only disables backups.
    pub fn open_store(&self) -> TransactionStore {
        let slot = Connection::open(&self.db_path)
            .map_err(Error::from)
            .and_then(|connection| SqliteSlot::new(Arc::new(Mutex::new(connection))));

        let store = match slot {
            Ok(slot) => TransactionStore::new(slot),
            Err(error) => {
                tracing::error!(
                    "Could not open the database at {}: {error}. Transactions will not be saved.",
                    self.db_path.display()
                );
                return TransactionStore::unavailable();
            }
        };

        if self.no_backup_on_save {
            tracing::info!("Backups on save are disabled");
            return store;
        }

        match BackupWriter::new(&self.backup_dir, &self.timezone) {
            Ok(writer) => {
                tracing::info!("Writing backups to {}", self.backup_dir.display());
                store.with_backup(writer)
            }
            Err(error) => {
                tracing::error!("Backups on save are disabled: {error}");
                store
            }
        }
    }
}

/// The user name and password of the single account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Build credentials when both values are set and non-empty.
    pub fn from_values(username: Option<String>, password: Option<String>) -> Option<Self> {
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Self { username, password })
            }
            _ => None,
        }
    }

    /// Read the credentials from [ADMIN_USER_VAR] and [ADMIN_PASS_VAR].
    pub fn from_env() -> Option<Self> {
        Self::from_values(env::var(ADMIN_USER_VAR).ok(), env::var(ADMIN_PASS_VAR).ok())
    }

    /// Whether `username` and `password` match exactly.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}
