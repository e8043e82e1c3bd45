//! JSON handlers connecting the HTTP API to the transaction store.
//!
//! Every handler works on a fresh snapshot: it loads the list, changes its
//! copy and saves the whole list back. Concurrent writers race and the last
//! save wins.

mod summary;
mod transactions;
mod transfer;

use std::sync::Arc;

use axum::extract::FromRef;
use time::UtcOffset;

use crate::{
    AppState, Error,
    timezone::get_local_offset,
    transaction::{Transaction, TransactionStore},
};

pub use summary::get_summary;
pub use transactions::{
    create_transaction, delete_transaction, edit_transaction, get_transactions,
    replace_transactions,
};
pub use transfer::{export_transactions_endpoint, import_transactions_endpoint};

/// The state needed by the transaction handlers.
#[derive(Debug, Clone)]
pub struct StoreState {
    /// The transaction store.
    pub store: Arc<TransactionStore>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
}

impl FromRef<AppState> for StoreState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl StoreState {
    /// The current offset of the local timezone.
    fn local_offset(&self) -> Result<UtcOffset, Error> {
        get_local_offset(&self.local_timezone)
            .ok_or_else(|| Error::InvalidTimezoneError(self.local_timezone.clone()))
    }

    /// Save `transactions`, turning a failed save into an error response.
    fn persist(&self, transactions: &[Transaction]) -> Result<(), Error> {
        if !self.store.is_available() {
            return Err(Error::StorageUnavailable);
        }

        if self.store.save(transactions) {
            Ok(())
        } else {
            Err(Error::SaveFailed)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        api::StoreState,
        transaction::{SqliteSlot, Transaction, TransactionStore},
    };

    /// A store over an in-memory database holding `transactions`.
    pub(crate) fn store_state(transactions: &[Transaction]) -> StoreState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let slot = SqliteSlot::new(Arc::new(Mutex::new(connection)))
            .expect("Could not create key-value table");
        let store = TransactionStore::new(slot);
        assert!(store.save(transactions), "Could not save test transactions");

        StoreState {
            store: Arc::new(store),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }
}
