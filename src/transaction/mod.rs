//! The transaction record, its durable store and the views derived from it.

mod form;
mod record;
mod store;
mod summary;

pub(crate) use record::{
    amount_format, format_instant, generate_id, instant_format, is_storable, truncate_to_millis,
};
pub use record::{
    EXPENSE_TAG, INCOME_TAG, Transaction, TransactionType, parse_instant, sanitize,
    validate_record,
};
pub use form::{AmountInput, EditTransaction, NewTransaction};
pub use store::{DurableSlot, STORAGE_KEY, SqliteSlot, TransactionStore};
pub use summary::{
    DashboardSummary, Totals, aggregate, dashboard_summary,
    filter_by_date_range, recent, sort_by_date,
};
