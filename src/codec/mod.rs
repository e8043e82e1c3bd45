//! Converts the transaction list to and from the portable JSON text users
//! download, hand-edit and restore.
//!
//! Export is exact: records are written in a fixed field order with a 1-based
//! `no` for readability. Import is lenient: every element of the array is
//! coerced into a transaction, and each repair is reported back.

mod export;
mod import;

pub use export::export_transactions;
pub use import::{
    CoercionNote, DecodedRecord, ImportOutcome, RecordNote, decode_lenient, import_transactions,
};
