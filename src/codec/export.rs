use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    transaction::{Transaction, TransactionType, amount_format, instant_format},
};

/// One exported record. The field order here is the key order in the file.
#[derive(Serialize)]
struct ExportRecord<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: TransactionType,
    description: &'a str,
    #[serde(with = "amount_format")]
    amount: f64,
    #[serde(with = "instant_format")]
    date: OffsetDateTime,
    no: usize,
}

/// Serialise `transactions` as a pretty-printed JSON array, numbering the
/// records from 1 in list order.
///
/// The output depends only on the list, so exporting an unchanged list twice
/// gives identical text.
///
/// # Errors
/// Returns [Error::JSONSerializationError] if a record cannot be serialised.
pub fn export_transactions(transactions: &[Transaction]) -> Result<String, Error> {
    let records: Vec<ExportRecord> = transactions
        .iter()
        .enumerate()
        .map(|(index, transaction)| ExportRecord {
            id: &transaction.id,
            kind: transaction.kind,
            description: &transaction.description,
            amount: transaction.amount,
            date: transaction.date,
            no: index + 1,
        })
        .collect();

    serde_json::to_string_pretty(&records)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))
}
