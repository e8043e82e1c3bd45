//! Listing, creating, editing, deleting and bulk-replacing transactions.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    api::StoreState,
    endpoints::{self, format_endpoint},
    transaction::{
        EditTransaction, NewTransaction, Totals, Transaction, aggregate, filter_by_date_range,
        sort_by_date, validate_record,
    },
};

time::serde::format_description!(query_date, Date, "[year]-[month]-[day]");

/// Which transactions come first in a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Latest date first.
    #[default]
    Newest,
    /// Earliest date first.
    Oldest,
}

/// The query string for listing transactions, e.g.
/// `?start=2024-01-01&end=2024-01-31&order=oldest`.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    /// The first local day to include.
    #[serde(default, with = "query_date::option")]
    pub start: Option<Date>,
    /// The last local day to include.
    #[serde(default, with = "query_date::option")]
    pub end: Option<Date>,
    /// The sort order, newest first by default.
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Serialize)]
struct TransactionListing {
    transactions: Vec<Transaction>,
    totals: Totals,
}

/// List the transactions within the optional date range, sorted by date,
/// together with their totals.
pub async fn get_transactions(
    State(state): State<StoreState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Response, Error> {
    let local_offset = state.local_offset()?;
    let transactions = state.store.load();

    let filtered = filter_by_date_range(&transactions, query.start, query.end, local_offset);
    let sorted = sort_by_date(&filtered, query.order == SortOrder::Newest);
    let totals = aggregate(&sorted);

    Ok(Json(TransactionListing {
        transactions: sorted,
        totals,
    })
    .into_response())
}

/// A route handler for creating a new transaction from the form.
///
/// The transaction is appended to the list. Responds with 201 and the new
/// transaction.
pub async fn create_transaction(
    State(state): State<StoreState>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(new_transaction) = payload.map_err(|rejection| {
        tracing::debug!("Rejected new transaction: {rejection}");
        Error::InvalidTransaction("Enter a description and an amount.".to_owned())
    })?;

    let transaction =
        new_transaction.into_transaction(OffsetDateTime::now_utc(), state.local_offset()?)?;

    let mut transactions = state.store.load();
    transactions.push(transaction.clone());
    state.persist(&transactions)?;

    let location = format_endpoint(endpoints::TRANSACTION, &transaction.id);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(transaction)).into_response())
}

/// A route handler for replacing a transaction with an edited copy.
///
/// The transaction keeps its id and its position in the list.
pub async fn edit_transaction(
    State(state): State<StoreState>,
    Path(transaction_id): Path<String>,
    payload: Result<Json<EditTransaction>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(edit) = payload.map_err(|rejection| {
        tracing::debug!("Rejected transaction edit: {rejection}");
        Error::InvalidRequest
    })?;

    let mut transactions = state.store.load();
    let Some(position) = transactions
        .iter()
        .position(|transaction| transaction.id == transaction_id)
    else {
        return Err(Error::NotFound);
    };

    let updated = edit.replace(&transactions[position], state.local_offset()?)?;
    transactions[position] = updated.clone();
    state.persist(&transactions)?;

    Ok(Json(updated).into_response())
}

/// A route handler for deleting a transaction, responds with 204.
pub async fn delete_transaction(
    State(state): State<StoreState>,
    Path(transaction_id): Path<String>,
) -> Result<Response, Error> {
    let transactions = state.store.load();
    let remaining: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| transaction.id != transaction_id)
        .cloned()
        .collect();

    if remaining.len() == transactions.len() {
        return Err(Error::NotFound);
    }

    state.persist(&remaining)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// A route handler for overwriting the whole list with a raw JSON array.
///
/// Records that fail validation are dropped, not rejected. The response
/// reports how many records were received and how many were kept.
pub async fn replace_transactions(
    State(state): State<StoreState>,
    payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(records) = payload.map_err(|rejection| {
        tracing::debug!("Rejected transaction list: {rejection}");
        Error::InvalidRequest
    })?;

    if !state.store.is_available() {
        return Err(Error::StorageUnavailable);
    }

    let saved = records
        .iter()
        .filter(|record| validate_record(record).is_some())
        .count();

    if !state.store.save_records(&records) {
        return Err(Error::SaveFailed);
    }

    Ok(Json(json!({ "received": records.len(), "saved": saved })).into_response())
}
