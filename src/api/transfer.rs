//! Downloading the transaction list as a file and restoring it from one.

use axum::{
    Json,
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    Error,
    api::StoreState,
    backup::export_file_name,
    codec::{export_transactions, import_transactions},
};

/// Download the transaction list as pretty-printed JSON, numbered from 1.
///
/// The file is named after the current local time.
pub async fn export_transactions_endpoint(
    State(state): State<StoreState>,
) -> Result<Response, Error> {
    let local_offset = state.local_offset()?;
    let transactions = state.store.load();

    let contents = export_transactions(&transactions)?;
    let file_name = export_file_name(OffsetDateTime::now_utc().to_offset(local_offset))?;

    tracing::info!("Exporting {} transaction(s) as {file_name}", transactions.len());

    Ok((
        [
            (CONTENT_TYPE, "application/json".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        contents,
    )
        .into_response())
}

/// Overwrite the transaction list with an uploaded JSON array.
///
/// Malformed records are repaired rather than dropped. The response holds
/// the imported list and every repair that was made. Text that is not a
/// JSON array is rejected and the stored list is left untouched.
pub async fn import_transactions_endpoint(
    State(state): State<StoreState>,
    body: String,
) -> Result<Response, Error> {
    let outcome = import_transactions(&body, OffsetDateTime::now_utc(), state.local_offset()?)?;

    state.persist(&outcome.transactions)?;

    Ok(Json(outcome).into_response())
}

#[cfg(test)]
mod transfer_endpoint_tests {
    use axum::{
        Router,
        http::StatusCode,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        api::{StoreState, test_support::store_state},
        endpoints,
        transaction::{Transaction, TransactionType},
    };

    use super::{export_transactions_endpoint, import_transactions_endpoint};

    fn get_test_server(state: StoreState) -> TestServer {
        let app = Router::new()
            .route(endpoints::EXPORT, get(export_transactions_endpoint))
            .route(endpoints::IMPORT, post(import_transactions_endpoint))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    fn sample() -> Vec<Transaction> {
        vec![Transaction {
            id: "a".to_owned(),
            kind: TransactionType::Income,
            description: "Gaji".to_owned(),
            amount: 5_000_000.0,
            date: datetime!(2024-01-05 00:00 UTC),
        }]
    }

    #[tokio::test]
    async fn export_is_numbered_attachment() {
        let server = get_test_server(store_state(&sample()));

        let response = server.get(endpoints::EXPORT).await;

        response.assert_status_ok();
        let disposition = response.header("content-disposition");
        let disposition = disposition.to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\""), "got {disposition}");
        assert!(disposition.ends_with(".json\""), "got {disposition}");

        let body: Value = response.json();
        assert_eq!(
            body,
            json!([{
                "id": "a",
                "type": "Pemasukan",
                "description": "Gaji",
                "amount": 5000000,
                "date": "2024-01-05T00:00:00.000Z",
                "no": 1
            }])
        );
    }

    #[tokio::test]
    async fn import_overwrites_and_reports_repairs() {
        let state = store_state(&sample());
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::IMPORT)
            .text(r#"[{"description":"Test","amount":"50","type":"Pengeluaran"}]"#)
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let kinds: Vec<&str> = body["notes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|note| note["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, ["id_generated", "amount_converted", "date_defaulted"]);

        let stored = state.store.load();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].description, "Test");
        assert_eq!(stored[0].amount, 50.0);
        assert_eq!(stored[0].kind, TransactionType::Expense);
    }

    #[tokio::test]
    async fn import_rejects_non_array_and_keeps_list() {
        let state = store_state(&sample());
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::IMPORT)
            .text(r#"{"a":1}"#)
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(state.store.load(), sample());
    }

    #[tokio::test]
    async fn import_empty_array_clears_list() {
        let state = store_state(&sample());
        let server = get_test_server(state.clone());

        server
            .post(endpoints::IMPORT)
            .text("[]")
            .await
            .assert_status_ok();

        assert!(state.store.load().is_empty());
    }
}
