//! Application router configuration.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState, Error,
    api::{
        create_transaction, delete_transaction, edit_transaction, export_transactions_endpoint,
        get_summary, get_transactions, import_transactions_endpoint, replace_transactions,
    },
    auth::{auth_guard, get_auth_status, get_log_in_page, get_log_out, post_log_in},
    endpoints,
    print::{get_receipt_page, get_warranty_page},
};

/// Return a router with all the app's routes.
///
/// Every route except the public ones is behind [auth_guard].
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(
            endpoints::AUTH_API,
            get(get_auth_status).post(post_log_in),
        )
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::SUMMARY_API, get(get_summary))
        .route(
            endpoints::TRANSACTIONS_API,
            get(get_transactions)
                .post(create_transaction)
                .put(replace_transactions),
        )
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction).delete(delete_transaction),
        )
        .route(endpoints::EXPORT, get(export_transactions_endpoint))
        .route(endpoints::IMPORT, post(import_transactions_endpoint))
        .route(endpoints::RECEIPT_VIEW, get(get_receipt_page))
        .route(endpoints::WARRANTY_VIEW, get(get_warranty_page))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
        .with_state(state)
}

/// The root path '/' redirects to the dashboard summary.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::SUMMARY_API)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
