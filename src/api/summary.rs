use axum::{Json, extract::State};
use time::OffsetDateTime;

use crate::{
    Error,
    api::StoreState,
    transaction::{DashboardSummary, dashboard_summary},
};

/// The dashboard figures: the last thirty days and today's totals.
pub async fn get_summary(
    State(state): State<StoreState>,
) -> Result<Json<DashboardSummary>, Error> {
    let local_offset = state.local_offset()?;
    let transactions = state.store.load();

    Ok(Json(dashboard_summary(
        &transactions,
        OffsetDateTime::now_utc(),
        local_offset,
    )))
}
