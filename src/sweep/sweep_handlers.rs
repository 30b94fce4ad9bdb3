use axum::{extract::State, Json};

use crate::{
    error::{AppError, Result},
    state::AppState,
};
use super::sweep_dto::SweepResponse;

/// Run a reminder sweep now
#[utoipa::path(
    post,
    path = "/api/check-reminders",
    responses(
        (status = 200, description = "Sweep finished", body = SweepResponse),
        (status = 500, description = "Email provider unconfigured or store unavailable")
    ),
    tag = "reminders"
)]
pub async fn check_reminders(State(state): State<AppState>) -> Result<Json<SweepResponse>> {
    let sweeper = state
        .sweeper
        .as_ref()
        .ok_or_else(|| AppError::Configuration("Email provider is not configured".to_string()))?;

    let report = sweeper.sweep().await?;

    Ok(Json(report.into()))
}
