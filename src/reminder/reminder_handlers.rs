use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, Result},
    state::AppState,
};
use super::{
    reminder_dto::{CreateReminderRequest, CreateReminderResponse},
    reminder_models::Reminder,
};

/// Create a reminder
#[utoipa::path(
    post,
    path = "/api/create-reminder",
    request_body = CreateReminderRequest,
    responses(
        (status = 200, description = "Reminder stored", body = CreateReminderResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 500, description = "Storage failure")
    ),
    tag = "reminders"
)]
pub async fn create_reminder(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateReminderRequest>, JsonRejection>,
) -> Result<Json<CreateReminderResponse>> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("Rejected reminder body: {}", rejection.body_text());
        AppError::BadRequest("Invalid request body".to_string())
    })?;

    let reminder = state.reminder_service.create_reminder(&payload).await?;

    Ok(Json(reminder.into()))
}

/// Get a stored reminder by ID
#[utoipa::path(
    get,
    path = "/api/reminders/{id}",
    params(
        ("id" = String, Path, description = "Reminder ID")
    ),
    responses(
        (status = 200, description = "Reminder found", body = Reminder),
        (status = 404, description = "Reminder not found")
    ),
    tag = "reminders"
)]
pub async fn get_reminder(
    State(state): State<AppState>,
    Path(reminder_id): Path<String>,
) -> Result<Json<Reminder>> {
    let reminder = state.reminder_service.get_reminder(&reminder_id).await?;
    Ok(Json(reminder))
}

// CORS preflight without the CORS request headers still gets an empty 200.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
