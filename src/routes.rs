use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    reminder::{self, CreateReminderRequest, CreateReminderResponse, Reminder},
    state::AppState,
    sweep::{self, SweepResponse},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        reminder::reminder_handlers::create_reminder,
        reminder::reminder_handlers::get_reminder,
        sweep::sweep_handlers::check_reminders,
    ),
    components(
        schemas(
            CreateReminderRequest,
            CreateReminderResponse,
            Reminder,
            SweepResponse,
        )
    ),
    tags(
        (name = "reminders", description = "Reminder creation and delivery")
    )
)]
struct ApiDoc;

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "storage": state.store.kind().to_string(),
        "emailConfigured": state.sweeper.is_some(),
        "sweepSchedule": state.config.sweep_schedule,
    }))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let create = post(reminder::create_reminder)
        .options(reminder::preflight)
        .fallback(reminder::method_not_allowed);

    let api_routes = Router::new()
        .route("/create-reminder", create.clone())
        .route("/reminders", create)
        .route("/reminders/:id", get(reminder::get_reminder))
        .route(
            "/check-reminders",
            get(sweep::check_reminders)
                .post(sweep::check_reminders)
                .fallback(reminder::method_not_allowed),
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
