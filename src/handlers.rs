use crate::errors::AppError;
use crate::intake::{profile_outcome, IntakeService, ProfileRejection};
use crate::models::{
    CommercialProfileInput, LeadSubmission, NavigationRequest, OutcomeKind, SubmitOutcome, View,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lead and profile submission logic, wired to the configured gateways.
    pub intake: IntakeService,
}

impl AppState {
    pub fn new(intake: IntakeService) -> Self {
        Self { intake }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(submit_lead, submit_profile),
    components(schemas(
        LeadSubmission,
        CommercialProfileInput,
        SubmitOutcome,
        OutcomeKind,
        NavigationRequest,
        View
    )),
    tags((name = "intake", description = "Lead and sales rep intake"))
)]
pub struct ApiDoc;

/// Routes backed by the intake service. Rate limiting is layered on in `main`.
pub fn intake_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/leads", post(submit_lead))
        .route("/api/v1/comerciais", post(submit_profile))
}

/// Health check endpoint.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "callcoach-intake",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/leads
///
/// Landing page lead form. Answers as soon as the fields are validated;
/// research and persistence happen in the background and their result is
/// never reported back.
///
/// # Returns
///
/// * `202 Accepted` with a success outcome that clears itself after 3s.
/// * `400 Bad Request` with an error outcome when a field is empty.
#[utoipa::path(
    post,
    path = "/api/v1/leads",
    tag = "intake",
    request_body = LeadSubmission,
    responses(
        (status = 202, description = "Lead accepted", body = SubmitOutcome),
        (status = 400, description = "Missing field", body = SubmitOutcome)
    )
)]
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitOutcome>), AppError> {
    let Json(submission) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    tracing::info!("POST /leads - company: {}", submission.company_name);

    let outcome = state.intake.submit_lead(submission);
    let status = if outcome.is_success() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::BAD_REQUEST
    };

    Ok((status, Json(outcome)))
}

/// POST /api/v1/comerciais
///
/// Sales rep onboarding form. Waits for the insert and reports its result.
///
/// # Returns
///
/// * `201 Created` with a success outcome and a delayed redirect to the dashboard.
/// * `400 Bad Request` when name or email is missing.
/// * `409 Conflict` when the email is already registered.
/// * `502 Bad Gateway` for any other store failure.
#[utoipa::path(
    post,
    path = "/api/v1/comerciais",
    tag = "intake",
    request_body = CommercialProfileInput,
    responses(
        (status = 201, description = "Profile created", body = SubmitOutcome),
        (status = 400, description = "Name and email required", body = SubmitOutcome),
        (status = 409, description = "Email already registered", body = SubmitOutcome),
        (status = 502, description = "Store failure", body = SubmitOutcome)
    )
)]
pub async fn submit_profile(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CommercialProfileInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitOutcome>), AppError> {
    let Json(input) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    tracing::info!("POST /comerciais - email: {}", input.email);

    let result = state.intake.create_profile(input).await;
    let status = match result {
        Ok(()) => StatusCode::CREATED,
        Err(ProfileRejection::MissingFields) => StatusCode::BAD_REQUEST,
        Err(ProfileRejection::EmailTaken) => StatusCode::CONFLICT,
        Err(ProfileRejection::Failed) => StatusCode::BAD_GATEWAY,
    };

    Ok((status, Json(profile_outcome(result))))
}
