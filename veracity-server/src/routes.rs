use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use veracity_common::{Evaluation, VeracityError};
use veracity_eval::Evaluator;

const INDEX_HTML: &str = include_str!("../static/index.html");
const SCRIPT_JS: &str = include_str!("../static/script.js");

const BAD_BODY_MESSAGE: &str = "Please provide an input statement.";

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub input: String,
}

/// Error body returned by the API: `{ "error": "..." }`.
#[derive(Debug)]
pub enum ApiError {
    Evaluation(VeracityError),
    BadRequest(String),
}

impl From<VeracityError> for ApiError {
    fn from(e: VeracityError) -> Self {
        Self::Evaluation(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Evaluation(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.user_message()),
            ApiError::Evaluation(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.user_message()),
            ApiError::BadRequest(detail) => {
                tracing::debug!(%detail, "bad request body");
                (StatusCode::BAD_REQUEST, BAD_BODY_MESSAGE)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(evaluator: Evaluator) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/script.js", get(script))
        .route("/health", get(health))
        .route("/api/evaluateInput", post(evaluate_input))
        .with_state(evaluator)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        SCRIPT_JS,
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn evaluate_input(
    State(evaluator): State<Evaluator>,
    body: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<Evaluation>, ApiError> {
    let request_id = uuid::Uuid::new_v4().simple().to_string();
    let span = tracing::info_span!("evaluate", req_id = %request_id);
    run_evaluation(evaluator, body).instrument(span).await
}

async fn run_evaluation(
    evaluator: Evaluator,
    body: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<Evaluation>, ApiError> {
    let Json(req) = body.inspect_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "rejected request body");
    })?;
    tracing::info!(input_chars = req.input.chars().count(), "evaluation requested");

    match evaluator.evaluate(&req.input).await {
        Ok(evaluation) => Ok(Json(evaluation)),
        Err(e) => {
            if e.is_client_error() {
                tracing::warn!(error = %e, "evaluation rejected");
            } else {
                tracing::error!(error = %e, "evaluation failed");
            }
            Err(e.into())
        }
    }
}
