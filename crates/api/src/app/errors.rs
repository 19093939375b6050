use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_core::InventoryError;

pub fn status_for(err: &InventoryError) -> StatusCode {
    match err {
        InventoryError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::AlreadyExists(_) | InventoryError::FailedPrecondition(_) => {
            StatusCode::CONFLICT
        }
        InventoryError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        InventoryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn inventory_error_to_response(err: InventoryError) -> axum::response::Response {
    json_error(status_for(&err), err.code(), err.message())
}

/// Malformed JSON bodies are `invalid_argument`, whatever axum's own status.
pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_argument", rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_argument", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
