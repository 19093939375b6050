use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockroom_core::LocationId;

use crate::app::{ApiState, dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route("/by-name/:name", get(get_location_by_name))
        .route("/:id", get(get_location))
}

pub async fn create_location(
    Extension(state): Extension<ApiState>,
    body: Result<Json<dto::CreateLocationRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    match state
        .call(
            "create_location",
            state.services.locations.create_location(&body.name),
        )
        .await
    {
        Ok(location) => (StatusCode::CREATED, Json(location)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_locations(Extension(state): Extension<ApiState>) -> axum::response::Response {
    match state
        .call("list_locations", state.services.locations.list_locations())
        .await
    {
        Ok(locations) => Json(locations).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn get_location(
    Extension(state): Extension<ApiState>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: LocationId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.call("get_location", state.services.locations.get_by_id(id)).await {
        Ok(location) => Json(location).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn get_location_by_name(
    Extension(state): Extension<ApiState>,
    Path(name): Path<String>,
) -> axum::response::Response {
    match state
        .call(
            "get_location_by_name",
            state.services.locations.get_by_name(&name),
        )
        .await
    {
        Ok(location) => Json(location).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
