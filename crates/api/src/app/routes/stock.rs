use axum::{
    Json, Router,
    extract::{
        Extension, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    response::IntoResponse,
    routing::{get, post},
};

use stockroom_core::{LocationId, ProductId};

use crate::app::{ApiState, dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_stock))
        .route("/add", post(add_stock))
        .route("/remove", post(remove_stock))
        .route("/move", post(move_stock))
        .route("/low", get(low_stock_report))
        .route("/movements", get(list_movements))
}

fn parse_pair(
    product_id: &str,
    location_id: &str,
) -> Result<(ProductId, LocationId), axum::response::Response> {
    Ok((dto::parse_id(product_id)?, dto::parse_id(location_id)?))
}

pub async fn add_stock(
    Extension(state): Extension<ApiState>,
    body: Result<Json<dto::StockChangeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    let (product_id, location_id) = match parse_pair(&body.product_id, &body.location_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state
        .call(
            "add_stock",
            state
                .services
                .ledger
                .add_stock(product_id, location_id, body.quantity),
        )
        .await
    {
        Ok(stock) => Json(stock).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn remove_stock(
    Extension(state): Extension<ApiState>,
    body: Result<Json<dto::StockChangeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    let (product_id, location_id) = match parse_pair(&body.product_id, &body.location_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state
        .call(
            "remove_stock",
            state
                .services
                .ledger
                .remove_stock(product_id, location_id, body.quantity),
        )
        .await
    {
        Ok(stock) => Json(stock).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn move_stock(
    Extension(state): Extension<ApiState>,
    body: Result<Json<dto::MoveStockRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    let (product_id, from) = match parse_pair(&body.product_id, &body.from_location_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let to: LocationId = match dto::parse_id(&body.to_location_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state
        .call(
            "move_stock",
            state
                .services
                .ledger
                .move_stock(product_id, from, to, body.quantity),
        )
        .await
    {
        Ok(stock) => Json(stock).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_stock(
    Extension(state): Extension<ApiState>,
    query: Result<Query<dto::PairQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(v) => v,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let filter = match query.stock_filter() {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    match state
        .call("list_stock", state.services.ledger.list_stock(filter))
        .await
    {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn low_stock_report(
    Extension(state): Extension<ApiState>,
    query: Result<Query<dto::LowStockQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(v) => v,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    match state
        .call(
            "get_low_stock_report",
            state.services.ledger.get_low_stock_report(query.threshold),
        )
        .await
    {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_movements(
    Extension(state): Extension<ApiState>,
    query: Result<Query<dto::PairQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(v) => v,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let filter = match query.movement_filter() {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    match state
        .call("list_movements", state.services.ledger.list_movements(filter))
        .await
    {
        Ok(movements) => Json(movements).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
