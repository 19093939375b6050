use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockroom_core::ProductId;

use crate::app::{ApiState, dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/by-sku/:sku", get(get_product_by_sku))
        .route("/:id", get(get_product))
}

pub async fn create_product(
    Extension(state): Extension<ApiState>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    let catalog = &state.services.catalog;
    match state
        .call(
            "create_product",
            catalog.create_product(&body.sku, &body.name, body.description, body.price),
        )
        .await
    {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_products(Extension(state): Extension<ApiState>) -> axum::response::Response {
    match state
        .call("list_products", state.services.catalog.list_products())
        .await
    {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(state): Extension<ApiState>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.call("get_product", state.services.catalog.get_by_id(id)).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn get_product_by_sku(
    Extension(state): Extension<ApiState>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    match state
        .call("get_product_by_sku", state.services.catalog.get_by_sku(&sku))
        .await
    {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
