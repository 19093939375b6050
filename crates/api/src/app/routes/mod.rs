use axum::Router;

pub mod locations;
pub mod products;
pub mod stock;
pub mod system;

/// Router for all service endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/locations", locations::router())
        .nest("/stock", stock::router())
}
