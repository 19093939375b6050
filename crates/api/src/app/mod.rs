//! HTTP API application wiring (Axum router + service state).
//!
//! - `routes/`: HTTP routes + handlers (one file per service)
//! - `dto.rs`: request DTOs and id/query parsing
//! - `errors.rs`: consistent error responses

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use stockroom_core::InventoryResult;
use stockroom_infra::{InventoryServices, with_deadline};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub services: Arc<InventoryServices>,
    pub request_timeout: Option<Duration>,
}

impl ApiState {
    /// Run a service call under the configured per-request deadline.
    pub async fn call<T>(
        &self,
        operation: &str,
        call: impl Future<Output = InventoryResult<T>>,
    ) -> InventoryResult<T> {
        with_deadline(self.request_timeout, operation, call).await
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<InventoryServices>, request_timeout: Option<Duration>) -> Router {
    let state = ApiState {
        services,
        request_timeout,
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_log))
                .layer(Extension(state)),
        )
}
