//! HTTP API: routing, request/response mapping and the request log.

pub mod app;
pub mod middleware;
