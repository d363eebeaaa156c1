//! Defines routes for the image metadata service.
//!
//! ## Structure
//! - **Trigger** (any method, no body size limit)
//!   - `/`          : compute and persist image metadata
//!   - `/image-meta`: same handler under a descriptive path
//!
//! - **Probes**
//!   - `GET  /healthz`: liveness
//!   - `GET  /readyz` : storage readiness

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        image_meta_handlers::image_meta,
    },
    services::pipeline::ImageMetaPipeline,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{any, get},
};

/// Build and return the router for all routes.
///
/// The router carries the shared `ImageMetaPipeline` to all handlers; it
/// holds configuration and the storage backend, never per-request state.
pub fn routes() -> Router<ImageMetaPipeline> {
    // Every answer on the trigger is MessagePack, so neither the method nor
    // the body size may be rejected by the framework before the handler runs.
    let trigger = Router::new()
        .route("/", any(image_meta))
        .route("/image-meta", any(image_meta))
        .layer(DefaultBodyLimit::disable());

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(trigger)
}
