//! Calibration order management API.
//!
//! An HTTP service over a two-tier storage layer: an always-available local
//! mirror and an optional remote table store, mediated by a write-latching
//! sync policy (`store::DataStore`).
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod seed;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub store: Arc<store::DataStore>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(config: config::AppConfig, store: Arc<store::DataStore>) -> Self {
        let services = handlers::AppServices::new(store.clone(), &config);
        Self {
            config,
            store,
            services,
        }
    }
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// The versioned API surface. Mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/orders/groups", get(handlers::orders::list_order_groups))
        .route(
            "/orders/{order_number}/exists",
            get(handlers::orders::order_number_exists),
        )
        .route(
            "/orders/{order_number}/status",
            put(handlers::orders::update_status),
        )
        .route(
            "/orders/{order_number}/notes",
            put(handlers::orders::update_notes),
        )
        .route(
            "/orders/{order_number}/target-date",
            put(handlers::orders::update_target_date),
        )
        .route(
            "/orders/{order_number}/restore",
            post(handlers::orders::restore_order),
        )
        .route(
            "/orders/{order_number}",
            delete(handlers::orders::delete_order),
        )
        .route(
            "/inventory",
            get(handlers::inventory::list_products).post(handlers::inventory::add_product),
        )
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::add_customer),
        )
        .route(
            "/technicians",
            get(handlers::technicians::list_technicians)
                .post(handlers::technicians::add_technician),
        )
        .route(
            "/technicians/{id}",
            delete(handlers::technicians::remove_technician),
        )
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/auth/admin/password",
            post(handlers::auth::change_admin_password),
        )
        .route(
            "/auth/technicians/{name}/password",
            put(handlers::auth::set_technician_password),
        )
        .route("/dashboard", get(handlers::dashboard::report))
        .route("/tools/resistance", get(handlers::tools::resistance))
}

/// Full application router: root banner, health, v1 API, Swagger UI.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "caliops-api up" }))
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
}
