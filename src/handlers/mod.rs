pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod technicians;
pub mod tools;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::DataStore;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<crate::services::orders::OrderService>,
    pub inventory: Arc<crate::services::inventory::ProductService>,
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub technicians: Arc<crate::services::technicians::TechnicianService>,
    pub auth: Arc<crate::services::auth::AuthService>,
    pub dashboard: Arc<crate::services::dashboard::DashboardService>,
}

impl AppServices {
    pub fn new(store: Arc<DataStore>, config: &AppConfig) -> Self {
        let tables = config.tables.clone();
        Self {
            orders: Arc::new(crate::services::orders::OrderService::new(
                store.clone(),
                tables.clone(),
            )),
            inventory: Arc::new(crate::services::inventory::ProductService::new(
                store.clone(),
                tables.clone(),
            )),
            customers: Arc::new(crate::services::customers::CustomerService::new(
                store.clone(),
                tables.clone(),
            )),
            technicians: Arc::new(crate::services::technicians::TechnicianService::new(
                store.clone(),
                tables.clone(),
            )),
            auth: Arc::new(crate::services::auth::AuthService::new(
                store.clone(),
                tables.clone(),
            )),
            dashboard: Arc::new(crate::services::dashboard::DashboardService::new(
                store, tables,
            )),
        }
    }
}
