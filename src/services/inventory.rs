use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::TableConfig,
    errors::ServiceError,
    models::Product,
    store::DataStore,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[serde(default)]
    pub specification: String,
    #[serde(default)]
    pub category: String,
    #[validate(range(min = 0, message = "Standard price cannot be negative"))]
    pub standard_price: i64,
}

/// Catalog of calibration service items.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<DataStore>,
    tables: TableConfig,
}

impl ProductService {
    pub fn new(store: Arc<DataStore>, tables: TableConfig) -> Self {
        Self { store, tables }
    }

    pub async fn list_products(&self) -> Vec<Product> {
        self.store
            .fetch_all(&self.tables.products, "name", true)
            .await
            .iter()
            .map(Product::from_row)
            .collect()
    }

    pub async fn add_product(&self, request: AddProductRequest) -> Result<Product, ServiceError> {
        request.validate()?;

        let product = Product {
            id: String::new(),
            name: request.name.trim().to_string(),
            specification: request.specification.trim().to_string(),
            category: request.category.trim().to_string(),
            standard_price: request.standard_price,
            last_updated: Utc::now(),
        };
        let stored = self
            .store
            .insert(&self.tables.products, vec![product.to_row()], None)
            .await;

        info!(product = %request.name, "catalog product added");
        stored
            .first()
            .map(Product::from_row)
            .ok_or_else(|| ServiceError::InternalError("product insert returned no row".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_only_service() -> ProductService {
        ProductService::new(Arc::new(DataStore::new(None, 1000)), TableConfig::default())
    }

    #[tokio::test]
    async fn products_list_sorted_by_name() {
        let svc = local_only_service();
        for name in ["Oscilloscope Calibration", "Clamp Meter Calibration"] {
            svc.add_product(AddProductRequest {
                name: name.to_string(),
                specification: String::new(),
                category: "Electrical".to_string(),
                standard_price: 1200,
            })
            .await
            .unwrap();
        }

        let products = svc.list_products().await;
        assert_eq!(products[0].name, "Clamp Meter Calibration");
        assert_eq!(products[1].name, "Oscilloscope Calibration");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let svc = local_only_service();
        let err = svc
            .add_product(AddProductRequest {
                name: String::new(),
                specification: String::new(),
                category: String::new(),
                standard_price: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
}
