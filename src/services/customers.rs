use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::TableConfig,
    errors::ServiceError,
    models::Customer,
    store::DataStore,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddCustomerRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct CustomerService {
    store: Arc<DataStore>,
    tables: TableConfig,
}

impl CustomerService {
    pub fn new(store: Arc<DataStore>, tables: TableConfig) -> Self {
        Self { store, tables }
    }

    pub async fn list_customers(&self) -> Vec<Customer> {
        self.store
            .fetch_all(&self.tables.customers, "name", true)
            .await
            .iter()
            .map(Customer::from_row)
            .collect()
    }

    pub async fn add_customer(&self, request: AddCustomerRequest) -> Result<Customer, ServiceError> {
        request.validate()?;
        let name = request.name.trim().to_string();

        let exists = self
            .store
            .count_where(&self.tables.customers, "name", &Value::String(name.clone()))
            .await
            > 0;
        if exists {
            return Err(ServiceError::Conflict(format!(
                "Customer {} already exists",
                name
            )));
        }

        let customer = Customer {
            id: String::new(),
            name: name.clone(),
            contact_person: request.contact_person.filter(|s| !s.trim().is_empty()),
            phone: request.phone.filter(|s| !s.trim().is_empty()),
        };
        let stored = self
            .store
            .insert(&self.tables.customers, vec![customer.to_row()], None)
            .await;

        info!(customer = %name, "customer added");
        stored
            .first()
            .map(Customer::from_row)
            .ok_or_else(|| ServiceError::InternalError("customer insert returned no row".into()))
    }
}
