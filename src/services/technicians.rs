use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::TableConfig,
    errors::ServiceError,
    models::Technician,
    store::DataStore,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddTechnicianRequest {
    #[validate(length(min = 1, message = "Technician name is required"))]
    pub name: String,
}

#[derive(Clone)]
pub struct TechnicianService {
    store: Arc<DataStore>,
    tables: TableConfig,
}

impl TechnicianService {
    pub fn new(store: Arc<DataStore>, tables: TableConfig) -> Self {
        Self { store, tables }
    }

    pub async fn list_technicians(&self) -> Vec<Technician> {
        self.store
            .fetch_all(&self.tables.technicians, "name", true)
            .await
            .iter()
            .map(Technician::from_row)
            .collect()
    }

    pub async fn add_technician(
        &self,
        request: AddTechnicianRequest,
    ) -> Result<Technician, ServiceError> {
        request.validate()?;
        let name = request.name.trim().to_string();

        let technician = Technician {
            id: String::new(),
            name: name.clone(),
        };
        let stored = self
            .store
            .insert(&self.tables.technicians, vec![technician.to_row()], None)
            .await;

        info!(technician = %name, "technician added");
        stored
            .first()
            .map(Technician::from_row)
            .ok_or_else(|| ServiceError::InternalError("technician insert returned no row".into()))
    }

    pub async fn remove_technician(&self, id: &str) -> usize {
        self.store
            .delete_where(
                &self.tables.technicians,
                "id",
                &Value::String(id.to_string()),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_remove_technician() {
        let svc = TechnicianService::new(
            Arc::new(DataStore::new(None, 1000)),
            TableConfig::default(),
        );
        let tech = svc
            .add_technician(AddTechnicianRequest {
                name: "Chen".to_string(),
            })
            .await
            .unwrap();
        assert!(!tech.id.is_empty(), "mirror assigns a provisional id");

        let removed = svc.remove_technician(&tech.id).await;
        assert_eq!(removed, 1);
        assert!(svc.list_technicians().await.is_empty());
    }
}
