use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::{TableConfig, ADMIN_PASSWORD_KEY, LOCAL_FALLBACK_ADMIN_PASSWORD, USER_PASSWORD_PREFIX},
    errors::ServiceError,
    store::{ConnectionState, DataStore},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangeAdminPasswordRequest {
    pub current_password: String,
    #[validate(length(min = 1, message = "New password must not be empty"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SetTechnicianPasswordRequest {
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// Password checks and settings-backed credential storage. Passwords are
/// stored as plain values in the settings tables and compared after
/// trimming surrounding whitespace on both sides.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<DataStore>,
    tables: TableConfig,
}

impl AuthService {
    pub fn new(store: Arc<DataStore>, tables: TableConfig) -> Self {
        Self { store, tables }
    }

    fn matches(stored: &str, supplied: &str) -> bool {
        stored.trim() == supplied.trim()
    }

    fn technician_key(name: &str) -> String {
        format!("{USER_PASSWORD_PREFIX}{}", name.trim())
    }

    #[instrument(skip(self, password))]
    pub async fn verify_admin_password(&self, password: &str) -> Result<(), ServiceError> {
        let stored = self
            .store
            .get_setting(&self.tables.admin_settings, ADMIN_PASSWORD_KEY)
            .await;

        let ok = match stored {
            Some(stored) => Self::matches(&stored, password),
            // No record reachable: only the offline fallback opens the door.
            None => {
                self.store.connection_state() == ConnectionState::LocalOnly
                    && Self::matches(LOCAL_FALLBACK_ADMIN_PASSWORD, password)
            }
        };

        if ok {
            Ok(())
        } else {
            warn!("admin password verification failed");
            Err(ServiceError::AuthError("Invalid admin password".to_string()))
        }
    }

    /// Technician login. A missing password record means the technician was
    /// never provisioned and is rejected, except while running against the
    /// mirror only, where provisioning data may simply be unreachable.
    #[instrument(skip(self, password), fields(technician = %name))]
    pub async fn verify_technician_password(
        &self,
        name: &str,
        password: &str,
    ) -> Result<(), ServiceError> {
        let stored = self
            .store
            .get_setting(&self.tables.user_settings, &Self::technician_key(name))
            .await;

        let ok = match stored {
            Some(stored) => Self::matches(&stored, password),
            None => self.store.connection_state() == ConnectionState::LocalOnly,
        };

        if ok {
            Ok(())
        } else {
            warn!(technician = %name, "technician password verification failed");
            Err(ServiceError::AuthError("Invalid credentials".to_string()))
        }
    }

    pub async fn change_admin_password(
        &self,
        request: ChangeAdminPasswordRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;
        self.verify_admin_password(&request.current_password).await?;

        self.store
            .upsert_setting(
                &self.tables.admin_settings,
                ADMIN_PASSWORD_KEY,
                request.new_password.trim(),
            )
            .await;
        info!("admin password changed");
        Ok(())
    }

    pub async fn set_technician_password(
        &self,
        name: &str,
        request: SetTechnicianPasswordRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Technician name is required".to_string(),
            ));
        }

        self.store
            .upsert_setting(
                &self.tables.user_settings,
                &Self::technician_key(name),
                request.password.trim(),
            )
            .await;
        info!(technician = %name, "technician password set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{testing::MockRemote, RemoteBackend};

    fn local_only_service() -> AuthService {
        AuthService::new(Arc::new(DataStore::new(None, 1000)), TableConfig::default())
    }

    fn connected_service(mock: &Arc<MockRemote>) -> AuthService {
        AuthService::new(
            Arc::new(DataStore::new(
                Some(mock.clone() as Arc<dyn RemoteBackend>),
                1000,
            )),
            TableConfig::default(),
        )
    }

    #[tokio::test]
    async fn admin_comparison_ignores_surrounding_whitespace() {
        let svc = local_only_service();
        svc.store
            .upsert_setting(&svc.tables.admin_settings, ADMIN_PASSWORD_KEY, "1234")
            .await;

        assert!(svc.verify_admin_password(" 1234 ").await.is_ok());
        assert!(svc.verify_admin_password("12345").await.is_err());
    }

    #[tokio::test]
    async fn admin_fallback_only_without_stored_record() {
        let svc = local_only_service();
        assert!(svc.verify_admin_password("0000").await.is_ok());
        assert!(svc.verify_admin_password("1111").await.is_err());

        svc.store
            .upsert_setting(&svc.tables.admin_settings, ADMIN_PASSWORD_KEY, "secret")
            .await;
        assert!(
            svc.verify_admin_password("0000").await.is_err(),
            "fallback stops applying once a password is stored"
        );
    }

    #[tokio::test]
    async fn connected_missing_technician_is_denied() {
        let mock = Arc::new(MockRemote::new());
        let svc = connected_service(&mock);

        let err = svc
            .verify_technician_password("Chen", "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AuthError(_)));
    }

    #[tokio::test]
    async fn local_only_missing_technician_is_allowed() {
        let svc = local_only_service();
        assert!(svc.verify_technician_password("Chen", "whatever").await.is_ok());
    }

    #[tokio::test]
    async fn technician_password_round_trip() {
        let svc = local_only_service();
        svc.set_technician_password(
            "Chen",
            SetTechnicianPasswordRequest {
                password: "tool-room".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(svc.verify_technician_password("Chen", "tool-room").await.is_ok());
        assert!(svc.verify_technician_password("Chen", "wrong").await.is_err());
    }

    #[tokio::test]
    async fn change_admin_password_requires_current() {
        let svc = local_only_service();
        svc.store
            .upsert_setting(&svc.tables.admin_settings, ADMIN_PASSWORD_KEY, "old")
            .await;

        let denied = svc
            .change_admin_password(ChangeAdminPasswordRequest {
                current_password: "wrong".to_string(),
                new_password: "new".to_string(),
            })
            .await;
        assert!(denied.is_err());

        svc.change_admin_password(ChangeAdminPasswordRequest {
            current_password: "old".to_string(),
            new_password: "new".to_string(),
        })
        .await
        .unwrap();
        assert!(svc.verify_admin_password("new").await.is_ok());
    }
}
