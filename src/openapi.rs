use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Caliops API",
        version = "0.1.0",
        description = r#"
Calibration order management API.

Orders are stored as one line per cart item, all lines sharing an order
number. Every write is applied to an in-process local mirror first and then
to the remote table store; the first remote write failure switches the
service to local-only for the rest of the process lifetime. `/health`
reports the current connection state.
        "#,
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Order creation and group mutations"),
        (name = "Inventory", description = "Calibration service catalog"),
        (name = "Customers", description = "Customer registry"),
        (name = "Technicians", description = "Technician registry"),
        (name = "Auth", description = "Password checks and storage"),
        (name = "Dashboard", description = "Revenue and status aggregates"),
        (name = "Tools", description = "Calibration bench utilities"),
        (name = "Health", description = "Service status")
    ),
    paths(
        crate::handlers::orders::list_orders,
        crate::handlers::orders::list_order_groups,
        crate::handlers::orders::order_number_exists,
        crate::handlers::orders::create_order,
        crate::handlers::orders::update_status,
        crate::handlers::orders::update_notes,
        crate::handlers::orders::update_target_date,
        crate::handlers::orders::restore_order,
        crate::handlers::orders::delete_order,
        crate::handlers::inventory::list_products,
        crate::handlers::inventory::add_product,
        crate::handlers::customers::list_customers,
        crate::handlers::customers::add_customer,
        crate::handlers::technicians::list_technicians,
        crate::handlers::technicians::add_technician,
        crate::handlers::technicians::remove_technician,
        crate::handlers::auth::login,
        crate::handlers::auth::change_admin_password,
        crate::handlers::auth::set_technician_password,
        crate::handlers::dashboard::report,
        crate::handlers::tools::resistance,
        crate::handlers::health::health,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,
            crate::models::OrderLine,
            crate::models::Product,
            crate::models::Customer,
            crate::models::Technician,
            crate::models::CalibrationStatus,
            crate::models::CalibrationType,
            crate::services::orders::CartItem,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::OrderGroup,
            crate::services::inventory::AddProductRequest,
            crate::services::customers::AddCustomerRequest,
            crate::services::technicians::AddTechnicianRequest,
            crate::services::auth::LoginRequest,
            crate::services::auth::ChangeAdminPasswordRequest,
            crate::services::auth::SetTechnicianPasswordRequest,
            crate::services::dashboard::DashboardReport,
            crate::services::dashboard::MonthlyRevenue,
            crate::services::dashboard::StatusCount,
            crate::services::dashboard::TechnicianRevenue,
            crate::services::tools::ConductorMaterial,
            crate::services::tools::ResistanceResult,
            crate::handlers::orders::ExistsResponse,
            crate::handlers::orders::UpdateStatusRequest,
            crate::handlers::orders::UpdateNotesRequest,
            crate::handlers::orders::UpdateTargetDateRequest,
            crate::handlers::orders::RestoreOrderRequest,
            crate::handlers::orders::DeleteOrderRequest,
            crate::handlers::orders::DeletedResponse,
            crate::handlers::technicians::RemovedResponse,
            crate::handlers::auth::LoginRole,
            crate::handlers::auth::LoginResponse,
            crate::handlers::dashboard::DashboardQuery,
            crate::handlers::tools::ResistanceQuery,
            crate::handlers::health::HealthResponse,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_the_order_routes() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("/api/v1/orders"));
        assert!(json.contains("/api/v1/tools/resistance"));
        assert!(json.contains("/health"));
    }
}
