use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::TableConfig,
    errors::ServiceError,
    models::{line_total, CalibrationStatus, CalibrationType, Customer, OrderLine, Product},
    store::{DataStore, Row},
};

/// Core columns resent when the first remote insert fails: a remote schema
/// missing optional columns (equipment, technicians, notes) still accepts
/// the priced line itself.
pub const ORDER_FALLBACK_COLUMNS: &[&str] = &[
    "order_number",
    "customer_name",
    "product_name",
    "quantity",
    "unit_price",
    "discount_rate",
    "status",
    "create_date",
    "is_archived",
];

/// One cart entry of a new order submission.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CartItem {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub product_name: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product_spec: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_calibration_type")]
    pub calibration_type: CalibrationType,
    #[validate(range(min = 1, max = 1_000_000, message = "Quantity must be between 1 and 1,000,000"))]
    pub quantity: i64,
    #[validate(range(min = 0, max = 1_000_000_000_000, message = "Unit price must be between 0 and 1,000,000,000,000"))]
    pub unit_price: i64,
    /// Register this item as a new catalog product alongside the order
    #[serde(default)]
    pub save_to_inventory: bool,
}

fn default_calibration_type() -> CalibrationType {
    CalibrationType::Internal
}

fn default_discount_rate() -> f64 {
    100.0
}

/// Header fields plus the cart. One submission expands into one order line
/// per cart item, all sharing the order number.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Order number is required"))]
    pub order_number: String,
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[serde(default)]
    pub equipment_number: String,
    #[serde(default)]
    pub equipment_name: String,
    #[serde(default = "default_discount_rate")]
    #[validate(range(min = 0.0, max = 100.0, message = "Discount rate must be 0-100"))]
    pub discount_rate: f64,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub technicians: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[validate]
    pub items: Vec<CartItem>,
}

/// One logical work order: every line sharing an order number, summarized.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderGroup {
    pub order_number: String,
    pub customer_name: String,
    pub equipment_number: String,
    pub equipment_name: String,
    pub status: CalibrationStatus,
    pub create_date: DateTime<Utc>,
    pub target_date: Option<DateTime<Utc>>,
    pub technicians: Vec<String>,
    pub discount_rate: f64,
    pub notes: Option<String>,
    pub is_archived: bool,
    pub restore_reason: Option<String>,
    pub total_amount: i64,
    pub lines: Vec<OrderLine>,
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<DataStore>,
    tables: TableConfig,
}

impl OrderService {
    pub fn new(store: Arc<DataStore>, tables: TableConfig) -> Self {
        Self { store, tables }
    }

    /// All order lines, newest first.
    pub async fn list_orders(&self) -> Vec<OrderLine> {
        self.store
            .fetch_all(&self.tables.orders, "create_date", false)
            .await
            .iter()
            .map(OrderLine::from_row)
            .collect()
    }

    /// Lines grouped into logical work orders, preserving newest-first
    /// order. Header fields come from the first line of each group.
    pub async fn list_order_groups(&self) -> Vec<OrderGroup> {
        let lines = self.list_orders().await;
        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            if !grouped.contains_key(&line.order_number) {
                order.push(line.order_number.clone());
            }
            grouped.entry(line.order_number.clone()).or_default().push(line);
        }

        order
            .into_iter()
            .map(|order_number| {
                let lines = grouped.remove(&order_number).unwrap_or_default();
                let head = &lines[0];
                OrderGroup {
                    order_number,
                    customer_name: head.customer_name.clone(),
                    equipment_number: head.equipment_number.clone(),
                    equipment_name: head.equipment_name.clone(),
                    status: head.status,
                    create_date: head.create_date,
                    target_date: head.target_date,
                    technicians: head.technicians.clone(),
                    discount_rate: head.discount_rate,
                    notes: head.notes.clone(),
                    is_archived: head.is_archived,
                    restore_reason: head.restore_reason.clone(),
                    total_amount: lines.iter().map(|l| l.total_amount).sum(),
                    lines,
                }
            })
            .collect()
    }

    pub async fn order_number_exists(&self, order_number: &str) -> bool {
        self.store
            .count_where(
                &self.tables.orders,
                "order_number",
                &Value::String(order_number.to_string()),
            )
            .await
            > 0
    }

    /// Creates one line per cart item, all sharing the order number.
    /// Registers the customer and any cart item flagged for the catalog
    /// before the batch insert, the same request assembly the submission
    /// form used to do client-side.
    #[instrument(skip(self, request), fields(order_number = %request.order_number))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<Vec<OrderLine>, ServiceError> {
        request.validate()?;
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".into(),
            ));
        }

        let order_number = request.order_number.trim().to_string();
        if self.order_number_exists(&order_number).await {
            return Err(ServiceError::Conflict(format!(
                "Order number {} already exists",
                order_number
            )));
        }

        self.ensure_customer(request.customer_name.trim()).await;

        let now = Utc::now();
        let mut rows: Vec<Row> = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product_id = if item.save_to_inventory && item.product_id.is_none() {
                Some(
                    self.register_product(item, now)
                        .await
                        .map(|product| product.id)?,
                )
            } else {
                item.product_id.clone()
            };

            let line = OrderLine {
                id: String::new(),
                order_number: order_number.clone(),
                equipment_number: request.equipment_number.trim().to_string(),
                equipment_name: request.equipment_name.trim().to_string(),
                customer_name: request.customer_name.trim().to_string(),
                // Strictly-typed remote columns reject non-UUID keys
                product_id: sanitize_uuid(product_id),
                product_name: item.product_name.clone(),
                product_spec: item.product_spec.clone(),
                category: item.category.clone(),
                calibration_type: item.calibration_type,
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount_rate: request.discount_rate,
                total_amount: line_total(item.unit_price, item.quantity, request.discount_rate),
                status: CalibrationStatus::Pending,
                create_date: now,
                target_date: request
                    .target_date
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|ndt| ndt.and_utc()),
                technicians: request.technicians.clone(),
                notes: request.notes.clone().filter(|n| !n.trim().is_empty()),
                is_archived: false,
                restore_reason: None,
            };
            rows.push(line.to_row());
        }

        let stored = self
            .store
            .insert(&self.tables.orders, rows, Some(ORDER_FALLBACK_COLUMNS))
            .await;

        info!(
            order_number = %order_number,
            lines = stored.len(),
            "order created"
        );
        Ok(stored.iter().map(OrderLine::from_row).collect())
    }

    /// Group-wide status change. Completing an order archives it.
    pub async fn update_status(&self, order_number: &str, status: CalibrationStatus) {
        let mut patch = Row::new();
        patch.insert(
            "status".into(),
            Value::String(status.as_str().to_string()),
        );
        if status.is_completed() {
            patch.insert("is_archived".into(), Value::Bool(true));
        }
        self.group_patch(order_number, patch).await;
    }

    pub async fn update_notes(&self, order_number: &str, notes: &str) {
        let mut patch = Row::new();
        patch.insert("notes".into(), Value::String(notes.to_string()));
        self.group_patch(order_number, patch).await;
    }

    pub async fn update_target_date(&self, order_number: &str, target_date: NaiveDate) {
        let mut patch = Row::new();
        let stamp = target_date
            .and_hms_opt(0, 0, 0)
            .map(|ndt| ndt.and_utc().to_rfc3339())
            .unwrap_or_default();
        patch.insert("target_date".into(), Value::String(stamp));
        self.group_patch(order_number, patch).await;
    }

    /// Clears the archived flag, resets the group to pending and records the
    /// supplied reason on every line.
    pub async fn restore(&self, order_number: &str, reason: &str) {
        let mut patch = Row::new();
        patch.insert("is_archived".into(), Value::Bool(false));
        patch.insert(
            "status".into(),
            Value::String(CalibrationStatus::Pending.as_str().to_string()),
        );
        patch.insert(
            "restore_reason".into(),
            Value::String(reason.to_string()),
        );
        self.group_patch(order_number, patch).await;
    }

    /// Removes every line of the group.
    pub async fn delete(&self, order_number: &str) -> usize {
        self.store
            .delete_where(
                &self.tables.orders,
                "order_number",
                &Value::String(order_number.to_string()),
            )
            .await
    }

    async fn group_patch(&self, order_number: &str, patch: Row) {
        self.store
            .update_where(
                &self.tables.orders,
                "order_number",
                &Value::String(order_number.to_string()),
                &patch,
            )
            .await;
    }

    async fn ensure_customer(&self, name: &str) {
        let exists = self
            .store
            .count_where(
                &self.tables.customers,
                "name",
                &Value::String(name.to_string()),
            )
            .await
            > 0;
        if !exists {
            let customer = Customer {
                id: String::new(),
                name: name.to_string(),
                contact_person: None,
                phone: None,
            };
            self.store
                .insert(&self.tables.customers, vec![customer.to_row()], None)
                .await;
            info!(customer = name, "registered new customer");
        }
    }

    async fn register_product(
        &self,
        item: &CartItem,
        now: DateTime<Utc>,
    ) -> Result<Product, ServiceError> {
        let product = Product {
            id: String::new(),
            name: item.product_name.clone(),
            specification: item.product_spec.clone(),
            category: item.category.clone(),
            standard_price: item.unit_price,
            last_updated: now,
        };
        let stored = self
            .store
            .insert(&self.tables.products, vec![product.to_row()], None)
            .await;
        stored
            .first()
            .map(Product::from_row)
            .ok_or_else(|| ServiceError::InternalError("product insert returned no row".into()))
    }
}

/// Keys that are not valid UUIDs are dropped rather than sent to a
/// UUID-typed remote column.
fn sanitize_uuid(id: Option<String>) -> Option<String> {
    id.filter(|candidate| Uuid::parse_str(candidate).is_ok())
}
