//! Plain records shared by the store, services and handlers.
//!
//! Every entity is mirrored as a snake_case wire row
//! (`serde_json::Map<String, Value>`) in both the remote table store and the
//! local mirror; the `from_row` / `to_row` pairs here are the only place that
//! mapping lives. Row parsing is tolerant: missing or mistyped columns fall
//! back to defaults instead of failing the whole read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::store::Row;

/// Lifecycle status of a calibration order line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum CalibrationStatus {
    Pending,
    Calibrating,
    Completed,
}

impl CalibrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Calibrating => "Calibrating",
            Self::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(Self::Pending),
            "Calibrating" => Some(Self::Calibrating),
            "Completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a line is calibrated in-house or sent out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CalibrationType {
    Internal,
    External,
}

impl CalibrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "Internal",
            Self::External => "External",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Internal" => Some(Self::Internal),
            "External" => Some(Self::External),
            _ => None,
        }
    }
}

/// Per-line total with the rounding rule shared by every caller:
/// `round(unit_price * quantity * discount_rate / 100)`.
///
/// The product is taken in i128 so hostile row values cannot overflow;
/// results beyond the i64 range saturate instead of wrapping.
pub fn line_total(unit_price: i64, quantity: i64, discount_rate: f64) -> i64 {
    let gross = unit_price as i128 * quantity as i128;
    let total = gross as f64 * discount_rate / 100.0;
    total.round() as i64
}

/// One calibration service charge within an order. Header fields (customer,
/// equipment, dates, technicians, discount, notes, archived flag) are
/// denormalized onto every line sharing an `order_number`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: String,
    pub order_number: String,
    pub equipment_number: String,
    pub equipment_name: String,
    pub customer_name: String,
    pub product_id: Option<String>,
    pub product_name: String,
    pub product_spec: String,
    pub category: String,
    pub calibration_type: CalibrationType,
    pub quantity: i64,
    pub unit_price: i64,
    /// Percentage shared by every line of the order (100 = no discount)
    pub discount_rate: f64,
    /// Computed, never stored remotely
    pub total_amount: i64,
    pub status: CalibrationStatus,
    pub create_date: DateTime<Utc>,
    pub target_date: Option<DateTime<Utc>>,
    pub technicians: Vec<String>,
    pub notes: Option<String>,
    pub is_archived: bool,
    pub restore_reason: Option<String>,
}

impl OrderLine {
    pub fn from_row(row: &Row) -> Self {
        let quantity = row_i64(row, "quantity").unwrap_or(0);
        let unit_price = row_i64(row, "unit_price").unwrap_or(0);
        let discount_rate = row_f64(row, "discount_rate").unwrap_or(100.0);

        Self {
            id: row_string(row, "id").unwrap_or_default(),
            order_number: row_string(row, "order_number").unwrap_or_default(),
            equipment_number: row_string(row, "equipment_number").unwrap_or_default(),
            equipment_name: row_string(row, "equipment_name").unwrap_or_default(),
            customer_name: row_string(row, "customer_name").unwrap_or_default(),
            product_id: row_string(row, "product_id"),
            product_name: row_string(row, "product_name").unwrap_or_default(),
            product_spec: row_string(row, "product_spec").unwrap_or_default(),
            category: row_string(row, "category").unwrap_or_default(),
            calibration_type: row_string(row, "calibration_type")
                .and_then(|s| CalibrationType::parse(&s))
                .unwrap_or(CalibrationType::Internal),
            quantity,
            unit_price,
            discount_rate,
            total_amount: line_total(unit_price, quantity, discount_rate),
            status: row_string(row, "status")
                .and_then(|s| CalibrationStatus::parse(&s))
                .unwrap_or(CalibrationStatus::Pending),
            create_date: row_datetime(row, "create_date").unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            target_date: row_datetime(row, "target_date"),
            technicians: row_strings(row, "technicians"),
            notes: row_string(row, "notes").filter(|s| !s.is_empty()),
            is_archived: row_bool(row, "is_archived").unwrap_or(false),
            restore_reason: row_string(row, "restore_reason").filter(|s| !s.is_empty()),
        }
    }

    /// Wire row for inserts. `total_amount` is intentionally absent: it is
    /// recomputed from the priced columns on every read.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), Value::String(self.id.clone()));
        row.insert(
            "order_number".into(),
            Value::String(self.order_number.clone()),
        );
        row.insert(
            "equipment_number".into(),
            Value::String(self.equipment_number.clone()),
        );
        row.insert(
            "equipment_name".into(),
            Value::String(self.equipment_name.clone()),
        );
        row.insert(
            "customer_name".into(),
            Value::String(self.customer_name.clone()),
        );
        row.insert(
            "product_id".into(),
            self.product_id
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
        row.insert(
            "product_name".into(),
            Value::String(self.product_name.clone()),
        );
        row.insert(
            "product_spec".into(),
            Value::String(self.product_spec.clone()),
        );
        row.insert("category".into(), Value::String(self.category.clone()));
        row.insert(
            "calibration_type".into(),
            Value::String(self.calibration_type.as_str().to_string()),
        );
        row.insert("quantity".into(), Value::from(self.quantity));
        row.insert("unit_price".into(), Value::from(self.unit_price));
        row.insert("discount_rate".into(), Value::from(self.discount_rate));
        row.insert(
            "status".into(),
            Value::String(self.status.as_str().to_string()),
        );
        row.insert(
            "create_date".into(),
            Value::String(self.create_date.to_rfc3339()),
        );
        row.insert(
            "target_date".into(),
            self.target_date
                .map(|d| Value::String(d.to_rfc3339()))
                .unwrap_or(Value::Null),
        );
        row.insert(
            "technicians".into(),
            Value::Array(
                self.technicians
                    .iter()
                    .map(|t| Value::String(t.clone()))
                    .collect(),
            ),
        );
        row.insert(
            "notes".into(),
            self.notes.clone().map(Value::String).unwrap_or(Value::Null),
        );
        row.insert("is_archived".into(), Value::Bool(self.is_archived));
        row.insert(
            "restore_reason".into(),
            self.restore_reason
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
        row
    }
}

/// Calibration service catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub specification: String,
    pub category: String,
    pub standard_price: i64,
    pub last_updated: DateTime<Utc>,
}

impl Product {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row_string(row, "id").unwrap_or_default(),
            name: row_string(row, "name").unwrap_or_default(),
            specification: row_string(row, "specification").unwrap_or_default(),
            category: row_string(row, "category").unwrap_or_default(),
            standard_price: row_i64(row, "standard_price").unwrap_or(0),
            last_updated: row_datetime(row, "last_updated").unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), Value::String(self.id.clone()));
        row.insert("name".into(), Value::String(self.name.clone()));
        row.insert(
            "specification".into(),
            Value::String(self.specification.clone()),
        );
        row.insert("category".into(), Value::String(self.category.clone()));
        row.insert("standard_price".into(), Value::from(self.standard_price));
        row.insert(
            "last_updated".into(),
            Value::String(self.last_updated.to_rfc3339()),
        );
        row
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
}

impl Customer {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row_string(row, "id").unwrap_or_default(),
            name: row_string(row, "name").unwrap_or_default(),
            contact_person: row_string(row, "contact_person").filter(|s| !s.is_empty()),
            phone: row_string(row, "phone").filter(|s| !s.is_empty()),
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), Value::String(self.id.clone()));
        row.insert("name".into(), Value::String(self.name.clone()));
        row.insert(
            "contact_person".into(),
            self.contact_person
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
        row.insert(
            "phone".into(),
            self.phone.clone().map(Value::String).unwrap_or(Value::Null),
        );
        row
    }
}

/// Assignable calibration engineer; also a login principal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Technician {
    pub id: String,
    pub name: String,
}

impl Technician {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row_string(row, "id").unwrap_or_default(),
            name: row_string(row, "name").unwrap_or_default(),
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), Value::String(self.id.clone()));
        row.insert("name".into(), Value::String(self.name.clone()));
        row
    }
}

// --- Row helpers ---

pub fn row_string(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn row_i64(row: &Row, key: &str) -> Option<i64> {
    match row.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn row_f64(row: &Row, key: &str) -> Option<f64> {
    match row.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn row_bool(row: &Row, key: &str) -> Option<bool> {
    match row.get(key)? {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

pub fn row_datetime(row: &Row, key: &str) -> Option<DateTime<Utc>> {
    match row.get(key)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                // Date-only columns come back without a time component
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|ndt| ndt.and_utc())
            }),
        _ => None,
    }
}

pub fn row_strings(row: &Row, key: &str) -> Vec<String> {
    match row.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_row() -> Row {
        let Value::Object(map) = json!({
            "id": "b9a1c3de-0000-4000-8000-000000000001",
            "order_number": "CAL-2024-001",
            "equipment_number": "EQ-77",
            "equipment_name": "Power Analyzer",
            "customer_name": "Acme Labs",
            "product_id": null,
            "product_name": "DMM Calibration",
            "product_spec": "6.5 digit",
            "category": "Electrical",
            "calibration_type": "Internal",
            "quantity": 2,
            "unit_price": 1500,
            "discount_rate": 90.0,
            "status": "Pending",
            "create_date": "2024-03-10T08:00:00Z",
            "target_date": "2024-03-17",
            "technicians": ["Chen", "Lin"],
            "notes": "",
            "is_archived": false,
            "restore_reason": null
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn total_is_recomputed_with_rounding() {
        let line = OrderLine::from_row(&sample_row());
        // 1500 * 2 * 0.9 = 2700
        assert_eq!(line.total_amount, 2700);
        assert_eq!(line_total(333, 1, 50.0), 167, "166.5 rounds half up");
    }

    #[test]
    fn extreme_price_and_quantity_saturate_instead_of_overflowing() {
        // Rows can carry arbitrary values; the product must not wrap or panic
        assert_eq!(line_total(i64::MAX, 2, 100.0), i64::MAX);
        assert_eq!(line_total(i64::MIN, 2, 100.0), i64::MIN);
        assert_eq!(line_total(i64::MAX, 0, 100.0), 0);
    }

    #[test]
    fn date_only_target_dates_parse() {
        let line = OrderLine::from_row(&sample_row());
        let target = line.target_date.expect("target date");
        assert_eq!(target.to_rfc3339(), "2024-03-17T00:00:00+00:00");
    }

    #[test]
    fn empty_notes_become_none() {
        let line = OrderLine::from_row(&sample_row());
        assert_eq!(line.notes, None);
        assert_eq!(line.technicians, vec!["Chen", "Lin"]);
    }

    #[test]
    fn row_round_trip_preserves_fields() {
        let line = OrderLine::from_row(&sample_row());
        let back = OrderLine::from_row(&line.to_row());
        assert_eq!(line, back);
    }

    #[test]
    fn missing_columns_fall_back_to_defaults() {
        let mut row = sample_row();
        row.remove("status");
        row.remove("discount_rate");
        row.remove("technicians");
        let line = OrderLine::from_row(&row);
        assert_eq!(line.status, CalibrationStatus::Pending);
        assert_eq!(line.discount_rate, 100.0);
        assert!(line.technicians.is_empty());
    }
}
