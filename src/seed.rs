//! Sample rows installed into the local mirror at startup so the service is
//! usable before (or without) the remote table store.

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{
    config::TableConfig,
    models::{
        line_total, CalibrationStatus, CalibrationType, Customer, OrderLine, Product, Technician,
    },
    store::DataStore,
};

pub async fn seed_sample_data(store: &DataStore, tables: &TableConfig) {
    let now = Utc::now();

    let products = vec![
        Product {
            id: Uuid::new_v4().to_string(),
            name: "Digital multimeter".to_string(),
            specification: "6.5 digit, DC voltage".to_string(),
            category: "Electrical".to_string(),
            standard_price: 45_000,
            last_updated: now,
        },
        Product {
            id: Uuid::new_v4().to_string(),
            name: "Pressure gauge".to_string(),
            specification: "0-10 bar, class 0.6".to_string(),
            category: "Pressure".to_string(),
            standard_price: 30_000,
            last_updated: now,
        },
        Product {
            id: Uuid::new_v4().to_string(),
            name: "Torque wrench".to_string(),
            specification: "20-200 Nm".to_string(),
            category: "Mechanical".to_string(),
            standard_price: 38_000,
            last_updated: now,
        },
    ];

    let customers = vec![
        Customer {
            id: Uuid::new_v4().to_string(),
            name: "Hanil Precision".to_string(),
            contact_person: Some("J. Moon".to_string()),
            phone: Some("031-555-0192".to_string()),
        },
        Customer {
            id: Uuid::new_v4().to_string(),
            name: "Daesung Machinery".to_string(),
            contact_person: None,
            phone: None,
        },
    ];

    let technicians = vec![
        Technician {
            id: Uuid::new_v4().to_string(),
            name: "S. Park".to_string(),
        },
        Technician {
            id: Uuid::new_v4().to_string(),
            name: "H. Chen".to_string(),
        },
    ];

    let order_lines = vec![
        sample_line(
            "CAL-SAMPLE-001",
            "Hanil Precision",
            &products[0],
            2,
            100.0,
            CalibrationStatus::Pending,
            &["S. Park"],
            now - Duration::days(3),
        ),
        sample_line(
            "CAL-SAMPLE-001",
            "Hanil Precision",
            &products[1],
            1,
            100.0,
            CalibrationStatus::Pending,
            &["S. Park"],
            now - Duration::days(3),
        ),
        sample_line(
            "CAL-SAMPLE-002",
            "Daesung Machinery",
            &products[2],
            1,
            90.0,
            CalibrationStatus::Completed,
            &["H. Chen"],
            now - Duration::days(30),
        ),
    ];

    store
        .local()
        .seed(
            &tables.products,
            products.iter().map(Product::to_row).collect(),
        )
        .await;
    store
        .local()
        .seed(
            &tables.customers,
            customers.iter().map(Customer::to_row).collect(),
        )
        .await;
    store
        .local()
        .seed(
            &tables.technicians,
            technicians.iter().map(Technician::to_row).collect(),
        )
        .await;
    store
        .local()
        .seed(
            &tables.orders,
            order_lines.iter().map(OrderLine::to_row).collect(),
        )
        .await;

    info!("sample data installed into the local mirror");
}

#[allow(clippy::too_many_arguments)]
fn sample_line(
    order_number: &str,
    customer: &str,
    product: &Product,
    quantity: i64,
    discount_rate: f64,
    status: CalibrationStatus,
    technicians: &[&str],
    create_date: chrono::DateTime<Utc>,
) -> OrderLine {
    let completed = status.is_completed();
    OrderLine {
        id: Uuid::new_v4().to_string(),
        order_number: order_number.to_string(),
        equipment_number: String::new(),
        equipment_name: product.name.clone(),
        customer_name: customer.to_string(),
        product_id: Some(product.id.clone()),
        product_name: product.name.clone(),
        product_spec: product.specification.clone(),
        category: product.category.clone(),
        calibration_type: CalibrationType::Internal,
        quantity,
        unit_price: product.standard_price,
        discount_rate,
        total_amount: line_total(product.standard_price, quantity, discount_rate),
        status,
        create_date,
        target_date: Some(create_date + Duration::days(14)),
        technicians: technicians.iter().map(|s| s.to_string()).collect(),
        notes: None,
        is_archived: completed,
        restore_reason: None,
    }
}
