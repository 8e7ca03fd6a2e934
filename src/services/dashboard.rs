use std::collections::HashMap;
use std::sync::Arc;

use chrono::Datelike;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::TableConfig,
    models::{CalibrationStatus, OrderLine},
    store::DataStore,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyRevenue {
    /// Calendar month, 1 through 12.
    pub month: u32,
    pub revenue: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TechnicianRevenue {
    pub technician: String,
    pub revenue: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardReport {
    pub total_revenue: i64,
    pub active_count: u64,
    pub completed_count: u64,
    pub pending_amount: i64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub status_distribution: Vec<StatusCount>,
    pub technician_revenue: Vec<TechnicianRevenue>,
    pub available_years: Vec<i32>,
}

pub const UNASSIGNED_BUCKET: &str = "Unassigned";

/// Aggregates recomputed in full from the line list on every request.
pub fn compute_report(lines: &[OrderLine], year_filter: Option<i32>) -> DashboardReport {
    let available_years = available_years(lines);

    let filtered: Vec<&OrderLine> = lines
        .iter()
        .filter(|line| year_filter.map_or(true, |y| line.create_date.year() == y))
        .collect();

    let mut total_revenue = 0i64;
    let mut active_count = 0u64;
    let mut completed_count = 0u64;
    let mut pending_amount = 0i64;
    let mut monthly = [0i64; 12];
    let mut status_counts: HashMap<CalibrationStatus, u64> = HashMap::new();
    let mut per_technician: HashMap<String, i64> = HashMap::new();

    for line in &filtered {
        total_revenue += line.total_amount;
        if line.status == CalibrationStatus::Completed {
            completed_count += 1;
        } else {
            active_count += 1;
            pending_amount += line.total_amount;
        }

        let month = line.create_date.month() as usize;
        monthly[month - 1] += line.total_amount;

        *status_counts.entry(line.status).or_default() += 1;

        if line.technicians.is_empty() {
            *per_technician.entry(UNASSIGNED_BUCKET.to_string()).or_default() +=
                line.total_amount;
        } else {
            for tech in &line.technicians {
                *per_technician.entry(tech.clone()).or_default() += line.total_amount;
            }
        }
    }

    let monthly_revenue = monthly
        .iter()
        .enumerate()
        .map(|(i, revenue)| MonthlyRevenue {
            month: i as u32 + 1,
            revenue: *revenue,
        })
        .collect();

    let mut status_distribution: Vec<StatusCount> = status_counts
        .into_iter()
        .map(|(status, count)| StatusCount {
            status: status.as_str().to_string(),
            count,
        })
        .collect();
    status_distribution.sort_by(|a, b| a.status.cmp(&b.status));

    let mut technician_revenue: Vec<TechnicianRevenue> = per_technician
        .into_iter()
        .map(|(technician, revenue)| TechnicianRevenue {
            technician,
            revenue,
        })
        .collect();
    technician_revenue.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.technician.cmp(&b.technician)));

    DashboardReport {
        total_revenue,
        active_count,
        completed_count,
        pending_amount,
        monthly_revenue,
        status_distribution,
        technician_revenue,
        available_years,
    }
}

/// Distinct creation years across all lines, newest first.
pub fn available_years(lines: &[OrderLine]) -> Vec<i32> {
    let mut years: Vec<i32> = lines.iter().map(|l| l.create_date.year()).collect();
    years.sort_unstable();
    years.dedup();
    years.reverse();
    years
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<DataStore>,
    tables: TableConfig,
}

impl DashboardService {
    pub fn new(store: Arc<DataStore>, tables: TableConfig) -> Self {
        Self { store, tables }
    }

    pub async fn report(&self, year_filter: Option<i32>) -> DashboardReport {
        let lines: Vec<OrderLine> = self
            .store
            .fetch_all(&self.tables.orders, "create_date", false)
            .await
            .iter()
            .map(OrderLine::from_row)
            .collect();
        compute_report(&lines, year_filter)
    }
}
