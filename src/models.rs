//! Payload types for the HostPilot API resources shown on the dashboard
//!
//! The API speaks camelCase JSON and omits fields freely, so every struct
//! defaults missing fields instead of failing to decode.

use serde::{Deserialize, Serialize};

/// Resource path for the portfolio summary
pub const DASHBOARD_STATS_PATH: &str = "/api/dashboard/stats";
/// Resource path for the property list
pub const PROPERTIES_PATH: &str = "/api/properties";
/// Resource path for the booking list
pub const BOOKINGS_PATH: &str = "/api/bookings";
/// Resource path for the task list
pub const TASKS_PATH: &str = "/api/tasks";

/// Portfolio summary numbers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_properties: u32,
    pub active_bookings: u32,
    pub pending_tasks: u32,
    /// Revenue for the current month
    pub monthly_revenue: f64,
    /// Occupancy as a percentage (0-100)
    pub occupancy_rate: f64,
}

/// A managed property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub bedrooms: Option<u32>,
    pub status: Option<String>,
}

/// A guest booking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Booking {
    pub id: i64,
    pub property_id: Option<i64>,
    pub guest_name: String,
    /// ISO date as sent by the API
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub status: Option<String>,
    pub total_amount: Option<f64>,
}

/// A staff task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub property_id: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}
