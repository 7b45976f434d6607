use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;
use crate::services::time_math::{self, hhmm};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub shift_type: ShiftType,
    pub status: ShiftStatus,
    /// Set when a manager placed this shift on the roster
    pub roster_assigned: bool,
    pub created_by: Uuid,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    pub fn duration_minutes(&self) -> i64 {
        time_math::shift_duration_minutes(self.start_time, self.end_time)
    }

    pub fn hours(&self) -> f64 {
        time_math::shift_hours(self.start_time, self.end_time)
    }

    pub fn is_overnight(&self) -> bool {
        self.end_time < self.start_time
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "lowercase")]
    pub enum ShiftType {
        Morning => "morning",
        Evening => "evening",
        Night => "night",
        Double => "double",
        Custom => "custom",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum ShiftStatus {
        #[default]
        Scheduled => "scheduled",
        Completed => "completed",
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl ShiftStatus {
    /// Statuses only a manager may set.
    pub fn requires_manager(&self) -> bool {
        matches!(self, ShiftStatus::Approved | ShiftStatus::Rejected)
    }

    /// Rejected shifts are never paid or billed.
    pub fn is_payable(&self) -> bool {
        !matches!(self, ShiftStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftInput {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub shift_type: Option<ShiftType>,
    pub status: Option<ShiftStatus>,
    pub notes: Option<String>,
}

/// A shift a manager places on an employee's roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterShiftInput {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub shift: ShiftInput,
}

/// Fully resolved values written to the shifts table.
#[derive(Debug, Clone)]
pub struct NewShift {
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub shift_type: ShiftType,
    pub status: ShiftStatus,
    pub roster_assigned: bool,
    pub created_by: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShiftStatusInput {
    pub status: ShiftStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(flatten)]
    pub shift: Shift,
    pub employee_name: String,
    pub hours: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterDay {
    pub date: NaiveDate,
    pub shifts: Vec<RosterEntry>,
    pub total_hours: f64,
}
