use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicHoliday {
    pub id: Uuid,
    pub holiday_date: NaiveDate,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHolidayInput {
    pub date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct HolidayYearQuery {
    pub year: Option<i32>,
}
