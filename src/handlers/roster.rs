use actix_web::{
    HttpResponse,
    web::{Data, Json, Query},
};
use chrono::{Days, NaiveDate};
use serde::Deserialize;

use crate::config::Config;
use crate::database::models::{RosterDay, RosterEntry, RosterShiftInput};
use crate::database::repositories::{CompanyRepository, ShiftRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::handlers::shifts::resolve_shift;
use crate::services::{UserContext, time_math::round_hours};

const DAYS_PER_WEEK: u64 = 7;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterQuery {
    pub week_start: NaiveDate,
}

/// Seven consecutive days from `week_start`, each with the entries that
/// fall on it. Days without shifts are kept.
pub(crate) fn group_week(week_start: NaiveDate, entries: Vec<RosterEntry>) -> Vec<RosterDay> {
    let mut days: Vec<RosterDay> = week_start
        .iter_days()
        .take(DAYS_PER_WEEK as usize)
        .map(|date| RosterDay {
            date,
            shifts: Vec::new(),
            total_hours: 0.0,
        })
        .collect();

    for entry in entries {
        if let Some(day) = days.iter_mut().find(|d| d.date == entry.shift.shift_date) {
            day.shifts.push(entry);
        }
    }

    for day in &mut days {
        day.total_hours = round_hours(day.shifts.iter().map(|e| e.shift.hours()).sum());
    }

    days
}

pub async fn get_roster(
    query: Query<RosterQuery>,
    ctx: UserContext,
    shifts: Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let company_id = ctx.strict_company_id()?;
    let week_start = query.week_start;
    let week_end = week_start
        .checked_add_days(Days::new(DAYS_PER_WEEK - 1))
        .ok_or_else(|| AppError::BadRequest("weekStart is out of range".to_string()))?;

    let entries = shifts
        .find_for_company_in_range(company_id, week_start, week_end)
        .await
        .map_err(|e| {
            log::error!("Failed to load roster for company {}: {}", company_id, e);
            AppError::from(e)
        })?;

    Ok(ApiResponse::ok(group_week(week_start, entries)))
}

pub async fn assign_roster_shift(
    input: Json<RosterShiftInput>,
    ctx: UserContext,
    config: Data<Config>,
    companies: Data<CompanyRepository>,
    shifts: Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_manager()?;
    let company_id = ctx.strict_company_id()?;
    let input = input.into_inner();

    if companies
        .member_role(input.user_id, company_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(
            "Employee not found in this company".to_string(),
        ));
    }

    let new_shift = resolve_shift(
        input.shift,
        input.user_id,
        Some(company_id),
        ctx.user_id(),
        true,
        config.night_shift_cutoff,
    );

    let shift = shifts.create_shift(&new_shift).await.map_err(|e| {
        log::error!("Failed to assign roster shift: {}", e);
        AppError::from(e)
    })?;

    log::info!(
        "Manager {} rostered shift {} for user {}",
        ctx.user_id(),
        shift.id,
        input.user_id
    );

    Ok(ApiResponse::created(shift))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Shift, ShiftStatus, ShiftType};
    use chrono::{NaiveTime, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn entry(date: NaiveDate, start: (u32, u32), end: (u32, u32)) -> RosterEntry {
        let user_id = Uuid::new_v4();
        let shift = Shift {
            id: Uuid::new_v4(),
            user_id,
            company_id: Some(Uuid::new_v4()),
            shift_date: date,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            shift_type: ShiftType::Custom,
            status: ShiftStatus::Scheduled,
            roster_assigned: true,
            created_by: user_id,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        RosterEntry {
            hours: round_hours(shift.hours()),
            shift,
            employee_name: "Sam".to_string(),
        }
    }

    #[test]
    fn week_has_seven_days_including_empty_ones() {
        let monday = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();

        let days = group_week(
            monday,
            vec![
                entry(wednesday, (9, 0), (17, 0)),
                entry(wednesday, (22, 0), (2, 30)),
            ],
        );

        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, monday);
        assert_eq!(days[6].date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert!(days[0].shifts.is_empty());
        assert_eq!(days[2].shifts.len(), 2);
        assert_eq!(days[2].total_hours, 12.5);
    }

    #[test]
    fn entries_outside_the_week_are_dropped() {
        let monday = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let next_monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let days = group_week(monday, vec![entry(next_monday, (9, 0), (17, 0))]);

        assert!(days.iter().all(|d| d.shifts.is_empty()));
    }
}
