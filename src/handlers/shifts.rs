use actix_web::{
    HttpResponse,
    web::{Data, Json, Path, Query},
};
use chrono::NaiveTime;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{
    NewShift, Shift, ShiftInput, ShiftRangeQuery, ShiftStatus, UpdateShiftStatusInput,
};
use crate::database::repositories::ShiftRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{UserContext, day_type::suggest_shift_type, time_math::validate_date_range};

/// Turns request input into the row to write. The shift type falls back to
/// a suggestion from the start time.
pub(crate) fn resolve_shift(
    input: ShiftInput,
    user_id: Uuid,
    company_id: Option<Uuid>,
    created_by: Uuid,
    roster_assigned: bool,
    night_cutoff: NaiveTime,
) -> NewShift {
    NewShift {
        user_id,
        company_id,
        shift_date: input.date,
        start_time: input.start_time,
        end_time: input.end_time,
        shift_type: input
            .shift_type
            .unwrap_or_else(|| suggest_shift_type(input.start_time, night_cutoff)),
        status: input.status.unwrap_or_default(),
        roster_assigned,
        created_by,
        notes: input.notes,
    }
}

fn is_company_manager(ctx: &UserContext, shift: &Shift) -> bool {
    ctx.is_manager_or_admin() && shift.company_id.is_some() && shift.company_id == ctx.company_id()
}

/// Owners see their shifts; managers see every shift of their company.
/// Anything else is reported as missing.
pub(crate) fn ensure_can_view(ctx: &UserContext, shift: &Shift) -> Result<(), AppError> {
    if shift.user_id == ctx.user_id() || is_company_manager(ctx, shift) {
        Ok(())
    } else {
        Err(AppError::NotFound("Shift not found".to_string()))
    }
}

/// Roster shifts belong to the manager who placed them.
pub(crate) fn ensure_can_modify(ctx: &UserContext, shift: &Shift) -> Result<(), AppError> {
    ensure_can_view(ctx, shift)?;
    if is_company_manager(ctx, shift) {
        return Ok(());
    }
    if shift.roster_assigned {
        return Err(AppError::Forbidden(
            "Roster shifts can only be changed by a manager".to_string(),
        ));
    }
    Ok(())
}

fn ensure_status_allowed(ctx: &UserContext, status: ShiftStatus) -> Result<(), AppError> {
    if status.requires_manager() && !ctx.is_manager_or_admin() {
        return Err(AppError::Forbidden(format!(
            "Only managers can mark a shift as {}",
            status
        )));
    }
    Ok(())
}

async fn load_shift(shifts: &ShiftRepository, id: Uuid) -> Result<Shift, AppError> {
    shifts
        .find_by_id(id)
        .await
        .map_err(|e| {
            log::error!("Failed to load shift {}: {}", id, e);
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))
}

pub async fn create_shift(
    input: Json<ShiftInput>,
    ctx: UserContext,
    config: Data<Config>,
    shifts: Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let input = input.into_inner();
    if let Some(status) = input.status {
        ensure_status_allowed(&ctx, status)?;
    }

    let user_id = ctx.user_id();
    let new_shift = resolve_shift(
        input,
        user_id,
        ctx.company_id(),
        user_id,
        false,
        config.night_shift_cutoff,
    );

    let shift = shifts.create_shift(&new_shift).await.map_err(|e| {
        log::error!("Failed to create shift for user {}: {}", user_id, e);
        AppError::from(e)
    })?;

    log::info!("User {} created shift {}", user_id, shift.id);

    Ok(ApiResponse::created(shift))
}

pub async fn get_shifts(
    query: Query<ShiftRangeQuery>,
    ctx: UserContext,
    shifts: Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        validate_date_range(start, end)?;
    }

    let user_id = ctx.user_id();
    let shifts = shifts
        .find_for_user(user_id, None, query.start_date, query.end_date)
        .await
        .map_err(|e| {
            log::error!("Failed to get shifts for user {}: {}", user_id, e);
            AppError::from(e)
        })?;

    Ok(ApiResponse::ok(shifts))
}

pub async fn get_shift(
    path: Path<Uuid>,
    ctx: UserContext,
    shifts: Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let shift = load_shift(&shifts, path.into_inner()).await?;
    ensure_can_view(&ctx, &shift)?;

    Ok(ApiResponse::ok(shift))
}

pub async fn update_shift(
    path: Path<Uuid>,
    input: Json<ShiftInput>,
    ctx: UserContext,
    config: Data<Config>,
    shifts: Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let shift_id = path.into_inner();
    let existing = load_shift(&shifts, shift_id).await?;
    ensure_can_modify(&ctx, &existing)?;

    let mut input = input.into_inner();
    match input.status {
        Some(status) if status != existing.status => ensure_status_allowed(&ctx, status)?,
        Some(_) => {}
        None => input.status = Some(existing.status),
    }

    let new_shift = resolve_shift(
        input,
        existing.user_id,
        existing.company_id,
        existing.created_by,
        existing.roster_assigned,
        config.night_shift_cutoff,
    );

    let shift = shifts
        .update_shift(shift_id, &new_shift)
        .await?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    log::info!("User {} updated shift {}", ctx.user_id(), shift_id);

    Ok(ApiResponse::ok(shift))
}

pub async fn update_shift_status(
    path: Path<Uuid>,
    input: Json<UpdateShiftStatusInput>,
    ctx: UserContext,
    shifts: Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let shift_id = path.into_inner();
    let existing = load_shift(&shifts, shift_id).await?;
    ensure_can_modify(&ctx, &existing)?;
    ensure_status_allowed(&ctx, input.status)?;

    let shift = shifts
        .update_status(shift_id, input.status)
        .await?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    log::info!(
        "User {} set shift {} to {}",
        ctx.user_id(),
        shift_id,
        input.status
    );

    Ok(ApiResponse::ok(shift))
}

pub async fn delete_shift(
    path: Path<Uuid>,
    ctx: UserContext,
    shifts: Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    let shift_id = path.into_inner();
    let existing = load_shift(&shifts, shift_id).await?;
    ensure_can_modify(&ctx, &existing)?;

    if !shifts.delete_shift(shift_id).await? {
        return Err(AppError::NotFound("Shift not found".to_string()));
    }

    log::info!("User {} deleted shift {}", ctx.user_id(), shift_id);

    Ok(ApiResponse::<()>::message("Shift deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CompanyInfo, CompanyRole, ShiftType, User};
    use actix_web::{ResponseError, http::StatusCode};
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn context(role: CompanyRole, company_id: Uuid) -> UserContext {
        UserContext {
            user: User::new("a@example.com".to_string(), "x".to_string(), "A".to_string()),
            company: Some(CompanyInfo {
                id: company_id,
                name: "Acme".to_string(),
                email: None,
                phone: None,
                timezone: "UTC".to_string(),
                role,
                is_primary: true,
                hire_date: None,
            }),
        }
    }

    fn shift_for(user_id: Uuid, company_id: Option<Uuid>, roster_assigned: bool) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            user_id,
            company_id,
            shift_date: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            start_time: t(9, 0),
            end_time: t(17, 0),
            shift_type: ShiftType::Morning,
            status: ShiftStatus::Scheduled,
            roster_assigned,
            created_by: user_id,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input(start: NaiveTime, shift_type: Option<ShiftType>) -> ShiftInput {
        ShiftInput {
            date: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            start_time: start,
            end_time: t(23, 0),
            shift_type,
            status: None,
            notes: None,
        }
    }

    #[test]
    fn shift_type_is_suggested_from_start_time() {
        let user = Uuid::new_v4();
        let resolved = resolve_shift(input(t(19, 0), None), user, None, user, false, t(18, 0));
        assert_eq!(resolved.shift_type, ShiftType::Night);
        assert_eq!(resolved.status, ShiftStatus::Scheduled);

        let explicit = resolve_shift(
            input(t(19, 0), Some(ShiftType::Custom)),
            user,
            None,
            user,
            false,
            t(18, 0),
        );
        assert_eq!(explicit.shift_type, ShiftType::Custom);
    }

    #[test]
    fn owners_may_change_their_own_shifts() {
        let company = Uuid::new_v4();
        let ctx = context(CompanyRole::Employee, company);
        let shift = shift_for(ctx.user_id(), Some(company), false);
        assert!(ensure_can_modify(&ctx, &shift).is_ok());
    }

    #[test]
    fn roster_shifts_are_manager_only() {
        let company = Uuid::new_v4();
        let ctx = context(CompanyRole::Employee, company);
        let shift = shift_for(ctx.user_id(), Some(company), true);
        assert!(ensure_can_view(&ctx, &shift).is_ok());
        let err = ensure_can_modify(&ctx, &shift).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let manager = context(CompanyRole::Manager, company);
        assert!(ensure_can_modify(&manager, &shift).is_ok());
    }

    #[test]
    fn other_peoples_shifts_look_missing() {
        let company = Uuid::new_v4();
        let ctx = context(CompanyRole::Employee, company);
        let shift = shift_for(Uuid::new_v4(), Some(company), false);
        let err = ensure_can_view(&ctx, &shift).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        // Managers of another company are outsiders too
        let manager = context(CompanyRole::Manager, Uuid::new_v4());
        assert!(ensure_can_view(&manager, &shift).is_err());
    }

    #[test]
    fn approval_requires_a_manager() {
        let ctx = context(CompanyRole::Employee, Uuid::new_v4());
        assert!(ensure_status_allowed(&ctx, ShiftStatus::Completed).is_ok());
        assert!(ensure_status_allowed(&ctx, ShiftStatus::Approved).is_err());

        let manager = context(CompanyRole::Manager, Uuid::new_v4());
        assert!(ensure_status_allowed(&manager, ShiftStatus::Rejected).is_ok());
    }
}
