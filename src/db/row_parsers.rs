use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CompanyId, Identity, IdentityId, Membership, Role};

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // Try RFC3339 first (e.g. 2025-11-19T12:34:56Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite CURRENT_TIMESTAMP format, optional fractional seconds
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    if let Ok(naive_date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ndt = naive_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AppError::internal("invalid datetime: date out of range".to_string()))?;
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn parse_uuid(column: &str, s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s.trim()).map_err(|e| AppError::internal(format!("invalid uuid in {}: {}", column, e)))
}

pub fn db_identity_from_row(row: &SqliteRow) -> Result<Identity, AppError> {
    let id_s: String = row.try_get("id").map_err(|e| AppError::internal(format!("missing id: {}", e)))?;
    let actor_id_s: String = row.try_get("actor_id").map_err(|e| AppError::internal(format!("missing actor_id: {}", e)))?;
    let display_name: String = row.try_get("display_name").map_err(|e| AppError::internal(format!("missing display_name: {}", e)))?;
    let created_at_s: String = row.try_get("created_at").map_err(|e| AppError::internal(format!("missing created_at: {}", e)))?;

    let id = IdentityId::new(parse_uuid("id", &id_s)?);
    let actor_id = parse_uuid("actor_id", &actor_id_s)?;
    let created_at = parse_datetime(&created_at_s)?;

    Ok(Identity { id, actor_id, display_name, created_at })
}

/// Folds the role rows of one (company, identity) pair into a membership.
/// No rows means no membership.
pub fn db_membership_from_rows(
    company_id: CompanyId,
    identity_id: IdentityId,
    rows: &[SqliteRow],
) -> Result<Option<Membership>, AppError> {
    if rows.is_empty() {
        return Ok(None);
    }

    let roles = rows
        .iter()
        .map(|row| {
            let role_s: String = row.try_get("role").map_err(|e| AppError::internal(format!("missing role: {}", e)))?;
            role_s
                .parse::<Role>()
                .map_err(|_| AppError::internal(format!("unknown role stored: {}", role_s)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Membership::new(company_id, identity_id, roles).map(Some)
}
