use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::AccessLevel;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthPrincipal;
use crate::models::CompanyId;

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessReport {
    pub company_id: Uuid,
    pub read: bool,
    pub manage: bool,
}

/// Inspection path: reports access without provisioning an identity.
#[utoipa::path(
    get,
    path = "/companies/{company_id}/access",
    tag = "Access",
    params(("company_id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Access the caller holds on the company", body = AccessReport),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn inspect_access(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(company_id): Path<Uuid>,
) -> AppResult<Json<AccessReport>> {
    let provider = state.provider.read_only();
    let company = Some(CompanyId::from(company_id));

    let read = state
        .engine
        .can_read_if_known(Some(&principal), Some(&provider), company)
        .await?;
    let manage = state
        .engine
        .can_manage_if_known(Some(&principal), Some(&provider), company)
        .await?;

    Ok(Json(AccessReport { company_id, read, manage }))
}

/// Action guard: provisions the caller's identity if needed, then answers
/// 204 when the level is granted and 403 otherwise.
#[utoipa::path(
    post,
    path = "/companies/{company_id}/access/{level}",
    tag = "Access",
    params(
        ("company_id" = Uuid, Path, description = "Company ID"),
        ("level" = String, Path, description = "read or manage"),
    ),
    responses(
        (status = 204, description = "Access granted"),
        (status = 400, description = "Unknown access level"),
        (status = 403, description = "Access denied"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn require_access(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path((company_id, level)): Path<(Uuid, String)>,
) -> AppResult<StatusCode> {
    let level: AccessLevel = level.parse()?;

    let allowed = state
        .engine
        .check(Some(&principal), Some(&state.provider), Some(CompanyId::from(company_id)), level)
        .await?;

    if !allowed {
        return Err(AppError::forbidden(format!(
            "{} access to company {} denied",
            level, company_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
