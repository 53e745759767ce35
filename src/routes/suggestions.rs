use axum::extract::{Path, Query};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::authz::AccessLevel;
use crate::errors::{AppError, AppResult};
use crate::models::Role;
use crate::suggest::{enumerated_values, placeholder, Suggest};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestionQuery {
    /// Partial input typed so far.
    #[serde(default)]
    pub input: String,
}

fn suggester_for(kind: &str) -> Option<Box<dyn Suggest>> {
    match kind {
        "roles" => Some(Box::new(enumerated_values::<Role>("<role>"))),
        "access-levels" => Some(Box::new(enumerated_values::<AccessLevel>("<level>"))),
        "company" => Some(Box::new(placeholder("<company>"))),
        _ => None,
    }
}

/// Completion candidates. Pure: no identity or membership lookups.
#[utoipa::path(
    get,
    path = "/suggestions/{kind}",
    tag = "Suggestions",
    params(
        ("kind" = String, Path, description = "roles, access-levels or company"),
        SuggestionQuery,
    ),
    responses(
        (status = 200, description = "Completion candidates", body = [String]),
        (status = 404, description = "Unknown suggestion kind"),
    )
)]
pub async fn suggestions(
    Path(kind): Path<String>,
    Query(query): Query<SuggestionQuery>,
) -> AppResult<Json<Vec<String>>> {
    let suggester = suggester_for(&kind)
        .ok_or_else(|| AppError::not_found(format!("no suggestions for '{}'", kind)))?;

    Ok(Json(suggester.suggest(&query.input)))
}
