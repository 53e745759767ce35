use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Principal, PrincipalKind};
use crate::errors::AppError;
use crate::models::ActorRef;

/// `sub` value identifying the non-interactive console principal.
pub const CONSOLE_SUBJECT: &str = "console";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_hours: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>, exp_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            exp_hours,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let exp_hours = std::env::var("JWT_EXP_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(24))
            .map_err(|_| AppError::configuration("JWT_EXP_HOURS must be a valid integer"))?;

        Ok(Self::new(secret.into_bytes(), exp_hours))
    }

    pub fn encode(&self, principal: &Principal) -> Result<String, AppError> {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let exp = now + Duration::hours(self.exp_hours);

        let (sub, name) = match &principal.kind {
            PrincipalKind::Player(actor) => (actor.id.to_string(), actor.label.clone()),
            PrincipalKind::Console => (CONSOLE_SUBJECT.to_string(), CONSOLE_SUBJECT.to_string()),
        };

        let mut caps: Vec<String> = principal.capabilities.iter().cloned().collect();
        caps.sort();

        let claims = Claims {
            sub,
            name,
            caps,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::token(err.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| AppError::token(err.to_string()))
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    /// Actor UUID, or `console`.
    pub sub: String,
    pub name: String,
    /// Capabilities granted by the front end.
    #[serde(default)]
    pub caps: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn into_principal(self) -> Result<Principal, AppError> {
        let principal = if self.sub == CONSOLE_SUBJECT {
            Principal::console()
        } else {
            let id = Uuid::parse_str(&self.sub)
                .map_err(|_| AppError::unauthorized("token subject is not an actor id"))?;
            Principal::player(ActorRef::new(id, self.name))
        };

        Ok(principal.with_capabilities(self.caps))
    }
}

/// Caller of the current request, rebuilt from its bearer token.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::unauthorized("Authorization header missing"))?;

        let claims = state.jwt.decode(token)?;

        Ok(AuthPrincipal(claims.into_principal()?))
    }
}
