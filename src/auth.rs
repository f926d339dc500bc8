use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::config::{AppConfig, Env};

/// Role
///
/// The two authorization tiers. An admin may do everything a subadmin may.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Subadmin,
}

impl Role {
    /// Route prefix segment this role's clients call: `/api/{prefix}/private/...`.
    pub fn route_prefix(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Subadmin => "Subadmin",
        }
    }

    /// Whether a caller holding `self` may use routes gated on `required`.
    pub fn permits(&self, required: Role) -> bool {
        match required {
            Role::Admin => *self == Role::Admin,
            Role::Subadmin => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Subadmin => f.write_str("subadmin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "subadmin" => Ok(Role::Subadmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Claims
///
/// Payload of the bearer tokens issued by the identity provider. The role claim is
/// trusted as-is once the signature and expiry check out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity provider's user id.
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// 1. Local Bypass: in `Env::Local`, an `x-user-role` header stands in for a token.
/// 2. Token Extraction: `Authorization: Bearer <token>`.
/// 3. Validation: HS256 signature and expiry against `AppConfig::jwt_secret`.
///
/// Rejection: `StatusCode::UNAUTHORIZED` on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            if let Some(role) = parts
                .headers
                .get("x-user-role")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<Role>().ok())
            {
                let id = parts
                    .headers
                    .get("x-user-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("local-dev")
                    .to_string();
                return Ok(AuthUser { id, role });
            }
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                other => tracing::debug!("rejected token: {:?}", other),
            }
            StatusCode::UNAUTHORIZED
        })?;

        Ok(AuthUser {
            id: token_data.claims.sub,
            role: token_data.claims.role,
        })
    }
}

/// RoleGate
///
/// State of one role-gated route group: the config the `AuthUser` extractor needs and
/// the role the group requires.
#[derive(Clone)]
pub struct RoleGate {
    pub config: AppConfig,
    pub required: Role,
}

impl RoleGate {
    pub fn new(config: &AppConfig, required: Role) -> Self {
        Self {
            config: config.clone(),
            required,
        }
    }
}

impl FromRef<RoleGate> for AppConfig {
    fn from_ref(gate: &RoleGate) -> AppConfig {
        gate.config.clone()
    }
}

/// require_role
///
/// Route layer for `/api/{prefix}/private`. The identity is resolved first (401 when
/// absent or invalid), then checked against the group's role (403). The `AuthUser` is
/// handed to handlers through the request extensions.
pub async fn require_role(
    State(gate): State<RoleGate>,
    user: AuthUser,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !user.role.permits(gate.required) {
        tracing::warn!(user = %user.id, role = %user.role, required = %gate.required, "role check failed");
        return Err(StatusCode::FORBIDDEN);
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
