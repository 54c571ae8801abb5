use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use uuid::Uuid;

use crate::auth::jwt::validate_token;
use crate::errors::AppError;
use crate::models::user::Role;
use crate::state::AppState;

/// Caller identity taken from an `Authorization: Bearer <token>` header.
/// Adding it to a handler's arguments makes the route require a session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user_id,
                email = %self.email,
                role = %self.role,
                required = %role,
                "role check failed"
            );
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let claims = validate_token(token, &state.jwt).map_err(|e| {
            tracing::debug!("rejected session token: {e}");
            AppError::Unauthorized
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "recruiter@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_role_accepts_matching_role() {
        assert!(user(Role::Employer).require_role(Role::Employer).is_ok());
        assert!(user(Role::JobSeeker).require_role(Role::JobSeeker).is_ok());
    }

    #[test]
    fn test_require_role_forbids_other_roles() {
        assert!(matches!(
            user(Role::JobSeeker).require_role(Role::Employer),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            user(Role::Employer).require_role(Role::JobSeeker),
            Err(AppError::Forbidden)
        ));
    }
}
