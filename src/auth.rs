//! Gateway-delegated identity.
//!
//! Authentication happens at the API gateway; this service trusts the
//! identity headers the gateway injects (`x-user-id`, `x-user-name`,
//! `x-user-role`). Mutating handlers take a [`UserContext`] extractor, which
//! rejects requests that arrive without an identity.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Dentist,
    Staff,
}

impl Role {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "dentist" => Some(Role::Dentist),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

/// Identity of the user behind the current request, as asserted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub role: Role,
}

impl UserContext {
    /// Admin-only operations (deletes, voids) call this guard.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::ServiceError(crate::errors::ServiceError::Forbidden(
                "admin role required".to_string(),
            )))
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.user_id.to_string())
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or(ApiError::Unauthorized)?;

        let name = parts
            .headers
            .get(USER_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        // Unknown or missing roles degrade to staff, the least-privileged role.
        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Role::parse)
            .unwrap_or(Role::Staff);

        Ok(UserContext {
            user_id,
            name,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<UserContext, ApiError> {
        let (mut parts, _) = req.into_parts();
        UserContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn missing_identity_is_rejected() {
        let req = Request::builder().uri("/").body(()).unwrap();
        assert!(extract(req).await.is_err());
    }

    #[tokio::test]
    async fn gateway_headers_are_parsed() {
        let id = Uuid::new_v4();
        let req = Request::builder()
            .uri("/")
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_NAME_HEADER, "Dr. Reyes")
            .header(USER_ROLE_HEADER, "dentist")
            .body(())
            .unwrap();

        let ctx = extract(req).await.expect("identity expected");
        assert_eq!(ctx.user_id, id);
        assert_eq!(ctx.name.as_deref(), Some("Dr. Reyes"));
        assert_eq!(ctx.role, Role::Dentist);
    }

    #[tokio::test]
    async fn unknown_role_degrades_to_staff() {
        let req = Request::builder()
            .uri("/")
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(USER_ROLE_HEADER, "superuser")
            .body(())
            .unwrap();

        let ctx = extract(req).await.expect("identity expected");
        assert_eq!(ctx.role, Role::Staff);
        assert!(ctx.require_admin().is_err());
    }
}
