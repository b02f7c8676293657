//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in user in route handlers.

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires an authenticated user.
///
/// API requests (`/api/*`) are rejected with a JSON 401; anything else is
/// redirected to the front page, where the client shows its login form.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Salam, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
#[derive(Debug, Clone, Copy)]
pub enum AuthRejection {
    /// Redirect to the front page (for browser navigation).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Zəhmət olmasa daxil olun" })),
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped path; decide on the path the client sent.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |original| original.0.path());
        let rejection = if path.starts_with("/api/") {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        };

        // Admin routes get the user from the admin guard.
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(Self(user.clone()));
        }

        let session = parts.extensions.get::<Session>().ok_or(rejection)?;

        session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .map(Self)
            .ok_or(rejection)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the user is not logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// The session user, if any.
pub async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Helper to set the current user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the session entirely (logout, account deletion).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{Request, header::LOCATION};

    async fn reject(path: &str) -> Response {
        let (mut parts, ()) = Request::builder().uri(path).body(()).unwrap().into_parts();
        match RequireAuth::from_request_parts(&mut parts, &()).await {
            Ok(_) => panic!("anonymous request was accepted"),
            Err(rejection) => rejection.into_response(),
        }
    }

    #[tokio::test]
    async fn test_api_request_without_session_is_unauthorized() {
        let response = reject("/api/cart").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_nested_api_request_uses_original_path() {
        // Inside `.nest("/api", ..)` the request uri is stripped to "/".
        let (mut parts, ()) = Request::builder().uri("/").body(()).unwrap().into_parts();
        parts
            .extensions
            .insert(OriginalUri("/api/cart".parse().unwrap()));

        let response = match RequireAuth::from_request_parts(&mut parts, &()).await {
            Ok(_) => panic!("anonymous request was accepted"),
            Err(rejection) => rejection.into_response(),
        };
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_page_request_without_session_redirects_home() {
        let response = reject("/orders").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/");
    }

    #[tokio::test]
    async fn test_guard_supplied_user_is_accepted() {
        let user = CurrentUser {
            id: gubre_core::UserId::generate(),
            email: gubre_core::Email::parse("admin@gubre.az").unwrap(),
        };
        let (mut parts, ()) = Request::builder()
            .uri("/admin/users")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(user.clone());

        let RequireAuth(found) = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap_or_else(|_| panic!("guard user was rejected"));
        assert_eq!(found, user);
    }
}
