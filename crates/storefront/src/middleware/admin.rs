//! Admin guard.
//!
//! Every `/admin/*` request reads the current user's role from `profile`
//! before the handler runs. Anonymous users, non-admins and failed role
//! lookups are all redirected to `/` with `303 See Other`. On success the
//! admin's [`CurrentUser`] is inserted into the request extensions.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{Span, warn};

use gubre_core::UserRole;

use crate::db::profiles::ProfileRepository;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Where non-admins are sent.
pub const ADMIN_REDIRECT: &str = "/";

/// Outcome of the admin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAccess {
    Granted,
    Denied,
}

/// Decide access from the session user and the looked-up role.
///
/// `role` is `None` when the profile is missing or the lookup failed.
#[must_use]
pub fn decide(user: Option<&CurrentUser>, role: Option<UserRole>) -> AdminAccess {
    match (user, role) {
        (Some(_), Some(role)) if role.is_admin() => AdminAccess::Granted,
        _ => AdminAccess::Denied,
    }
}

/// Middleware enforcing the admin role on everything it wraps.
pub async fn require_admin(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let user = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();

    let role = match &user {
        Some(user) => match ProfileRepository::new(state.pool()).get_role(user.id).await {
            Ok(role) => role,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Role lookup failed, denying admin access");
                None
            }
        },
        None => None,
    };

    match (decide(user.as_ref(), role), user) {
        (AdminAccess::Granted, Some(user)) => {
            Span::current().record("user_id", tracing::field::display(user.id));
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        _ => Redirect::to(ADMIN_REDIRECT).into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gubre_core::{Email, UserId};

    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::generate(),
            email: Email::parse("fermer@gubre.az").unwrap(),
        }
    }

    #[test]
    fn test_anonymous_is_denied() {
        assert_eq!(decide(None, None), AdminAccess::Denied);
        assert_eq!(decide(None, Some(UserRole::Admin)), AdminAccess::Denied);
    }

    #[test]
    fn test_regular_user_is_denied() {
        assert_eq!(decide(Some(&user()), Some(UserRole::User)), AdminAccess::Denied);
    }

    #[test]
    fn test_failed_lookup_is_denied() {
        assert_eq!(decide(Some(&user()), None), AdminAccess::Denied);
    }

    #[test]
    fn test_admin_is_granted() {
        assert_eq!(
            decide(Some(&user()), Some(UserRole::Admin)),
            AdminAccess::Granted
        );
    }
}
