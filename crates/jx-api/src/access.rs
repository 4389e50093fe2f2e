//! Path-prefix access control. One table declares which roles may enter
//! each protected subtree; a middleware enforces it before any handler runs.
//! Handlers still apply per-resource ownership checks on top.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use jx_core::domain::Role;

use crate::SharedState;
use crate::auth::authorize_bearer;
use crate::error::ApiError;

struct ProtectedRoute {
    prefix: &'static str,
    roles: &'static [Role],
}

/// The longest matching prefix wins, so the narrow `/api/applications/mine`
/// rule beats the broader `/api/applications` one.
const PROTECTED_ROUTES: &[ProtectedRoute] = &[
    ProtectedRoute {
        prefix: "/api/admin",
        roles: &[Role::Admin],
    },
    ProtectedRoute {
        prefix: "/api/employer",
        roles: &[Role::Employer, Role::Admin],
    },
    ProtectedRoute {
        prefix: "/api/applications/mine",
        roles: &[Role::Applicant, Role::Admin],
    },
    ProtectedRoute {
        prefix: "/api/applications",
        roles: &[Role::Applicant, Role::Employer, Role::Admin],
    },
    ProtectedRoute {
        prefix: "/api/profile",
        roles: &[Role::Applicant, Role::Employer, Role::Admin],
    },
];

/// Prefixes match on path segments: `/api/admin` guards `/api/admin` and
/// `/api/admin/jobs` but not `/api/administrators`.
fn prefix_matches(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub(crate) fn required_roles(path: &str) -> Option<&'static [Role]> {
    PROTECTED_ROUTES
        .iter()
        .filter(|route| prefix_matches(path, route.prefix))
        .max_by_key(|route| route.prefix.len())
        .map(|route| route.roles)
}

pub(crate) async fn enforce_route_roles(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(allowed) = required_roles(req.uri().path()) {
        let user = authorize_bearer(req.headers(), &state.config.tokens)?;
        if let Err(err) = user.require_role(allowed) {
            warn!(
                user_id = user.user_id,
                role = %user.role,
                path = req.uri().path(),
                "denied by route access table"
            );
            return Err(err);
        }
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_tree_is_admin_only() {
        assert_eq!(required_roles("/api/admin/dashboard"), Some(&[Role::Admin][..]));
        assert_eq!(required_roles("/api/admin"), Some(&[Role::Admin][..]));
    }

    #[test]
    fn employer_tree_admits_admins_too() {
        let roles = required_roles("/api/employer/jobs").unwrap();
        assert!(roles.contains(&Role::Employer));
        assert!(roles.contains(&Role::Admin));
        assert!(!roles.contains(&Role::Applicant));
    }

    #[test]
    fn applications_mine_uses_the_narrow_rule() {
        let mine = required_roles("/api/applications/mine").unwrap();
        assert!(!mine.contains(&Role::Employer));

        let by_id = required_roles("/api/applications/7").unwrap();
        assert!(by_id.contains(&Role::Employer));
    }

    #[test]
    fn prefix_match_respects_segment_boundaries() {
        assert!(required_roles("/api/administrators").is_none());
        assert!(required_roles("/api/profiles").is_none());
        assert!(required_roles("/api/employers").is_none());
    }

    #[test]
    fn public_paths_are_untouched() {
        assert!(required_roles("/api/jobs").is_none());
        assert!(required_roles("/api/auth/login").is_none());
        assert!(required_roles("/livez").is_none());
    }
}
