use serde::Serialize;

use construcard_core::UserId;

use crate::guard::{evaluate, AccessRequest, Denial, Outcome};
use crate::{Identity, PermissionModel, Role};

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of a guard decision.
///
/// Answers "why is this section hidden for me?" without changing the
/// decision itself: `granted` always agrees with [`evaluate`].
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub allowed_roles: Vec<Role>,
    pub required_permissions: Vec<String>,

    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// `None` for an anonymous caller.
    pub identity: Option<IdentityState>,

    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentityState {
    pub user_id: UserId,
    pub role: Role,
    pub effective_permissions: Vec<String>,
    pub has_wildcard: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    Unauthenticated,
    RoleNotAllowed,
    MissingPermission,
}

pub fn explain(identity: Option<&Identity>, request: &AccessRequest, model: &PermissionModel) -> AuthorizationExplanation {
    let outcome = evaluate(identity, request, model);

    let state = identity.map(|i| {
        let set = model.permissions_for(i.role);
        IdentityState {
            user_id: i.id.clone(),
            role: i.role,
            effective_permissions: set.iter().map(|p| p.as_str().to_string()).collect(),
            has_wildcard: set.has_wildcard(),
        }
    });

    let (reason, denial_reason) = match (&outcome, &state) {
        (Outcome::Allow, Some(state)) if state.has_wildcard => (
            format!("Role '{}' holds the wildcard permission '*'", state.role),
            None,
        ),
        (Outcome::Allow, Some(state)) => (
            format!("Role '{}' satisfies every constraint of the request", state.role),
            None,
        ),
        (Outcome::Allow, None) | (Outcome::DenyUnauthenticated, _) => (
            "No authenticated identity".to_string(),
            Some(DenialReason {
                kind: DenialKind::Unauthenticated,
                message: "Authentication is required".to_string(),
                suggestions: vec!["Log in with an account that can access this section".to_string()],
            }),
        ),
        (Outcome::DenyForbidden(denial @ Denial::Role { allowed }), _) => {
            let role = state.as_ref().map(|s| s.role.as_str()).unwrap_or("none");
            (
                format!("Role '{role}' is not allowed; {denial}"),
                Some(DenialReason {
                    kind: DenialKind::RoleNotAllowed,
                    message: denial.to_string(),
                    suggestions: allowed
                        .iter()
                        .map(|r| format!("Log in with a '{}' account", r))
                        .collect(),
                }),
            )
        }
        (Outcome::DenyForbidden(denial @ Denial::Permission { any_of }), _) => {
            let mut granting: Vec<Role> = any_of
                .iter()
                .flat_map(|p| model.roles_granting(p.as_str()))
                .collect();
            granting.sort();
            granting.dedup();

            let role = state.as_ref().map(|s| s.role.as_str()).unwrap_or("none");
            let names: Vec<&str> = granting.iter().map(|r| r.as_str()).collect();
            let mut suggestions = vec![format!("Any of these roles would grant access: {}", names.join(", "))];
            suggestions.push("Ask an administrator to extend the role-permission mapping".to_string());

            (
                format!("Role '{role}' holds none of the required permissions; {denial}"),
                Some(DenialReason {
                    kind: DenialKind::MissingPermission,
                    message: denial.to_string(),
                    suggestions,
                }),
            )
        }
    };

    AuthorizationExplanation {
        allowed_roles: request.allowed_roles().iter().copied().collect(),
        required_permissions: request
            .required_permissions()
            .iter()
            .map(|p| p.as_str().to_string())
            .collect(),
        granted: outcome.is_allowed(),
        reason,
        identity: state,
        denial_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity::from_parts("5", "x@construcard.ru", "X", role.as_str()).unwrap()
    }

    #[test]
    fn anonymous_explanation_is_unauthenticated() {
        let explanation = explain(None, &AccessRequest::authenticated(), &PermissionModel::standard());
        assert!(!explanation.granted);
        assert!(explanation.identity.is_none());
        assert_eq!(explanation.denial_reason.unwrap().kind, DenialKind::Unauthenticated);
    }

    #[test]
    fn wildcard_grant_is_called_out() {
        let request = AccessRequest::authenticated().permissions(["view_archive"]);
        let explanation = explain(Some(&identity(Role::Admin)), &request, &PermissionModel::standard());
        assert!(explanation.granted);
        assert!(explanation.reason.contains("wildcard"));
        assert!(explanation.identity.unwrap().has_wildcard);
    }

    #[test]
    fn missing_permission_suggests_granting_roles() {
        let request = AccessRequest::authenticated().permissions(["manage_geodesy"]);
        let explanation = explain(Some(&identity(Role::Supplier)), &request, &PermissionModel::standard());
        assert!(!explanation.granted);

        let denial = explanation.denial_reason.unwrap();
        assert_eq!(denial.kind, DenialKind::MissingPermission);
        assert!(denial.message.contains("manage_geodesy"));
        assert_eq!(denial.suggestions[0], "Any of these roles would grant access: admin, engineer");
    }

    #[test]
    fn explanation_agrees_with_evaluate() {
        let model = PermissionModel::standard();
        let request = AccessRequest::authenticated()
            .roles([Role::Admin, Role::Supervisor])
            .permissions(["manage_construction"]);
        for role in Role::ALL {
            let subject = identity(role);
            let explanation = explain(Some(&subject), &request, &model);
            assert_eq!(explanation.granted, evaluate(Some(&subject), &request, &model).is_allowed());
        }
    }
}
