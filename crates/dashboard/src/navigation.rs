//! Sidebar navigation, filtered through the access guard.

use serde::Serialize;

use construcard_auth::{AccessRequest, Guard, Role, SessionManager};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    /// Stable key used on the command line.
    pub key: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub roles: &'static [Role],
    pub permissions: &'static [&'static str],
}

impl NavItem {
    pub fn access_request(&self) -> AccessRequest {
        AccessRequest::authenticated()
            .roles(self.roles.iter().copied())
            .permissions(self.permissions.iter().copied())
    }
}

pub const NAV_ITEMS: &[NavItem] = &[
    NavItem {
        key: "construction",
        name: "Construction works",
        icon: "Hammer",
        roles: &[Role::Admin, Role::Supervisor],
        permissions: &["manage_construction"],
    },
    NavItem {
        key: "geodesy",
        name: "Geodesy",
        icon: "MapPin",
        roles: &[Role::Admin, Role::Engineer],
        permissions: &["manage_geodesy"],
    },
    NavItem {
        key: "archive",
        name: "Archive",
        icon: "Archive",
        roles: &[Role::Admin],
        permissions: &["view_archive"],
    },
    NavItem {
        key: "control",
        name: "Construction control",
        icon: "Shield",
        roles: &[Role::Admin, Role::Supervisor],
        permissions: &["view_control"],
    },
    NavItem {
        key: "warehouse",
        name: "Warehouse",
        icon: "Package",
        roles: &[Role::Admin, Role::Supplier],
        permissions: &["view_inventory"],
    },
    NavItem {
        key: "pto",
        name: "PTO",
        icon: "FileText",
        roles: &[Role::Admin, Role::Engineer],
        permissions: &["view_pto"],
    },
];

pub fn find(key: &str) -> Option<&'static NavItem> {
    NAV_ITEMS.iter().find(|item| item.key == key)
}

/// Items the current session may see. Denied items render nothing.
pub fn visible_items(session: &SessionManager) -> Vec<&'static NavItem> {
    NAV_ITEMS
        .iter()
        .filter_map(|item| {
            Guard::new(session, item.access_request())
                .render_or(|| Some(item), || None)
                .into_view()
                .flatten()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use construcard_auth::DEMO_PASSWORD;

    fn keys(items: &[&NavItem]) -> Vec<&'static str> {
        items.iter().map(|i| i.key).collect()
    }

    async fn logged_in(email: &str) -> SessionManager {
        let session = SessionManager::in_memory();
        session.restore();
        assert!(session.login(email, DEMO_PASSWORD).await);
        session
    }

    #[test]
    fn anonymous_sees_nothing() {
        let session = SessionManager::in_memory();
        session.restore();
        assert!(visible_items(&session).is_empty());
    }

    #[tokio::test]
    async fn admin_sees_everything() {
        let session = logged_in("admin@construcard.ru").await;
        assert_eq!(visible_items(&session).len(), NAV_ITEMS.len());
    }

    #[tokio::test]
    async fn supervisor_lacks_control_permission() {
        let session = logged_in("supervisor@construcard.ru").await;
        assert_eq!(keys(&visible_items(&session)), vec!["construction"]);
    }

    #[tokio::test]
    async fn engineer_and_supplier_sections() {
        let engineer = logged_in("engineer@construcard.ru").await;
        assert_eq!(keys(&visible_items(&engineer)), vec!["geodesy", "pto"]);

        let supplier = logged_in("supplier@construcard.ru").await;
        assert_eq!(keys(&visible_items(&supplier)), vec!["warehouse"]);
    }

    #[test]
    fn keys_are_unique() {
        for item in NAV_ITEMS {
            assert_eq!(NAV_ITEMS.iter().filter(|i| i.key == item.key).count(), 1);
        }
        assert_eq!(find("pto").map(|i| i.name), Some("PTO"));
        assert!(find("payroll").is_none());
    }
}
