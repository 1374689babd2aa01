//! Session lifecycle across restarts, persistence failures and overlapping logins.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;

use construcard_auth::{
    AccessRequest, CredentialError, CredentialStore, FileSessionStore, Guard, Identity, InMemorySessionStore,
    MockCredentialStore, Notice, Outcome, Rendered, Role, SessionConfig, SessionManager, SessionRecord,
    SessionStore, StoreError, DEFAULT_STORAGE_KEY, DEMO_PASSWORD,
};

fn manager_with_store(store: Arc<dyn SessionStore>) -> SessionManager {
    SessionManager::new(SessionConfig::default(), Arc::new(MockCredentialStore::demo()), store)
}

fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("construcard-it-{name}-{}", uuid::Uuid::now_v7()))
}

/// Demo accounts with a per-email verification delay.
struct DelayedCredentials {
    inner: MockCredentialStore,
    delays: HashMap<&'static str, Duration>,
}

#[async_trait]
impl CredentialStore for DelayedCredentials {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Identity>, CredentialError> {
        if let Some(delay) = self.delays.get(email) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.verify(email, password).await
    }
}

struct UnreachableCredentials;

#[async_trait]
impl CredentialStore for UnreachableCredentials {
    async fn verify(&self, _email: &str, _password: &str) -> Result<Option<Identity>, CredentialError> {
        Err(CredentialError::Unavailable("connection refused".to_string()))
    }
}

/// Demo accounts that record whether the manager reported loading while a
/// verification was running.
#[derive(Default)]
struct LoadingWitness {
    loading: OnceLock<tokio::sync::watch::Receiver<bool>>,
    checks: AtomicUsize,
    not_loading: AtomicUsize,
}

#[async_trait]
impl CredentialStore for LoadingWitness {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Identity>, CredentialError> {
        for _ in 0..4 {
            tokio::task::yield_now().await;
            if let Some(loading) = self.loading.get() {
                self.checks.fetch_add(1, Ordering::Relaxed);
                if !*loading.borrow() {
                    self.not_loading.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        MockCredentialStore::demo().verify(email, password).await
    }
}

/// Store whose writes always fail.
struct ReadOnlyStore;

impl SessionStore for ReadOnlyStore {
    fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn save(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only")))
    }

    fn clear(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only")))
    }
}

#[tokio::test]
async fn login_survives_restart() {
    let dir = scratch_dir("restart");
    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&dir));

    let first = manager_with_store(store.clone());
    first.restore();
    assert!(first.login("engineer@construcard.ru", DEMO_PASSWORD).await);
    let logged_in = first.current().unwrap();
    drop(first);

    let second = manager_with_store(store.clone());
    assert_eq!(second.current(), None);
    second.restore();
    assert_eq!(second.current(), Some(logged_in));
    assert!(second.has_permission("view_pto"));

    second.logout();
    assert_eq!(store.load(DEFAULT_STORAGE_KEY).unwrap(), None);

    let third = manager_with_store(store);
    third.restore();
    assert_eq!(third.current(), None);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn corrupt_records_are_discarded_on_restore() {
    let corrupt = [
        "{{{",
        "",
        r#"{"id":"1","email":"admin@construcard.ru","name":"A","role":"owner"}"#,
        r#"{"version":99,"session_id":"00000000-0000-0000-0000-000000000000","user":{}}"#,
    ];

    for raw in corrupt {
        let store = Arc::new(InMemorySessionStore::new().with_slot(DEFAULT_STORAGE_KEY, raw));
        let manager = manager_with_store(store.clone());
        manager.restore();

        assert_eq!(manager.current(), None, "record {raw:?} should not restore");
        assert!(!manager.is_loading());
        assert_eq!(store.load(DEFAULT_STORAGE_KEY).unwrap(), None, "record {raw:?} should be removed");
    }
}

#[test]
fn legacy_bare_identity_restores() {
    let raw = r#"{"id":"4","email":"supplier@construcard.ru","name":"Olga Kozlova","role":"supplier","department":"Procurement","phone":"+7 (999) 456-78-90"}"#;
    let store = Arc::new(InMemorySessionStore::new().with_slot(DEFAULT_STORAGE_KEY, raw));
    let manager = manager_with_store(store);
    manager.restore();

    assert_eq!(manager.current_role(), Some(Role::Supplier));
    assert!(manager.has_permission("view_warehouse"));
}

#[test]
fn expired_record_is_discarded() {
    let identity = Identity::from_parts("1", "admin@construcard.ru", "Alexander Petrov", "admin").unwrap();
    let saved_at = chrono::Utc::now() - chrono::Duration::days(2);
    let record = SessionRecord::new(identity, saved_at, Some(chrono::Duration::days(1)));

    let store = Arc::new(InMemorySessionStore::new().with_slot(DEFAULT_STORAGE_KEY, record.encode().unwrap()));
    let manager = manager_with_store(store.clone());
    manager.restore();

    assert_eq!(manager.current(), None);
    assert_eq!(store.load(DEFAULT_STORAGE_KEY).unwrap(), None);
}

#[tokio::test]
async fn configured_ttl_is_written_to_the_record() {
    let store = Arc::new(InMemorySessionStore::new());
    let config = SessionConfig {
        session_ttl: Some(Duration::from_secs(3600)),
        ..SessionConfig::default()
    };
    let manager = SessionManager::new(config, Arc::new(MockCredentialStore::demo()), store.clone());
    manager.restore();
    assert!(manager.login("admin@construcard.ru", DEMO_PASSWORD).await);

    let raw = store.load(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let record = SessionRecord::decode(&raw).unwrap();
    let saved_at = record.saved_at.unwrap();
    assert_eq!(record.expires_at, Some(saved_at + chrono::Duration::hours(1)));
}

#[tokio::test]
async fn oversized_ttl_logs_in_without_expiry() {
    let store = Arc::new(InMemorySessionStore::new());
    let config = SessionConfig {
        session_ttl: Some(Duration::from_secs(10_000_000_000_000)),
        ..SessionConfig::default()
    };
    let manager = SessionManager::new(config, Arc::new(MockCredentialStore::demo()), store.clone());
    manager.restore();
    assert!(manager.login("admin@construcard.ru", DEMO_PASSWORD).await);
    assert_eq!(manager.current_role(), Some(Role::Admin));

    let raw = store.load(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let record = SessionRecord::decode(&raw).unwrap();
    assert_eq!(record.expires_at, None);

    let restarted = SessionManager::new(SessionConfig::default(), Arc::new(MockCredentialStore::demo()), store);
    restarted.restore();
    assert_eq!(restarted.current_role(), Some(Role::Admin));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn loading_holds_while_any_concurrent_login_runs() {
    let credentials = Arc::new(LoadingWitness::default());
    let manager = Arc::new(SessionManager::new(
        SessionConfig::default(),
        credentials.clone(),
        Arc::new(InMemorySessionStore::new()),
    ));
    manager.restore();
    assert!(credentials.loading.set(manager.loading_changes()).is_ok());

    let logins: Vec<_> = (0..64)
        .map(|i| {
            let manager = manager.clone();
            let email = if i % 2 == 0 { "admin@construcard.ru" } else { "supplier@construcard.ru" };
            tokio::spawn(async move { manager.login(email, DEMO_PASSWORD).await })
        })
        .collect();
    for login in logins {
        assert!(login.await.unwrap());
    }

    assert!(credentials.checks.load(Ordering::Relaxed) > 0);
    assert_eq!(credentials.not_loading.load(Ordering::Relaxed), 0);
    assert!(!manager.is_loading());
}

#[tokio::test(start_paused = true)]
async fn loading_spans_the_whole_login() {
    let credentials = MockCredentialStore::demo().with_latency(Duration::from_secs(1));
    let manager = Arc::new(SessionManager::new(
        SessionConfig::default(),
        Arc::new(credentials),
        Arc::new(InMemorySessionStore::new()),
    ));
    manager.restore();
    assert!(!manager.is_loading());

    let task = tokio::spawn({
        let manager = manager.clone();
        async move { manager.login("admin@construcard.ru", DEMO_PASSWORD).await }
    });
    tokio::task::yield_now().await;
    assert!(manager.is_loading());
    assert_eq!(manager.current(), None);

    assert!(task.await.unwrap());
    assert!(!manager.is_loading());
    assert_eq!(manager.current_role(), Some(Role::Admin));
}

#[tokio::test(start_paused = true)]
async fn overlapping_logins_resolve_by_completion_order() {
    let credentials = DelayedCredentials {
        inner: MockCredentialStore::demo(),
        delays: HashMap::from([
            ("admin@construcard.ru", Duration::from_secs(2)),
            ("engineer@construcard.ru", Duration::from_secs(1)),
        ]),
    };
    let manager = Arc::new(SessionManager::new(
        SessionConfig::default(),
        Arc::new(credentials),
        Arc::new(InMemorySessionStore::new()),
    ));
    manager.restore();

    let slow = tokio::spawn({
        let manager = manager.clone();
        async move { manager.login("admin@construcard.ru", DEMO_PASSWORD).await }
    });
    let fast = tokio::spawn({
        let manager = manager.clone();
        async move { manager.login("engineer@construcard.ru", DEMO_PASSWORD).await }
    });

    assert!(fast.await.unwrap());
    assert_eq!(manager.current_role(), Some(Role::Engineer));
    assert!(manager.is_loading(), "the slower login is still in flight");

    assert!(slow.await.unwrap());
    assert_eq!(manager.current_role(), Some(Role::Admin));
    assert!(!manager.is_loading());
}

#[tokio::test]
async fn unreachable_backend_reports_false() {
    let manager = SessionManager::new(
        SessionConfig::default(),
        Arc::new(UnreachableCredentials),
        Arc::new(InMemorySessionStore::new()),
    );
    manager.restore();

    assert!(!manager.login("admin@construcard.ru", DEMO_PASSWORD).await);
    assert_eq!(manager.current(), None);
    assert!(!manager.is_loading());
}

#[tokio::test]
async fn persistence_failures_do_not_block_the_session() {
    let manager = manager_with_store(Arc::new(ReadOnlyStore));
    manager.restore();

    assert!(manager.login("supervisor@construcard.ru", DEMO_PASSWORD).await);
    assert_eq!(manager.current_role(), Some(Role::Supervisor));

    manager.logout();
    assert_eq!(manager.current(), None);
}

#[tokio::test]
async fn guard_renders_per_outcome() {
    let manager = manager_with_store(Arc::new(InMemorySessionStore::new()));
    manager.restore();

    let geodesy = AccessRequest::authenticated()
        .roles([Role::Admin, Role::Engineer])
        .permissions(["manage_geodesy"]);

    let guard = Guard::new(&manager, geodesy.clone());
    assert_eq!(guard.render(|| "geodesy"), Rendered::Notice(Notice::AuthenticationRequired));
    assert_eq!(guard.render_or(|| Some("geodesy"), || None), Rendered::Fallback(None));

    assert!(manager.login("supplier@construcard.ru", DEMO_PASSWORD).await);
    let guard = Guard::new(&manager, geodesy.clone());
    assert!(matches!(guard.outcome(), Outcome::DenyForbidden(_)));
    match guard.render(|| "geodesy") {
        Rendered::Notice(notice @ Notice::InsufficientRights(_)) => {
            assert!(notice.to_string().contains("admin, engineer"));
        }
        other => panic!("expected insufficient-rights notice, got {other:?}"),
    }

    assert!(manager.login("engineer@construcard.ru", DEMO_PASSWORD).await);
    let guard = Guard::new(&manager, geodesy);
    assert_eq!(guard.render(|| "geodesy"), Rendered::Content("geodesy"));
}
