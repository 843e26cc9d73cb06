//! Integration tests for keyset-cache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use keyset_cache::config::Config;
    use keyset_cache::fingerprint::{Fingerprint, KeySetId};
    use keyset_cache::store::{CredentialStore, FileKeyValueStore};
    use predicates::prelude::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Env {
        temp: TempDir,
        config_path: PathBuf,
    }

    impl Env {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let mut config = Config::default();
            config.store.dir = Some(temp.path().join("store"));

            let config_path = temp.path().join("config.toml");
            std::fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();
            Self { temp, config_path }
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("keyset-cache");
            cmd.arg("--config").arg(&self.config_path);
            cmd
        }

        fn seed(&self, fingerprint: &[u8], key_set_id: &[u8]) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let kv = FileKeyValueStore::open(&self.temp.path().join("store"), "drmkeys")
                    .await
                    .unwrap();
                CredentialStore::new(Arc::new(kv))
                    .put(&Fingerprint::new(fingerprint), &KeySetId::new(key_set_id))
                    .await
                    .unwrap();
            });
        }
    }

    #[test]
    fn help_displays() {
        Env::new()
            .cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline license key-set cache"));
    }

    #[test]
    fn version_displays() {
        Env::new()
            .cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("keyset-cache"));
    }

    #[test]
    fn check_below_threshold_renews() {
        Env::new()
            .cmd()
            .args(["check", "--playback", "14399", "--license", "999999"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("renew"));
    }

    #[test]
    fn check_at_threshold_reuses() {
        Env::new()
            .cmd()
            .args(["check", "--playback", "14400", "--license", "14400"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("reuse"));
    }

    #[test]
    fn list_empty() {
        Env::new()
            .cmd()
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No stored key sets"));
    }

    #[test]
    fn list_and_get_seeded_entry() {
        let env = Env::new();
        env.seed(b"F1", b"C1");

        env.cmd()
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("RjE= QzE="));

        env.cmd()
            .args(["get", "hex:4631"])
            .assert()
            .success()
            .stdout(predicate::str::contains("QzE="));
    }

    #[test]
    fn remove_then_get_fails() {
        let env = Env::new();
        env.seed(b"F1", b"C1");

        env.cmd().args(["remove", "RjE="]).assert().success();

        env.cmd()
            .args(["get", "RjE="])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No key set stored"));
    }

    #[test]
    fn empty_fingerprint_is_addressable() {
        let env = Env::new();
        env.seed(b"", b"C0");

        env.cmd()
            .args(["get", "hex:"])
            .assert()
            .success()
            .stdout(predicate::str::contains("QzA="));

        env.cmd().args(["remove", "hex:"]).assert().success();

        env.cmd()
            .args(["get", "hex:"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No key set stored"));
    }

    #[test]
    fn clear_with_yes() {
        let env = Env::new();
        env.seed(b"F1", b"C1");
        env.seed(b"F2", b"C2");

        env.cmd()
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cleared 2 key set(s)"));

        env.cmd()
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No stored key sets"));
    }

    #[test]
    fn bad_fingerprint_shows_hint() {
        Env::new()
            .cmd()
            .args(["get", "hex:zz"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid fingerprint"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn config_path() {
        let env = Env::new();
        env.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        Env::new()
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[store]"));
    }
}

mod coordinator_tests {
    use keyset_cache::backend::LicenseMode;
    use keyset_cache::coordinator::SessionCoordinator;
    use keyset_cache::error::KeysetError;
    use keyset_cache::events::{
        ChannelListener, EventBridge, LicenseEvent, LicenseEventListener, Notification,
    };
    use keyset_cache::fingerprint::{Fingerprint, KeySetId};
    use keyset_cache::renewal::RemainingValidity;
    use keyset_cache::scheme::{DrmInitData, SchemeData, WIDEVINE_UUID};
    use keyset_cache::store::{CredentialStore, FileKeyValueStore, MemoryKeyValueStore};
    use keyset_cache::testing::{CountingStore, ScriptedBackend};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tokio::sync::{mpsc, Barrier};

    type Coord = SessionCoordinator<ScriptedBackend>;

    fn init_data(fingerprint: &[u8]) -> DrmInitData {
        DrmInitData::new(vec![SchemeData::new(
            WIDEVINE_UUID,
            Some("cenc"),
            fingerprint.to_vec(),
        )])
    }

    fn fp(bytes: &[u8]) -> Fingerprint {
        Fingerprint::new(bytes)
    }

    fn ks(bytes: &[u8]) -> KeySetId {
        KeySetId::new(bytes)
    }

    struct Harness {
        backend: Arc<ScriptedBackend>,
        counting: Arc<CountingStore>,
        coord: Arc<Coord>,
        bridge: EventBridge<ScriptedBackend>,
        notifications: mpsc::UnboundedReceiver<Notification>,
    }

    fn harness() -> Harness {
        let backend = Arc::new(ScriptedBackend::new());
        let counting = Arc::new(CountingStore::new(Arc::new(MemoryKeyValueStore::new(
            "drmkeys",
        ))));
        let store = CredentialStore::new(counting.clone());
        let coord = Arc::new(SessionCoordinator::new(
            WIDEVINE_UUID,
            Arc::clone(&backend),
            store,
        ));
        let (listener, notifications) = ChannelListener::new();
        let bridge = EventBridge::new(Arc::clone(&coord), Some(Arc::new(listener)));
        Harness {
            backend,
            counting,
            coord,
            bridge,
            notifications,
        }
    }

    #[tokio::test]
    async fn fresh_acquisition_is_persisted_on_load() {
        let mut h = harness();

        h.coord.acquire_session((), &init_data(b"F1")).await.unwrap();
        assert_eq!(h.backend.mode_changes(), vec![LicenseMode::AcquireFresh]);

        h.backend.set_active(Some(ks(b"C1")));
        h.bridge.dispatch(LicenseEvent::KeysLoaded).await;

        assert_eq!(h.coord.store().get(&fp(b"F1")).await, Some(ks(b"C1")));
        assert!(!h.coord.is_pending());
        assert_eq!(h.notifications.try_recv().unwrap(), Notification::KeysLoaded);
        assert!(h.notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn valid_cached_license_is_reused_untouched() {
        let h = harness();
        h.coord.store().put(&fp(b"F1"), &ks(b"C1")).await.unwrap();
        h.backend
            .set_validity(&ks(b"C1"), RemainingValidity::new(20000, 20000));
        let puts_before = h.counting.puts();

        let session = h.coord.acquire_session((), &init_data(b"F1")).await.unwrap();

        assert_eq!(session.mode, Some(LicenseMode::UseExisting(ks(b"C1"))));
        assert_eq!(h.counting.puts(), puts_before);
        assert_eq!(h.counting.removes(), 0);
        assert!(h.backend.teardowns().is_empty());
    }

    #[tokio::test]
    async fn expiring_license_is_discarded_and_renewed() {
        let h = harness();
        h.coord.store().put(&fp(b"F1"), &ks(b"C1")).await.unwrap();
        h.backend
            .set_validity(&ks(b"C1"), RemainingValidity::new(100, 999_999));

        let session = h.coord.acquire_session((), &init_data(b"F1")).await.unwrap();

        assert_eq!(session.mode, Some(LicenseMode::AcquireFresh));
        assert!(h.coord.store().get(&fp(b"F1")).await.is_none());
        assert!(!h
            .backend
            .mode_changes()
            .contains(&LicenseMode::UseExisting(ks(b"C1"))));
    }

    #[tokio::test]
    async fn renewed_license_overwrites_entry() {
        let h = harness();
        h.coord.store().put(&fp(b"F1"), &ks(b"OLD")).await.unwrap();
        h.backend
            .set_validity(&ks(b"OLD"), RemainingValidity::new(10, 10));

        h.coord.acquire_session((), &init_data(b"F1")).await.unwrap();
        h.backend.set_active(Some(ks(b"NEW")));
        h.bridge.dispatch(LicenseEvent::KeysLoaded).await;

        assert_eq!(h.coord.store().get(&fp(b"F1")).await, Some(ks(b"NEW")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_consult_cache_once() {
        let h = harness();
        h.coord.store().put(&fp(b"F1"), &ks(b"C1")).await.unwrap();
        h.backend
            .set_validity(&ks(b"C1"), RemainingValidity::new(20000, 20000));

        let barrier = Arc::new(Barrier::new(2));
        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let coord = Arc::clone(&h.coord);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    coord.acquire_session((), &init_data(b"F1")).await
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        assert_eq!(h.counting.gets(), 1);
        assert_eq!(h.backend.validity_queries(), 1);
        assert_eq!(h.backend.mode_changes().len(), 1);
        assert_eq!(h.backend.acquisitions(), 2);
    }

    #[tokio::test]
    async fn terminal_events_reopen_cache_path() {
        let h = harness();

        for event in [
            LicenseEvent::KeysLoaded,
            LicenseEvent::KeysRestored,
            LicenseEvent::Error(KeysetError::Acquisition("provisioning failed".into())),
        ] {
            let gets_before = h.counting.gets();
            h.coord.acquire_session((), &init_data(b"F1")).await.unwrap();
            assert_eq!(h.counting.gets(), gets_before + 1);

            h.bridge.dispatch(event).await;
            assert!(!h.coord.is_pending());
        }
    }

    #[tokio::test]
    async fn removed_event_does_not_reopen_cache_path() {
        let h = harness();

        h.coord.acquire_session((), &init_data(b"F1")).await.unwrap();
        h.bridge.dispatch(LicenseEvent::KeysRemoved).await;
        h.coord.acquire_session((), &init_data(b"F1")).await.unwrap();

        assert_eq!(h.counting.gets(), 1);
        assert_eq!(h.backend.acquisitions(), 2);
    }

    /// Records what the listener can observe at notification time
    struct ObservingListener {
        coord: Arc<Coord>,
        seen: Mutex<Vec<(bool, Option<KeySetId>)>>,
    }

    impl ObservingListener {
        fn observe(&self) {
            let stored = tokio::task::block_in_place(|| {
                tokio::runtime::Handle::current()
                    .block_on(self.coord.store().get(&Fingerprint::new(b"F1".to_vec())))
            });
            self.seen
                .lock()
                .unwrap()
                .push((self.coord.is_pending(), stored));
        }
    }

    impl LicenseEventListener for ObservingListener {
        fn on_keys_loaded(&self) {
            self.observe();
        }

        fn on_error(&self, _error: &KeysetError) {
            self.observe();
        }

        fn on_keys_restored(&self) {
            self.observe();
        }

        fn on_keys_removed(&self) {
            self.observe();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn listener_sees_persisted_entry_and_idle_guard() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = CredentialStore::new(Arc::new(MemoryKeyValueStore::new("drmkeys")));
        let coord = Arc::new(SessionCoordinator::new(
            WIDEVINE_UUID,
            Arc::clone(&backend),
            store,
        ));
        let listener = Arc::new(ObservingListener {
            coord: Arc::clone(&coord),
            seen: Mutex::new(vec![]),
        });
        let bridge = EventBridge::new(Arc::clone(&coord), Some(listener.clone()));

        coord.acquire_session((), &init_data(b"F1")).await.unwrap();
        backend.set_active(Some(ks(b"C1")));
        tokio::spawn(async move { bridge.dispatch(LicenseEvent::KeysRestored).await })
            .await
            .unwrap();

        let seen = listener.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![(false, Some(ks(b"C1")))]);
    }

    #[tokio::test]
    async fn file_store_is_shared_across_coordinators() {
        let temp = TempDir::new().unwrap();

        let first_backend = Arc::new(ScriptedBackend::new());
        let first = Arc::new(SessionCoordinator::new(
            WIDEVINE_UUID,
            Arc::clone(&first_backend),
            CredentialStore::new(Arc::new(
                FileKeyValueStore::open(temp.path(), "drmkeys").await.unwrap(),
            )),
        ));
        let bridge = EventBridge::new(Arc::clone(&first), None);

        first.acquire_session((), &init_data(b"F1")).await.unwrap();
        first_backend.set_active(Some(ks(b"C1")));
        bridge.dispatch(LicenseEvent::KeysLoaded).await;

        let second_backend = Arc::new(ScriptedBackend::new());
        second_backend.set_validity(&ks(b"C1"), RemainingValidity::new(86400, 86400));
        let second = SessionCoordinator::new(
            WIDEVINE_UUID,
            Arc::clone(&second_backend),
            CredentialStore::new(Arc::new(
                FileKeyValueStore::open(temp.path(), "drmkeys").await.unwrap(),
            )),
        );

        second.acquire_session((), &init_data(b"F1")).await.unwrap();
        assert_eq!(
            second_backend.mode_changes(),
            vec![LicenseMode::UseExisting(ks(b"C1"))]
        );
    }
}
