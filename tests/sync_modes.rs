mod common;

use common::{harness, mode_fixture, remote_mode, MockBackend};
use modalist::jobs::JobKind;
use modalist::repositories::ModeRepository;

#[tokio::test]
async fn add_mode_online_merges_backend_identity() {
    let h = harness(MockBackend::new().starting_id(7)).await;

    let stored = h
        .service
        .add_mode(mode_fixture("Deep Work", "#ff0000"))
        .await
        .expect("add mode");

    assert_eq!(stored.backend_id, Some(7));
    assert!(stored.is_synced);
    assert!(stored.local_id > 0);

    // The local row carries the merged identity, not just the return value.
    let row = ModeRepository::get_by_local_id(&h.storage.conn, stored.local_id)
        .await
        .expect("get")
        .expect("row present");
    assert_eq!(row.backend_id, Some(7));
    assert!(row.is_synced);

    let remote = h.backend.modes.lock().unwrap();
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].title, "Deep Work");
}

#[tokio::test]
async fn add_mode_offline_keeps_row_unsynced_and_visible() {
    let h = harness(MockBackend::new()).await;
    h.backend.set_offline(true);

    let stored = h
        .service
        .add_mode(mode_fixture("Reading", "#00ff00"))
        .await
        .expect("add mode offline");

    assert_eq!(stored.backend_id, None);
    assert!(!stored.is_synced);

    let all = h.service.get_modes_once().await.expect("get all");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Reading");
}

#[tokio::test]
async fn update_mode_online_writes_server_representation() {
    let h = harness(MockBackend::new()).await;
    let stored = h
        .service
        .add_mode(mode_fixture("Gym", "#0000ff"))
        .await
        .expect("add");

    let mut edited = stored.clone();
    edited.title = "Gym & Run".to_string();
    h.service.update_mode(edited).await.expect("update");

    let row = ModeRepository::get_by_local_id(&h.storage.conn, stored.local_id)
        .await
        .expect("get")
        .expect("row present");
    assert_eq!(row.title, "Gym & Run");
    assert!(row.is_synced);
    assert_eq!(h.backend.modes.lock().unwrap()[0].title, "Gym & Run");
}

#[tokio::test]
async fn update_mode_offline_leaves_row_unsynced_and_schedules_sweep() {
    let h = harness(MockBackend::new()).await;
    let stored = h
        .service
        .add_mode(mode_fixture("Focus", "#112233"))
        .await
        .expect("add");

    // Park the scheduled sweep so the pending state is observable.
    h.connectivity.set_online(false);
    h.backend.set_offline(true);

    let mut edited = stored.clone();
    edited.title = "Focus v2".to_string();
    h.service.update_mode(edited).await.expect("update offline");

    let row = ModeRepository::get_by_local_id(&h.storage.conn, stored.local_id)
        .await
        .expect("get")
        .expect("row present");
    assert_eq!(row.title, "Focus v2");
    assert!(!row.is_synced);
    assert!(h.scheduler.is_pending(JobKind::SyncModes).await);
}

#[tokio::test]
async fn update_mode_without_backend_identity_is_local_only() {
    let h = harness(MockBackend::new()).await;
    h.backend.set_offline(true);
    let stored = h
        .service
        .add_mode(mode_fixture("Drafts", "#445566"))
        .await
        .expect("add offline");
    h.backend.set_offline(false);

    let mut edited = stored.clone();
    edited.title = "Drafts v2".to_string();
    h.service.update_mode(edited).await.expect("update");

    let row = ModeRepository::get_by_local_id(&h.storage.conn, stored.local_id)
        .await
        .expect("get")
        .expect("row present");
    assert_eq!(row.title, "Drafts v2");
    assert!(!row.is_synced);
    // Without a backend id there is nothing to address remotely.
    assert_eq!(h.backend.update_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fetch_caches_remote_modes_idempotently() {
    let backend = MockBackend::new();
    backend.modes.lock().unwrap().extend([
        remote_mode(5, "Alpha", "#111111"),
        remote_mode(9, "Beta", "#222222"),
    ]);
    let h = harness(backend).await;

    h.service
        .fetch_modes_from_backend_and_cache()
        .await
        .expect("first fetch");
    h.service
        .fetch_modes_from_backend_and_cache()
        .await
        .expect("second fetch");

    let all = h.service.get_modes_once().await.expect("get all");
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|m| m.is_synced));
}

#[tokio::test]
async fn fetch_inserts_only_net_new_remote_modes() {
    let backend = MockBackend::new();
    backend.modes.lock().unwrap().extend([
        remote_mode(5, "Alpha", "#111111"),
        remote_mode(9, "Beta", "#222222"),
    ]);
    let h = harness(backend).await;
    h.service
        .fetch_modes_from_backend_and_cache()
        .await
        .expect("seed fetch");

    h.backend
        .modes
        .lock()
        .unwrap()
        .push(remote_mode(12, "Gamma", "#333333"));
    h.service
        .fetch_modes_from_backend_and_cache()
        .await
        .expect("incremental fetch");

    let all = h.service.get_modes_once().await.expect("get all");
    let mut ids: Vec<i32> = all.iter().filter_map(|m| m.backend_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![5, 9, 12]);
}

#[tokio::test]
async fn fetch_swallows_remote_failure() {
    let h = harness(MockBackend::new()).await;
    h.backend.set_offline(true);

    h.service
        .fetch_modes_from_backend_and_cache()
        .await
        .expect("fetch while offline is not an error");
    assert!(h.service.get_modes_once().await.expect("get all").is_empty());
}

#[tokio::test]
async fn sync_modes_bootstraps_once_then_defers_to_background_sweep() {
    let backend = MockBackend::new();
    backend
        .modes
        .lock()
        .unwrap()
        .push(remote_mode(3, "Seeded", "#aaaaaa"));
    let h = harness(backend).await;

    h.service.sync_modes().await.expect("bootstrap sync");
    assert_eq!(h.service.get_modes_once().await.expect("get").len(), 1);

    // Subsequent calls schedule the sweep instead of pulling again.
    h.connectivity.set_online(false);
    h.service.sync_modes().await.expect("second sync");
    assert!(h.scheduler.is_pending(JobKind::SyncModes).await);
    assert_eq!(h.service.get_modes_once().await.expect("get").len(), 1);
}

#[tokio::test]
async fn delete_mode_hides_row_and_purges_after_remote_confirm() {
    let h = harness(MockBackend::new()).await;
    let stored = h
        .service
        .add_mode(mode_fixture("Doomed", "#999999"))
        .await
        .expect("add");

    // Keep the scheduled job parked; drive the sweep by hand.
    h.connectivity.set_online(false);
    h.service.delete_mode(stored.clone()).await.expect("delete");

    assert!(h.service.get_modes_once().await.expect("get").is_empty());
    let row = ModeRepository::get_by_local_id(&h.storage.conn, stored.local_id)
        .await
        .expect("get")
        .expect("soft-deleted row still stored");
    assert!(row.is_deleted);

    // Remote still failing: the sweep reports failure and keeps the row.
    h.backend.set_offline(true);
    assert!(h.service.sync_deleted_modes().await.is_err());
    assert!(
        ModeRepository::get_by_local_id(&h.storage.conn, stored.local_id)
            .await
            .expect("get")
            .is_some()
    );

    // Remote back: the sweep deletes remotely and purges locally.
    h.backend.set_offline(false);
    h.service.sync_deleted_modes().await.expect("sweep");
    assert!(
        ModeRepository::get_by_local_id(&h.storage.conn, stored.local_id)
            .await
            .expect("get")
            .is_none()
    );
    assert!(h.backend.modes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn delete_never_synced_mode_purges_without_remote_call() {
    let h = harness(MockBackend::new()).await;
    h.backend.set_offline(true);
    let stored = h
        .service
        .add_mode(mode_fixture("Local only", "#123456"))
        .await
        .expect("add offline");

    h.connectivity.set_online(false);
    h.service.delete_mode(stored.clone()).await.expect("delete");

    // Backend stays offline: no remote id means nothing to delete remotely.
    h.service.sync_deleted_modes().await.expect("sweep");
    assert!(
        ModeRepository::get_by_local_id(&h.storage.conn, stored.local_id)
            .await
            .expect("get")
            .is_none()
    );
    assert_eq!(h.backend.delete_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn push_sweep_reconciles_offline_edits() {
    let h = harness(MockBackend::new()).await;
    h.backend.set_offline(true);
    h.connectivity.set_online(false);

    let created = h
        .service
        .add_mode(mode_fixture("Offline add", "#aa0000"))
        .await
        .expect("add offline");
    assert!(!created.is_synced);

    h.backend.set_offline(false);
    h.service.push_unsynced_modes().await.expect("push sweep");

    let row = ModeRepository::get_by_local_id(&h.storage.conn, created.local_id)
        .await
        .expect("get")
        .expect("row present");
    assert!(row.is_synced);
    assert!(row.backend_id.is_some());
    assert_eq!(h.backend.modes.lock().unwrap().len(), 1);
}
