#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use modalist::backend::{Backend, BackendError, ModeDto, TaskDto};
use modalist::entities::{mode, task};
use modalist::jobs::{ConnectivityMonitor, JobScheduler, RetryPolicy};
use modalist::storage::LocalStorage;
use modalist::sync::SyncService;

/// In-memory backend double. Flip `set_offline` to make every call fail with
/// a network error; collections live behind mutexes so tests can inspect
/// exactly what the engine sent.
pub struct MockBackend {
    pub modes: Mutex<Vec<ModeDto>>,
    pub tasks: Mutex<Vec<TaskDto>>,
    offline: AtomicBool,
    next_id: AtomicI32,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            modes: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
            next_id: AtomicI32::new(1),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    /// Start assigning backend ids from `id` instead of 1.
    pub fn starting_id(self, id: i32) -> Self {
        self.next_id.store(id, Ordering::SeqCst);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(BackendError::Network("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn assign_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_modes(&self) -> Result<Vec<ModeDto>, BackendError> {
        self.guard()?;
        Ok(self.modes.lock().unwrap().clone())
    }

    async fn create_mode(&self, mut m: ModeDto) -> Result<ModeDto, BackendError> {
        self.guard()?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        m.id = self.assign_id();
        self.modes.lock().unwrap().push(m.clone());
        Ok(m)
    }

    async fn update_mode(&self, remote_id: i32, m: ModeDto) -> Result<ModeDto, BackendError> {
        self.guard()?;
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut modes = self.modes.lock().unwrap();
        let Some(stored) = modes.iter_mut().find(|stored| stored.id == remote_id) else {
            return Err(BackendError::NotFound(format!("mode {remote_id}")));
        };
        *stored = ModeDto { id: remote_id, ..m };
        Ok(stored.clone())
    }

    async fn delete_mode(&self, remote_id: i32) -> Result<(), BackendError> {
        self.guard()?;
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.modes.lock().unwrap().retain(|stored| stored.id != remote_id);
        Ok(())
    }

    async fn list_tasks(&self) -> Result<Vec<TaskDto>, BackendError> {
        self.guard()?;
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn create_task(&self, mut t: TaskDto) -> Result<TaskDto, BackendError> {
        self.guard()?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if t.mode_id == 0 {
            return Err(BackendError::InvalidData("task references no mode".to_string()));
        }
        t.id = self.assign_id();
        self.tasks.lock().unwrap().push(t.clone());
        Ok(t)
    }

    async fn update_task(&self, remote_id: i32, t: TaskDto) -> Result<TaskDto, BackendError> {
        self.guard()?;
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut tasks = self.tasks.lock().unwrap();
        let Some(stored) = tasks.iter_mut().find(|stored| stored.id == remote_id) else {
            return Err(BackendError::NotFound(format!("task {remote_id}")));
        };
        *stored = TaskDto { id: remote_id, ..t };
        Ok(stored.clone())
    }

    async fn delete_task(&self, remote_id: i32) -> Result<(), BackendError> {
        self.guard()?;
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.tasks.lock().unwrap().retain(|stored| stored.id != remote_id);
        Ok(())
    }
}

/// Everything a sync engine test needs, wired the way the application does it.
pub struct TestHarness {
    pub service: Arc<SyncService>,
    pub scheduler: Arc<JobScheduler>,
    pub connectivity: ConnectivityMonitor,
    pub backend: Arc<MockBackend>,
    pub storage: Arc<LocalStorage>,
}

/// Fast retry policy so scheduler behavior is observable within a test run.
pub fn test_retry_policy() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(40),
        max_attempts: 3,
    }
}

pub async fn harness(backend: MockBackend) -> TestHarness {
    let storage = Arc::new(LocalStorage::in_memory().await.expect("in-memory storage"));
    let connectivity = ConnectivityMonitor::new(true);
    let scheduler = Arc::new(JobScheduler::new(connectivity.clone(), test_retry_policy()));
    let backend = Arc::new(backend);
    let service = Arc::new(
        SyncService::new(storage.clone(), backend.clone(), scheduler.clone())
            .await
            .expect("sync service"),
    );
    scheduler.start(service.clone());

    TestHarness {
        service,
        scheduler,
        connectivity,
        backend,
        storage,
    }
}

pub fn mode_fixture(title: &str, color: &str) -> mode::Model {
    mode::Model {
        local_id: 0,
        backend_id: None,
        title: title.to_string(),
        color: color.to_string(),
        is_synced: false,
        is_deleted: false,
    }
}

pub fn task_fixture(title: &str, mode_id: i64) -> task::Model {
    task::Model {
        local_id: 0,
        backend_id: None,
        title: title.to_string(),
        mode_id,
        is_completed: false,
        time_logged: 0,
        is_synced: false,
        is_deleted: false,
    }
}

pub fn remote_mode(id: i32, title: &str, color: &str) -> ModeDto {
    ModeDto {
        id,
        title: title.to_string(),
        color: color.to_string(),
        is_deleted: false,
    }
}

pub fn remote_task(id: i32, title: &str, mode_id: i32) -> TaskDto {
    TaskDto {
        id,
        title: title.to_string(),
        mode_id,
        is_completed: false,
        time_logged: 0,
        is_deleted: false,
    }
}
