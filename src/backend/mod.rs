//! Remote service abstraction.
//!
//! The sync engine only ever talks to the backend through the [`Backend`]
//! trait; transport details (HTTP, timeouts, auth) live behind it. Every
//! failure surfaces as a [`BackendError`] and is treated uniformly by the
//! engine as "remote call failed".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod rest;

pub use rest::RestBackend;

/// Common error types for backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Backend error: {0}")]
    Other(String),
}

/// Wire representation of a mode. Carries no local-only fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModeDto {
    /// Backend-assigned id; 0 when not yet assigned (create requests).
    #[serde(default)]
    pub id: i32,
    pub title: String,
    pub color: String,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Wire representation of a task. `mode_id` is the *remote* mode id, never
/// the local one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskDto {
    /// Backend-assigned id; 0 when not yet assigned (create requests).
    #[serde(default)]
    pub id: i32,
    pub title: String,
    #[serde(rename = "modeId")]
    pub mode_id: i32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub time_logged: i64,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Stateless CRUD interface to the remote service, one method set per entity.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_modes(&self) -> Result<Vec<ModeDto>, BackendError>;
    async fn create_mode(&self, mode: ModeDto) -> Result<ModeDto, BackendError>;
    async fn update_mode(&self, remote_id: i32, mode: ModeDto) -> Result<ModeDto, BackendError>;
    async fn delete_mode(&self, remote_id: i32) -> Result<(), BackendError>;

    async fn list_tasks(&self) -> Result<Vec<TaskDto>, BackendError>;
    async fn create_task(&self, task: TaskDto) -> Result<TaskDto, BackendError>;
    async fn update_task(&self, remote_id: i32, task: TaskDto) -> Result<TaskDto, BackendError>;
    async fn delete_task(&self, remote_id: i32) -> Result<(), BackendError>;
}
