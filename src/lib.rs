//! Modalist - offline-first sync core for a task/mode tracking client
//!
//! This library keeps a local sqlite store and a remote backend reconciled
//! under unreliable connectivity: every mutation lands locally first, is
//! mirrored to the backend on a best-effort basis, and is swept by
//! deduplicated background jobs until both sides converge. Deletions are
//! soft locally and purged only after the backend confirms them.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`config`] - Application configuration management
//! * [`storage`] - Local sqlite store and schema
//! * [`entities`] - SeaORM entity models for database tables
//! * [`repositories`] - Repository layer for database operations
//! * [`backend`] - Remote service client abstraction and REST implementation
//! * [`sync`] - The synchronization engine and live query observation
//! * [`jobs`] - Deduplicated, connectivity-gated background job scheduling

/// Remote service abstraction layer
pub mod backend;

/// Configuration module for managing application settings
pub mod config;

/// SeaORM entity models for database tables
pub mod entities;

/// Background job scheduling with dedup and retry
pub mod jobs;

/// Logging setup utilities
pub mod logger;

/// Repository layer for database operations
pub mod repositories;

/// Local storage layer
pub mod storage;

/// Synchronization engine for keeping local and remote data in sync
pub mod sync;

// Re-export entity models for convenient access
pub use entities::{mode, sync_status, task, EntityKind};
