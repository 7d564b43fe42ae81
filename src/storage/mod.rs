//! Local storage module: the durable sqlite store behind the sync engine.

pub mod db;

pub use db::LocalStorage;
