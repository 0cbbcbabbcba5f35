// src/config/mod.rs
//! Service configuration from environment variables.

pub mod app;

pub use app::{AppConfig, StoreBackend};
