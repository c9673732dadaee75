//! Todo API - REST CRUD over items stored in a key-value store
//!
//! # Modules
//!
//! - [`item`] - Item model and request payloads
//! - [`store`] - Key-value store trait with Redis and in-memory backends
//! - [`repository`] - Item CRUD over the store
//! - [`handlers`] - HTTP handlers
//! - [`metrics`] - Prometheus collectors
//! - [`server`] - Router assembly and serving
//! - [`config`] - Flags and environment

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod item;
pub mod metrics;
pub mod repository;
pub mod server;
pub mod store;

pub use error::{Error, Result};
