//! Gübrə Storefront library.
//!
//! The storefront is built as a library so the router can be driven directly
//! from integration tests; `main.rs` only wires configuration, telemetry and
//! the listener around [`app::build_router`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
