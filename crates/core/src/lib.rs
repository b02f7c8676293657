//! Gübrə Core - Shared types library.
//!
//! This crate provides common types used across all Gübrə components:
//! - `storefront` - Public catalog, cart, checkout and the `/admin` API
//! - `cli` - Command-line tools for migrations, seeding and role management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. The optional `postgres` feature adds sqlx encoding so the
//! newtypes can be bound directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, quantities, emails and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
