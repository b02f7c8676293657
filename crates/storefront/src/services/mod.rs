//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password registration and login (Argon2id)
//! - `cart` - Basket mutations that publish change notifications
//! - `catalog` - Cached product listing
//! - `realtime` - Per-user basket change fan-out for server-sent events
//! - `storage` - Avatar and gallery files on local disk

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod realtime;
pub mod storage;
