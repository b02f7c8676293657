//! Domain models for storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. All of them serialize to the JSON shapes the API returns.

pub mod basket;
pub mod comment;
pub mod media;
pub mod order;
pub mod product;
pub mod profile;
pub mod session;
pub mod social;
pub mod user;

pub use basket::{Basket, BasketLine};
pub use comment::{AdminComment, Comment};
pub use media::MediaItem;
pub use order::{Order, OrderItem, ShippingDetails};
pub use product::{NewProduct, Product, ProductUpdate};
pub use profile::{Profile, ProfileUpdate};
pub use session::{CurrentUser, keys as session_keys};
pub use social::{Author, LikeState};
pub use user::{User, UserAccount};
