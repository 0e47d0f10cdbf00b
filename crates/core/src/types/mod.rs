//! Core types for Virtual Wardrobe.
//!
//! This module provides type-safe wrappers for the remote service's domain.

pub mod cart;
pub mod id;
pub mod money;
pub mod product;
pub mod try_on;
pub mod user;

pub use cart::{Cart, CartItem};
pub use id::*;
pub use money::Money;
pub use product::{Product, ProductSummary};
pub use try_on::TryOnResult;
pub use user::UserSummary;
