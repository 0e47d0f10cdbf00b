//! Virtual Wardrobe Storefront library.
//!
//! Client-side session and cart for the Virtual Wardrobe shop: one API client
//! that keeps the persisted credential honest, a session state machine, a
//! server-authoritative cart, and the catalog and try-on clients. Front ends
//! build a [`Storefront`] and observe it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod navigation;
pub mod notices;
pub mod session;
pub mod state;
pub mod try_on;

pub use state::Storefront;
