//! Virtual Wardrobe Core - Shared domain types.
//!
//! This crate provides the types exchanged with the Virtual Wardrobe API and
//! shared by the other workspace members:
//! - `storefront` - Session, cart, catalog and try-on client library
//! - `cli` - Terminal front end built on the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. Everything here is plain data that deserializes from the
//! remote service's JSON.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, users, products, carts and try-on results

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
