//! Domain models for the storefront client.
//!
//! Wire-level types shared with the remote API live in `virtual_wardrobe_core`;
//! this module holds the client-only ones.

pub mod credential;

pub use credential::{AuthResponse, Credential, PersistedCredential};
