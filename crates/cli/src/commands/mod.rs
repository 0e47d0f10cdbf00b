//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod try_on;

use thiserror::Error;

use virtual_wardrobe_storefront::error::AppError;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// A storefront operation failed.
    #[error(transparent)]
    App(#[from] AppError),

    /// Reading input or a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The command needs a signed-in user.
    #[error("Not signed in. Run `wardrobe login` first.")]
    NotSignedIn,
}

impl CliError {
    /// Message for the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::App(e) => e.notice_message(),
            Self::Io(_) | Self::NotSignedIn => self.to_string(),
        }
    }
}
