//! Error types for the core crate.
//!
//! This module defines [`OuigenError`], the error type used throughout the
//! crate, along with a helper trait for attaching context to I/O errors.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while refreshing the cache or generating the
/// binary table.
#[derive(Error, Diagnostic, Debug)]
pub enum OuigenError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(ouigen::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(ouigen::system_time))]
    SystemTimeError(#[from] std::time::SystemTimeError),

    #[error("Invalid URL '{url}': {reason}")]
    #[diagnostic(
        code(ouigen::invalid_url),
        help("Ensure the registry URL is valid and properly formatted")
    )]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to fetch {url}: {reason}")]
    #[diagnostic(
        code(ouigen::network),
        help("Check your network connection and the registry URL, or re-run with --offline to use the cached data")
    )]
    NetworkFailure { url: String, reason: String },

    #[error("Bad cache artifact '{}': {reason}", path.display())]
    #[diagnostic(
        code(ouigen::cache_corrupt),
        help("The cache artifact has been destroyed; re-run online to repopulate it")
    )]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("No data available: {}", path.display())]
    #[diagnostic(
        code(ouigen::no_data),
        help("No cached registry data exists; run at least once without --offline")
    )]
    NoDataAvailable { path: PathBuf },

    #[error("Unable to create directory '{}': {source}", path.display())]
    #[diagnostic(code(ouigen::directory_creation))]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to move '{}' to '{}': {source}", from.display(), to.display())]
    #[diagnostic(
        code(ouigen::publish),
        help("The previous cache artifact was left untouched")
    )]
    PublishFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    #[diagnostic(code(ouigen::custom))]
    Custom(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, OuigenError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    /// Adds context to an error, describing what action was being performed.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            OuigenError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
