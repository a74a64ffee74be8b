//! Domain-specific error types for konfsave.
//!
//! Internal modules return typed errors (e.g., [`ConfigError`],
//! [`ProfileError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! KonfsaveError
//! ├── Config(ConfigError)     : INI parsing, group catalog construction
//! ├── Profile(ProfileError)   : record validation, store CRUD
//! ├── Transfer(TransferError) : per-path copy failures
//! └── Archive(ArchiveError)   : ZIP export and import
//! ```
//!
//! Soft conditions (a missing source file, an undefined group reference, a
//! malformed record read as "absent") are not errors at all: they are logged
//! and the operation continues.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for konfsave.
#[derive(Error, Debug)]
pub enum KonfsaveError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Profile store error.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Transfer error.
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Archive error.
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// Errors that arise from loading `konfsave.ini` and building the group catalog.
///
/// Every variant is fatal: the process reports it and exits non-zero.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A key required by this version is absent, usually after an upgrade.
    #[error(
        "missing required key '{key}' in [{section}]; compare your configuration with the bundled default and add it"
    )]
    MissingKey {
        /// Section the key belongs to.
        section: String,
        /// Name of the missing key.
        key: String,
    },

    /// A metagroup asked to promote a group that has no definition.
    #[error("cannot promote undefined group '{0}' to a metagroup")]
    UndefinedPromotion(String),

    /// The INI file contains a syntax error that prevents parsing.
    #[error("Invalid INI syntax in {file}: {message}")]
    InvalidSyntax {
        /// File that failed to parse.
        file: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading or creating a config file.
    #[error("IO error on config file {path}: {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise from the profile record store.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The profile name violates the naming rule.
    #[error("The profile name \"{0}\" is invalid")]
    InvalidName(String),

    /// No saved profile has this name.
    #[error("The profile \"{0}\" doesn't exist")]
    NotFound(String),

    /// A saved profile already uses this name.
    #[error("A profile named \"{name}\" is already saved at {path}")]
    AlreadyExists {
        /// Conflicting name.
        name: String,
        /// Storage directory of the existing profile.
        path: PathBuf,
    },

    /// The operation needs an active profile and none is set.
    #[error("no profile is active; specify a profile name")]
    NoActiveProfile,

    /// Serialising a record failed; nothing was written.
    #[error("could not serialize the record for \"{name}\": {source}")]
    Serialize {
        /// Profile name.
        name: String,
        /// Underlying serde error.
        source: serde_json::Error,
    },

    /// A filesystem operation on the store failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors for a single path during a transfer.
///
/// These are collected into the transfer report; they never abort the
/// remaining paths.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The path does not lie inside the home directory.
    #[error("{0} is not within the home directory")]
    OutsideHome(PathBuf),

    /// Copying failed.
    #[error("copying {path} failed: {source}")]
    Io {
        /// Path being copied.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise from archiving and unarchiving profiles.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The destination already exists and overwriting was not requested.
    #[error("The file {0} already exists")]
    DestinationExists(PathBuf),

    /// The profile to archive has no valid record.
    #[error("\"{0}\" is not a valid konfsave profile")]
    NotAProfile(String),

    /// The archive lacks a usable record and no replacement name was given.
    #[error(
        "could not infer the destination profile name for {0}; the archive has no valid record and no new name was given"
    )]
    UnknownName(PathBuf),

    /// The profile name carried by the archive or given by the caller is invalid.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// The container itself could not be read or written.
    #[error("zip error in {path}: {source}")]
    Zip {
        /// Archive path.
        path: PathBuf,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },

    /// A filesystem operation failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
