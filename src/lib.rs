//! Named profiles of desktop configuration files.
//!
//! konfsave copies a configurable set of files between the home directory
//! and named profile directories, so that whole desktop setups can be
//! saved, switched, shared as archives and restored.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: parse `konfsave.ini` into settings and a group catalog
//! - **[`resolver`]**: compute the set of files an operation copies
//! - **[`profiles`]**: profile records, the profile store and the active pointer
//! - **[`transfer`]**: copy a resolved set between home and a profile
//! - **[`archive`]**: ZIP import and export of profiles
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod paths;
pub mod profiles;
pub mod prompt;
pub mod resolver;
pub mod transfer;
