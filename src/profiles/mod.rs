//! Profile records and their store.
//!
//! A record is a small JSON document kept as `.konfsave_profile` inside the
//! profile's storage directory. The active profile is tracked by a byte copy
//! of its record at `<data dir>/current_profile`.
pub mod name;
pub mod store;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::paths::PROFILE_RECORD_FILENAME;
use crate::transfer::fs::write_atomic;

pub use name::NameRule;
pub use store::{DeleteSummary, ProfileStore, RecordChanges};

/// Metadata stored with every profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Identifier-like profile name.
    pub name: String,
    /// Who made the profile.
    #[serde(default)]
    pub author: Option<String>,
    /// Free-form summary.
    #[serde(default)]
    pub description: Option<String>,
    /// Groups the profile declares support for.
    #[serde(default)]
    pub groups: Option<Vec<String>>,
    /// Stored include overrides (paths or group names).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    /// Stored exclude overrides (paths or group names).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl ProfileRecord {
    /// A record with only a name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            author: None,
            description: None,
            groups: None,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Serialise to the on-disk form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Write the record as `.konfsave_profile` inside `dir`.
    ///
    /// The JSON is built fully in memory and committed with a rename, so a
    /// failed write leaves any previous record intact.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn write_into(&self, dir: &Path) -> Result<PathBuf, ProfileError> {
        let json = self.to_json().map_err(|source| ProfileError::Serialize {
            name: self.name.clone(),
            source,
        })?;
        let path = dir.join(PROFILE_RECORD_FILENAME);
        write_atomic(&path, json.as_bytes()).map_err(|source| ProfileError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Parse and validate the on-disk form.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason if the text is not a well-formed
    /// record or the name violates `rule`.
    pub fn from_json(text: &str, rule: &NameRule) -> Result<Self, String> {
        let record: Self = serde_json::from_str(text).map_err(|e| e.to_string())?;
        if !rule.is_valid(&record.name) {
            return Err(format!("the name \"{}\" is invalid", record.name));
        }
        Ok(record)
    }
}

/// Result of reading a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A valid record.
    Found(ProfileRecord),
    /// No record exists at the location.
    NotFound,
    /// A record exists but is malformed or carries an invalid name.
    Invalid {
        /// Location of the bad record.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },
}

impl Lookup {
    /// The record, if one was found.
    #[must_use]
    pub fn found(self) -> Option<ProfileRecord> {
        match self {
            Self::Found(r) => Some(r),
            Self::NotFound | Self::Invalid { .. } => None,
        }
    }

    /// Borrow the record, if one was found.
    #[must_use]
    pub const fn as_found(&self) -> Option<&ProfileRecord> {
        match self {
            Self::Found(r) => Some(r),
            Self::NotFound | Self::Invalid { .. } => None,
        }
    }
}
