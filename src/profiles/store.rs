//! CRUD over profile records and the active-profile pointer.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{Lookup, NameRule, ProfileRecord};
use crate::error::ProfileError;
use crate::logging::Log;
use crate::paths::Layout;
use crate::prompt::{Confirm, Outcome};
use crate::transfer::fs::{remove_existing, write_atomic};

/// Attribute updates applied by [`ProfileStore::change`].
///
/// `None` leaves a field as it is. An empty `author` or `description`
/// clears the field; an empty list clears the stored list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordChanges {
    /// New name; the storage directory is renamed too.
    pub name: Option<String>,
    /// New author.
    pub author: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement for the supported groups.
    pub groups: Option<Vec<String>>,
    /// Replacement for the stored include list.
    pub include: Option<Vec<String>>,
    /// Replacement for the stored exclude list.
    pub exclude: Option<Vec<String>>,
}

impl RecordChanges {
    /// Return `true` if nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.author.is_none()
            && self.description.is_none()
            && self.groups.is_none()
            && self.include.is_none()
            && self.exclude.is_none()
    }

    fn apply(self, record: &mut ProfileRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(author) = self.author {
            record.author = Some(author).filter(|a| !a.is_empty());
        }
        if let Some(description) = self.description {
            record.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(groups) = self.groups {
            record.groups = Some(groups);
        }
        if let Some(include) = self.include {
            record.include = include;
        }
        if let Some(exclude) = self.exclude {
            record.exclude = exclude;
        }
    }
}

/// What a batch delete did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Profiles whose storage was removed.
    pub deleted: Vec<String>,
    /// Requested names with no saved profile.
    pub missing: Vec<String>,
}

/// Reads and writes profile records under one data directory.
///
/// Successful reads are cached for the lifetime of the store; every write
/// drops the cached entry for the name it touches.
#[derive(Debug)]
pub struct ProfileStore {
    layout: Layout,
    rule: NameRule,
    cache: RefCell<HashMap<Option<String>, ProfileRecord>>,
}

impl ProfileStore {
    /// Create a store over `layout`, validating names with `rule`.
    #[must_use]
    pub fn new(layout: Layout, rule: NameRule) -> Self {
        Self {
            layout,
            rule,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Locations the store works in.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The profile naming rule.
    #[must_use]
    pub const fn rule(&self) -> &NameRule {
        &self.rule
    }

    /// Read the record of `name`, or the active-profile pointer when `name`
    /// is `None`.
    ///
    /// Absence is [`Lookup::NotFound`]; an unreadable, malformed or
    /// invalid-name record is [`Lookup::Invalid`] and is reported as a
    /// warning.
    pub fn read(&self, name: Option<&str>, log: &dyn Log) -> Lookup {
        let key = name.map(str::to_string);
        let cached = self.cache.borrow().get(&key).cloned();
        if let Some(record) = cached {
            return Lookup::Found(record);
        }
        let path = match name {
            Some(n) if !self.rule.is_valid(n) => {
                log.warn(&ProfileError::InvalidName(n.to_string()).to_string());
                return Lookup::NotFound;
            }
            Some(n) => self.layout.record_path(n),
            None => self.layout.active_profile_path(),
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Lookup::NotFound,
            Err(e) => return invalid(path, e.to_string(), log),
        };
        match ProfileRecord::from_json(&text, &self.rule) {
            Ok(record) => {
                self.cache.borrow_mut().insert(key, record.clone());
                Lookup::Found(record)
            }
            Err(reason) => invalid(path, reason, log),
        }
    }

    /// Name of the active profile, if the pointer holds a valid record.
    pub fn active_name(&self, log: &dyn Log) -> Option<String> {
        self.read(None, log).found().map(|r| r.name)
    }

    /// Return `true` if a storage directory exists for `name`.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.rule.is_valid(name) && self.layout.profile_dir(name).is_dir()
    }

    /// Names of every saved profile with a valid name and a record file,
    /// sorted case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile directory exists but cannot be listed.
    pub fn list(&self) -> Result<Vec<String>, ProfileError> {
        let home = self.layout.profile_home();
        let entries = match fs::read_dir(&home) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(ProfileError::Io { path: home, source }),
        };
        let mut names: Vec<String> = entries
            .flatten()
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| self.rule.is_valid(n) && self.layout.record_path(n).is_file())
            .collect();
        names.sort_by_key(|n| n.to_lowercase());
        Ok(names)
    }

    /// Write `record` into its profile's storage directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, serialisation fails, or the
    /// file cannot be written. Nothing is written on error.
    pub fn write(&self, record: &ProfileRecord) -> Result<(), ProfileError> {
        self.rule.validate(&record.name)?;
        record.write_into(&self.layout.profile_dir(&record.name))?;
        self.forget(Some(&record.name));
        Ok(())
    }

    /// Make `name` the active profile by copying its record to the pointer.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read or the pointer written.
    pub fn activate(&self, name: &str) -> Result<(), ProfileError> {
        self.rule.validate(name)?;
        let source = self.layout.record_path(name);
        let bytes = fs::read(&source).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ProfileError::NotFound(name.to_string()),
            _ => ProfileError::Io {
                path: source.clone(),
                source: e,
            },
        })?;
        let pointer = self.layout.active_profile_path();
        write_atomic(&pointer, &bytes).map_err(|source| ProfileError::Io {
            path: pointer,
            source,
        })?;
        self.forget(None);
        Ok(())
    }

    /// Remove the active-profile pointer. Home files are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer exists but cannot be removed.
    pub fn clear_active(&self) -> Result<(), ProfileError> {
        let pointer = self.layout.active_profile_path();
        remove_existing(&pointer).map_err(|source| ProfileError::Io {
            path: pointer,
            source,
        })?;
        self.forget(None);
        Ok(())
    }

    /// Rename a saved profile: move its directory, then rewrite its record.
    ///
    /// If `old` was active, the pointer follows the new name.
    ///
    /// # Errors
    ///
    /// [`ProfileError::InvalidName`] for a bad `new`,
    /// [`ProfileError::AlreadyExists`] if `new` is taken,
    /// [`ProfileError::NotFound`] if `old` does not exist, or an I/O error.
    /// On error both profiles' storage is left as it was.
    pub fn rename(&self, old: &str, new: &str, log: &dyn Log) -> Result<(), ProfileError> {
        self.rule.validate(new)?;
        let target = self.layout.profile_dir(new);
        if target.exists() {
            return Err(ProfileError::AlreadyExists {
                name: new.to_string(),
                path: target,
            });
        }
        if !self.exists(old) {
            return Err(ProfileError::NotFound(old.to_string()));
        }
        let was_active = self.active_name(log).as_deref() == Some(old);
        let mut record = self.read(Some(old), log).found().unwrap_or_else(|| {
            log.warn(&format!(
                "The profile \"{old}\" has no valid record; a new one will be written"
            ));
            ProfileRecord::new(old)
        });
        record.name = new.to_string();

        let source = self.layout.profile_dir(old);
        fs::rename(&source, &target).map_err(|e| ProfileError::Io {
            path: source.clone(),
            source: e,
        })?;
        self.forget(Some(old));
        if let Err(e) = self.write(&record) {
            // Put the directory back so the old name keeps working
            move_back(&target, &source, log);
            return Err(e);
        }
        if was_active {
            self.activate(new)?;
        }
        log.debug(&format!("renamed profile {old} to {new}"));
        Ok(())
    }

    /// Delete a batch of profiles after a single confirmation.
    ///
    /// Names without a saved profile are reported and skipped. Deleting the
    /// active profile clears the pointer; home files are never touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt fails or a directory cannot be removed.
    pub fn delete(
        &self,
        names: &[String],
        confirm: &dyn Confirm,
        log: &dyn Log,
    ) -> Result<Outcome<DeleteSummary>> {
        let mut summary = DeleteSummary::default();
        let mut present = Vec::new();
        for name in names {
            if self.exists(name) {
                if !present.contains(name) {
                    present.push(name.clone());
                }
            } else {
                log.error(&ProfileError::NotFound(name.clone()).to_string());
                summary.missing.push(name.clone());
            }
        }
        if present.is_empty() {
            return Ok(Outcome::Completed(summary));
        }

        let listed = present
            .iter()
            .map(|n| format!("\"{n}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = if present.len() == 1 {
            format!("You're about to delete the profile {listed}. Permanently delete it?")
        } else {
            format!("You're about to delete the profiles {listed}. Permanently delete all of them?")
        };
        if !confirm.confirm(&prompt)? {
            return Ok(Outcome::Cancelled);
        }

        let active = self.active_name(log);
        for name in present {
            let dir = self.layout.profile_dir(&name);
            fs::remove_dir_all(&dir).map_err(|source| ProfileError::Io { path: dir, source })?;
            self.forget(Some(&name));
            log.info(&format!("Deleted profile \"{name}\""));
            if active.as_deref() == Some(name.as_str()) {
                self.clear_active()?;
                log.info(&format!("\"{name}\" was active; no profile is active now"));
            }
            summary.deleted.push(name);
        }
        Ok(Outcome::Completed(summary))
    }

    /// Update stored attributes of `name`, renaming it if the name changes.
    ///
    /// Returns the record as written.
    ///
    /// # Errors
    ///
    /// [`ProfileError::NotFound`] if `name` has no valid record, or any
    /// error from [`rename`](Self::rename) and [`write`](Self::write).
    pub fn change(
        &self,
        name: &str,
        changes: RecordChanges,
        log: &dyn Log,
    ) -> Result<ProfileRecord, ProfileError> {
        let mut record = self
            .read(Some(name), log)
            .found()
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))?;
        if let Some(new) = &changes.name {
            self.rule.validate(new)?;
        }
        changes.apply(&mut record);

        if record.name != name {
            self.rename(name, &record.name, log)?;
        }
        self.write(&record)?;
        if self.active_name(log).as_deref() == Some(record.name.as_str()) {
            self.activate(&record.name)?;
        }
        Ok(record)
    }

    fn forget(&self, name: Option<&str>) {
        self.cache.borrow_mut().remove(&name.map(str::to_string));
    }
}

fn invalid(path: PathBuf, reason: String, log: &dyn Log) -> Lookup {
    log.warn(&format!(
        "Malformed profile record at {}: {reason}",
        path.display()
    ));
    Lookup::Invalid { path, reason }
}

/// Undo a directory move, reporting when that fails too.
fn move_back(from: &Path, to: &Path, log: &dyn Log) {
    if let Err(e) = fs::rename(from, to) {
        log.error(&format!(
            "could not move {} back to {}: {e}",
            from.display(),
            to.display()
        ));
    }
}
