//! The transfer engine: copies a resolved path set between the home
//! directory and a profile's storage directory.
//!
//! Copies are additive. Files already in the destination that are not part
//! of the resolved set are never removed, and directories are merged rather
//! than replaced. Every path is handled independently; a failure is logged
//! and counted and the remaining paths still run.
pub mod fs;

use std::path::{Path, PathBuf};

use crate::error::TransferError;
use crate::logging::Log;
use crate::paths::{display_tilde, relative_to_home};
use crate::resolver::ResolvedPathSet;
use fs::CopyKind;

/// Knobs shared by save and load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    /// Copy symlink targets instead of recreating the links.
    pub follow_symlinks: bool,
    /// Report what would be copied without writing anything.
    pub dry_run: bool,
}

/// Counters for one transfer.
///
/// # Examples
///
/// ```
/// use konfsave::transfer::TransferStats;
///
/// let stats = TransferStats { copied: 4, unchanged: 0, skipped: 1, failed: 0 };
/// assert_eq!(stats.summary(false), "4 copied, 1 skipped");
/// assert_eq!(stats.summary(true), "4 would be copied, 1 skipped");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Paths written to the destination.
    pub copied: u32,
    /// Paths whose source and destination were already the same file.
    pub unchanged: u32,
    /// Paths skipped because they were missing or outside the home directory.
    pub skipped: u32,
    /// Paths whose copy failed.
    pub failed: u32,
}

impl TransferStats {
    /// Format the summary line, omitting zero counters after the first.
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would be copied" } else { "copied" };
        let mut parts = vec![format!("{} {verb}", self.copied)];
        if self.unchanged > 0 {
            parts.push(format!("{} unchanged", self.unchanged));
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        parts.join(", ")
    }
}

/// Copies resolved paths in either direction.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    home: PathBuf,
    options: TransferOptions,
}

impl TransferEngine {
    /// Create an engine for `home`.
    #[must_use]
    pub fn new(home: &Path, options: TransferOptions) -> Self {
        Self {
            home: home.to_path_buf(),
            options,
        }
    }

    /// Copy every path of `set` from the home directory into `profile_dir`.
    ///
    /// Paths outside the home directory are skipped with a warning, missing
    /// paths with an informational message.
    pub fn save(&self, set: &ResolvedPathSet, profile_dir: &Path, log: &dyn Log) -> TransferStats {
        let mut stats = TransferStats::default();
        for path in set.iter() {
            let Some(rel) = self.home_relative(path, log) else {
                stats.skipped += 1;
                continue;
            };
            if !exists(path) {
                log.info(&format!(
                    "The path {} doesn't exist. Skipping",
                    display_tilde(path, &self.home)
                ));
                stats.skipped += 1;
                continue;
            }
            self.copy_one(path, &profile_dir.join(rel), log, &mut stats);
        }
        stats
    }

    /// Copy every path of `set` from `profile_dir` back to its place in the
    /// home directory. Paths the profile does not contain are skipped.
    pub fn load(&self, set: &ResolvedPathSet, profile_dir: &Path, log: &dyn Log) -> TransferStats {
        let mut stats = TransferStats::default();
        for path in set.iter() {
            let Some(rel) = self.home_relative(path, log) else {
                stats.skipped += 1;
                continue;
            };
            let source = profile_dir.join(rel);
            if !exists(&source) {
                log.info(&format!("The file {} doesn't exist. Skipping", source.display()));
                stats.skipped += 1;
                continue;
            }
            self.copy_one(&source, path, log, &mut stats);
        }
        stats
    }

    fn home_relative<'p>(&self, path: &'p Path, log: &dyn Log) -> Option<&'p Path> {
        let rel = relative_to_home(path, &self.home);
        if rel.is_none() {
            log.warn(&format!(
                "{}. Skipping",
                TransferError::OutsideHome(path.to_path_buf())
            ));
        }
        rel
    }

    fn copy_one(&self, src: &Path, dst: &Path, log: &dyn Log, stats: &mut TransferStats) {
        if self.options.dry_run {
            log.dry_run(&format!("copy {} -> {}", src.display(), dst.display()));
            stats.copied += 1;
            return;
        }
        match fs::copy_entry(src, dst, self.options.follow_symlinks) {
            Ok(CopyKind::Copied) => {
                log.debug(&format!("copied {} -> {}", src.display(), dst.display()));
                stats.copied += 1;
            }
            Ok(CopyKind::SameFile) => {
                log.debug(&format!("{} is already in place", dst.display()));
                stats.unchanged += 1;
            }
            Err(source) => {
                let err = TransferError::Io {
                    path: src.to_path_buf(),
                    source,
                };
                log.error(&err.to_string());
                stats.failed += 1;
            }
        }
    }
}

/// Existence without following the final symlink, so dangling links count.
fn exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}
