//! Profile archives.
//!
//! An archive is a ZIP file holding a profile's storage tree verbatim. The
//! record travels as the `.konfsave_profile` member; on import it is parsed
//! first to learn the profile name, skipped during extraction, and written
//! again only after every other member was extracted.
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read as _};
use std::path::{Path, PathBuf};

use anyhow::Result;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{ArchiveError, ProfileError};
use crate::logging::Log;
use crate::paths::{ARCHIVE_SUFFIX, PROFILE_RECORD_FILENAME};
use crate::profiles::{ProfileRecord, ProfileStore};
use crate::prompt::{Confirm, Outcome};
use crate::transfer::fs::{ensure_parent_dir, remove_existing, symlink};

const S_IFMT: u32 = 0o170_000;
const S_IFLNK: u32 = 0o120_000;

const UNTRUSTED_WARNING: &str = "You're about to extract a profile that may have been created by someone else.\n\
Profiles can contain any file within the home directory, not just configuration.\n\
Unarchiving does not load the profile, but loading a profile from an untrusted source\n\
can overwrite personal data.\n\
Have you gone through the archive and made sure that every file is expected?";

/// How archive members are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Compression {
    /// No compression.
    Store,
    /// DEFLATE.
    #[default]
    Deflate,
}

impl Compression {
    const fn method(self) -> CompressionMethod {
        match self {
            Self::Store => CompressionMethod::Stored,
            Self::Deflate => CompressionMethod::Deflated,
        }
    }
}

/// Settings for [`archive_profile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Full path of the archive; defaults to `<archive dir>/<name>.konfsave.zip`.
    pub destination: Option<PathBuf>,
    /// Replace an existing file at the destination.
    pub overwrite: bool,
    /// How members are stored.
    pub compression: Compression,
    /// Compression level 1-9; ignored for [`Compression::Store`].
    pub level: Option<u8>,
}

/// Settings for [`unarchive_profile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnarchiveOptions {
    /// Import under this name instead of the one in the archive.
    pub name: Option<String>,
    /// Extract over an existing profile instead of replacing it.
    pub overwrite: bool,
    /// Skip every prompt; an existing profile without `overwrite` is then a
    /// conflict.
    pub noconfirm: bool,
}

/// Default archive location for `name`.
#[must_use]
pub fn default_destination(archive_dir: &Path, name: &str) -> PathBuf {
    archive_dir.join(format!("{name}{ARCHIVE_SUFFIX}"))
}

/// Write the profile `name` into a ZIP archive and return its path.
///
/// # Errors
///
/// [`ArchiveError::NotAProfile`] if `name` has no valid record,
/// [`ArchiveError::DestinationExists`] if the file exists and `overwrite`
/// is off, or an I/O or ZIP error. A partially written archive is removed.
pub fn archive_profile(
    store: &ProfileStore,
    name: &str,
    archive_dir: &Path,
    options: &ArchiveOptions,
    log: &dyn Log,
) -> Result<PathBuf, ArchiveError> {
    let record = store
        .read(Some(name), log)
        .found()
        .ok_or_else(|| ArchiveError::NotAProfile(name.to_string()))?;
    let profile_dir = store.layout().profile_dir(name);
    let destination = options
        .destination
        .clone()
        .unwrap_or_else(|| default_destination(archive_dir, &record.name));

    let file = open_destination(&destination, options.overwrite)?;
    log.stage(&format!(
        "Archiving \"{name}\" into {}",
        destination.display()
    ));
    if let Err(e) = write_archive(file, &profile_dir, options, &destination, log) {
        let _ = fs::remove_file(&destination);
        return Err(e);
    }
    Ok(destination)
}

fn open_destination(path: &Path, overwrite: bool) -> Result<File, ArchiveError> {
    ensure_parent_dir(path).map_err(io_err(path))?;
    let opened = if overwrite {
        File::create(path)
    } else {
        OpenOptions::new().write(true).create_new(true).open(path)
    };
    opened.map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => ArchiveError::DestinationExists(path.to_path_buf()),
        _ => io_err(path)(e),
    })
}

fn write_archive(
    file: File,
    profile_dir: &Path,
    options: &ArchiveOptions,
    destination: &Path,
    log: &dyn Log,
) -> Result<(), ArchiveError> {
    let mut file_options = SimpleFileOptions::default().compression_method(options.compression.method());
    if options.compression == Compression::Deflate {
        file_options = file_options.compression_level(options.level.map(i64::from));
    }

    let mut entries = Vec::new();
    collect_entries(profile_dir, profile_dir, &mut entries).map_err(io_err(profile_dir))?;

    let mut zip = ZipWriter::new(file);
    for entry in &entries {
        let member = member_name(&entry.rel);
        let on_zip_err = zip_err(destination);
        match entry.kind {
            EntryKind::Dir => zip.add_directory(member, file_options).map_err(on_zip_err)?,
            EntryKind::Symlink => {
                let target = fs::read_link(&entry.path).map_err(io_err(&entry.path))?;
                zip.add_symlink(member, target.to_string_lossy().into_owned(), file_options)
                    .map_err(on_zip_err)?;
            }
            EntryKind::File => {
                zip.start_file(member, file_options).map_err(on_zip_err)?;
                let mut source = File::open(&entry.path).map_err(io_err(&entry.path))?;
                io::copy(&mut source, &mut zip).map_err(io_err(&entry.path))?;
            }
        }
        log.debug(&format!("archived {}", entry.rel.display()));
    }
    zip.finish().map_err(zip_err(destination))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    Symlink,
    File,
}

#[derive(Debug)]
struct Entry {
    path: PathBuf,
    rel: PathBuf,
    kind: EntryKind,
}

/// Every entry below `dir`, depth first, in a stable order.
fn collect_entries(root: &Path, dir: &Path, out: &mut Vec<Entry>) -> io::Result<()> {
    let mut children: Vec<_> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;
    children.sort_by_key(fs::DirEntry::file_name);
    for child in children {
        let path = child.path();
        let file_type = child.file_type()?;
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        out.push(Entry {
            path: path.clone(),
            rel,
            kind,
        });
        if kind == EntryKind::Dir {
            collect_entries(root, &path, out)?;
        }
    }
    Ok(())
}

/// ZIP member names always use `/`.
fn member_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Import an archive into the profile store without loading it.
///
/// Returns the name the profile was stored under.
///
/// # Errors
///
/// [`ArchiveError::UnknownName`] if the archive has no valid record and no
/// name was given, an invalid-name or conflict error, or any I/O or ZIP
/// failure. On failure a replaced profile is restored from its backup.
pub fn unarchive_profile(
    store: &ProfileStore,
    source: &Path,
    options: &UnarchiveOptions,
    confirm: &dyn Confirm,
    log: &dyn Log,
) -> Result<Outcome<String>> {
    let file = File::open(source).map_err(io_err(source))?;
    let mut archive = ZipArchive::new(file).map_err(zip_err(source))?;

    let stored = read_archived_record(&mut archive, source, store, log)?;
    let name = match (&options.name, &stored) {
        (Some(name), _) => name.clone(),
        (None, Some(record)) => record.name.clone(),
        (None, None) => return Err(ArchiveError::UnknownName(source.to_path_buf()).into()),
    };
    store.rule().validate(&name).map_err(ArchiveError::from)?;
    let mut record = stored.unwrap_or_else(|| ProfileRecord::new(&name));
    record.name.clone_from(&name);

    if !options.noconfirm && !confirm.confirm(UNTRUSTED_WARNING)? {
        return Ok(Outcome::Cancelled);
    }

    let destination = store.layout().profile_dir(&name);
    let existed = destination.exists();
    let mut backup = None;
    if existed && !options.overwrite {
        if options.noconfirm {
            return Err(ArchiveError::from(ProfileError::AlreadyExists {
                name,
                path: destination,
            })
            .into());
        }
        let prompt = format!("The profile \"{name}\" is already saved. Overwrite it?");
        if !confirm.confirm(&prompt)? {
            return Ok(Outcome::Cancelled);
        }
        backup = Some(move_to_backup(&destination, log)?);
    }

    log.stage(&format!("Unarchiving {} as \"{name}\"", source.display()));
    let extracted = extract_members(&mut archive, source, &destination, log)
        .and_then(|()| store.write(&record).map_err(ArchiveError::from));
    match extracted {
        Ok(()) => {
            if let Some(backup) = &backup {
                remove_existing(backup).map_err(io_err(backup))?;
            }
            Ok(Outcome::Completed(name))
        }
        Err(e) => {
            log.error("Unarchiving failed");
            if !existed || backup.is_some() {
                let _ = remove_existing(&destination);
            }
            if let Some(backup) = &backup {
                fs::rename(backup, &destination).map_err(io_err(backup))?;
                log.warn(&format!(
                    "The previous version of \"{name}\" was restored to {}",
                    destination.display()
                ));
            }
            Err(e.into())
        }
    }
}

fn read_archived_record(
    archive: &mut ZipArchive<File>,
    source: &Path,
    store: &ProfileStore,
    log: &dyn Log,
) -> Result<Option<ProfileRecord>, ArchiveError> {
    let mut text = String::new();
    match archive.by_name(PROFILE_RECORD_FILENAME) {
        Ok(mut member) => {
            if let Err(e) = member.read_to_string(&mut text) {
                log.warn(&format!("cannot read the record in {}: {e}", source.display()));
                return Ok(None);
            }
        }
        Err(zip::result::ZipError::FileNotFound) => {
            log.warn(&format!(
                "The archive {} has no {PROFILE_RECORD_FILENAME}",
                source.display()
            ));
            return Ok(None);
        }
        Err(e) => return Err(zip_err(source)(e)),
    }
    match ProfileRecord::from_json(&text, store.rule()) {
        Ok(record) => Ok(Some(record)),
        Err(reason) => {
            log.warn(&format!(
                "The archive {} has a malformed {PROFILE_RECORD_FILENAME}: {reason}",
                source.display()
            ));
            Ok(None)
        }
    }
}

fn move_to_backup(destination: &Path, log: &dyn Log) -> Result<PathBuf, ArchiveError> {
    let mut name = destination.as_os_str().to_owned();
    name.push(".bkp");
    let backup = PathBuf::from(name);
    if backup.exists() {
        log.warn(&format!(
            "The backup {} already exists. It will be overwritten",
            backup.display()
        ));
        remove_existing(&backup).map_err(io_err(&backup))?;
    }
    fs::rename(destination, &backup).map_err(io_err(destination))?;
    log.debug(&format!("backed up {} to {}", destination.display(), backup.display()));
    Ok(backup)
}

/// Extract every member except the record below `destination`.
fn extract_members(
    archive: &mut ZipArchive<File>,
    source: &Path,
    destination: &Path,
    log: &dyn Log,
) -> Result<(), ArchiveError> {
    fs::create_dir_all(destination).map_err(io_err(destination))?;
    for index in 0..archive.len() {
        let mut member = archive.by_index(index).map_err(zip_err(source))?;
        let Some(rel) = member.enclosed_name() else {
            log.warn(&format!("skipping unsafe member name {}", member.name()));
            continue;
        };
        if rel.as_os_str().is_empty() || rel == Path::new(PROFILE_RECORD_FILENAME) {
            continue;
        }
        if let Some(link) = linked_ancestor(destination, &rel) {
            log.warn(&format!(
                "skipping {}: {} is a symbolic link",
                rel.display(),
                link.display()
            ));
            continue;
        }
        let target = destination.join(&rel);
        let is_symlink = member
            .unix_mode()
            .is_some_and(|mode| mode & S_IFMT == S_IFLNK);
        if member.is_dir() {
            fs::create_dir_all(&target).map_err(io_err(&target))?;
        } else if is_symlink {
            let mut link_target = String::new();
            member
                .read_to_string(&mut link_target)
                .map_err(io_err(&target))?;
            ensure_parent_dir(&target).map_err(io_err(&target))?;
            symlink(Path::new(&link_target), &target).map_err(io_err(&target))?;
        } else {
            ensure_parent_dir(&target).map_err(io_err(&target))?;
            remove_existing(&target).map_err(io_err(&target))?;
            let mut out = File::create(&target).map_err(io_err(&target))?;
            io::copy(&mut member, &mut out).map_err(io_err(&target))?;
        }
        log.debug(&format!("extracted {}", rel.display()));
    }
    Ok(())
}

/// First proper ancestor of `rel` below `destination` that exists as a
/// symbolic link. Writing through it would land outside the profile.
fn linked_ancestor(destination: &Path, rel: &Path) -> Option<PathBuf> {
    rel.ancestors()
        .skip(1)
        .filter(|a| !a.as_os_str().is_empty())
        .map(|a| destination.join(a))
        .find(|p| fs::symlink_metadata(p).is_ok_and(|m| m.file_type().is_symlink()))
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn zip_err(path: &Path) -> impl FnOnce(zip::result::ZipError) -> ArchiveError + '_ {
    move |source| ArchiveError::Zip {
        path: path.to_path_buf(),
        source,
    }
}
