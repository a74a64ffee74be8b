//! File-system copy primitives used by the transfer engine and the store.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What [`copy_entry`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyKind {
    /// Contents (or a link) were written to the destination.
    Copied,
    /// Source and destination are the same file; nothing was done.
    SameFile,
}

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Remove whatever is at `path`: a file, a symlink (broken or not), or a
/// directory tree. Does nothing if `path` does not exist.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_existing(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Return `true` if both paths resolve to the same existing file.
#[must_use]
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy `src` to `dst`, creating parent directories first.
///
/// Directories are merged into an existing destination directory; files
/// already there and not present in `src` are left alone. With
/// `follow_symlinks` off, symlinks are recreated as symlinks; with it on,
/// their targets are copied.
///
/// # Errors
///
/// Returns an error if reading `src` or writing `dst` fails.
pub fn copy_entry(src: &Path, dst: &Path, follow_symlinks: bool) -> io::Result<CopyKind> {
    if is_same_file(src, dst) {
        return Ok(CopyKind::SameFile);
    }
    let meta = if follow_symlinks {
        fs::metadata(src)?
    } else {
        fs::symlink_metadata(src)?
    };
    ensure_parent_dir(dst)?;
    if meta.file_type().is_symlink() {
        copy_symlink(src, dst)?;
    } else if meta.is_dir() {
        copy_dir_merge(src, dst, follow_symlinks)?;
    } else {
        copy_file_into_place(src, dst)?;
    }
    Ok(CopyKind::Copied)
}

/// Recursively copy `src` into `dst`, merging with existing contents.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or an entry cannot be
/// copied.
pub fn copy_dir_merge(src: &Path, dst: &Path, follow_symlinks: bool) -> io::Result<()> {
    if fs::symlink_metadata(dst).is_ok_and(|m| !m.is_dir()) {
        remove_existing(dst)?;
    }
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        copy_entry(&entry.path(), &dst.join(entry.file_name()), follow_symlinks)?;
    }
    Ok(())
}

/// Write `contents` to `path` through a sibling temporary file and a rename,
/// so readers never observe a partial file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let tmp = sibling_temp(path);
    if let Err(e) = fs::write(&tmp, contents) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Sibling temp name; keeps the final rename on the same filesystem.
fn sibling_temp(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "konfsave".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.konfsave_tmp"))
}

/// Copy a regular file: stage into a sibling temp file, then rename over
/// the target. A symlink at the target is replaced, not written through.
fn copy_file_into_place(src: &Path, dst: &Path) -> io::Result<()> {
    if fs::symlink_metadata(dst).is_ok_and(|m| m.is_dir()) {
        fs::remove_dir_all(dst)?;
    }
    let tmp = sibling_temp(dst);
    if let Err(e) = fs::copy(src, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, dst) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    remove_existing(dst)?;
    create_symlink(&target, dst, src)
}

/// Create a symlink at `link` pointing to `target`, replacing whatever is
/// there.
///
/// # Errors
///
/// Returns an error if the old entry cannot be removed or the link created.
pub fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    remove_existing(link)?;
    let resolved = link
        .parent()
        .map_or_else(|| target.to_path_buf(), |parent| parent.join(target));
    create_symlink(target, link, &resolved)
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path, _original: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path, original: &Path) -> io::Result<()> {
    if fs::metadata(original).is_ok_and(|m| m.is_dir()) {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Path, link: &Path, _original: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot create symlink {}", link.display()),
    ))
}
