//! Filesystem layout and path normalisation.
//!
//! Every location konfsave touches is derived from two roots: the user's
//! home directory and the konfsave data directory
//! (`$XDG_CONFIG_HOME/konfsave`, default `~/.config/konfsave`).
//!
//! ```text
//! <data dir>/
//! ├── konfsave.ini          configuration (created from the bundled default)
//! ├── current_profile       copy of the active profile's record
//! └── profiles/
//!     └── <name>/
//!         ├── .konfsave_profile
//!         └── <home-relative files>
//! ```
use std::path::{Component, Path, PathBuf};

use anyhow::Result;

/// File name of the record stored inside each profile directory.
pub const PROFILE_RECORD_FILENAME: &str = ".konfsave_profile";

/// File name of the active-profile pointer inside the data directory.
pub const ACTIVE_PROFILE_FILENAME: &str = "current_profile";

/// File name of the configuration inside the data directory.
pub const CONFIG_FILENAME: &str = "konfsave.ini";

/// Directory (inside the data directory) holding saved profiles.
pub const PROFILES_DIRNAME: &str = "profiles";

/// Suffix appended to the profile name for default archive file names.
pub const ARCHIVE_SUFFIX: &str = ".konfsave.zip";

/// Resolved locations of the home and data directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// The user's home directory; every copied path lives below it.
    pub home: PathBuf,
    /// The konfsave data directory.
    pub data_dir: PathBuf,
}

impl Layout {
    /// Build a layout from explicit roots.
    #[must_use]
    pub const fn new(home: PathBuf, data_dir: PathBuf) -> Self {
        Self { home, data_dir }
    }

    /// Detect the layout from the environment, honouring explicit overrides.
    ///
    /// The home directory comes from `HOME` (`USERPROFILE` first on Windows).
    /// The data directory is `$XDG_CONFIG_HOME/konfsave`, falling back to
    /// `<home>/.config/konfsave`. The home directory is not canonicalised so
    /// that a symlinked home keeps its user-facing spelling.
    ///
    /// # Errors
    ///
    /// Returns an error if no home override is given and neither `HOME` nor
    /// `USERPROFILE` is set.
    pub fn detect(home: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        let home = match home {
            Some(h) => h.to_path_buf(),
            None => PathBuf::from(home_from_env()?),
        };
        let data_dir = match data_dir {
            Some(d) => normalize(&d.to_string_lossy(), &home),
            None => std::env::var_os("XDG_CONFIG_HOME")
                .filter(|v| !v.is_empty())
                .map_or_else(|| home.join(".config"), PathBuf::from)
                .join("konfsave"),
        };
        Ok(Self { home, data_dir })
    }

    /// Directory containing every saved profile.
    #[must_use]
    pub fn profile_home(&self) -> PathBuf {
        self.data_dir.join(PROFILES_DIRNAME)
    }

    /// Storage directory of the profile called `name`.
    #[must_use]
    pub fn profile_dir(&self, name: &str) -> PathBuf {
        self.profile_home().join(name)
    }

    /// Record file of the profile called `name`.
    #[must_use]
    pub fn record_path(&self, name: &str) -> PathBuf {
        self.profile_dir(name).join(PROFILE_RECORD_FILENAME)
    }

    /// Location of the active-profile pointer.
    #[must_use]
    pub fn active_profile_path(&self) -> PathBuf {
        self.data_dir.join(ACTIVE_PROFILE_FILENAME)
    }

    /// Location of `konfsave.ini`.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILENAME)
    }
}

fn home_from_env() -> Result<String> {
    if cfg!(target_os = "windows") {
        std::env::var("USERPROFILE")
            .or_else(|_| std::env::var("HOME"))
            .map_err(|_| anyhow::anyhow!("neither USERPROFILE nor HOME environment variable is set"))
    } else {
        std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))
    }
}

/// Turn a user-supplied path into an absolute, lexically clean path.
///
/// `~` and `~/…` expand to `home`; relative paths are taken relative to
/// `home`. `.` and `..` components are collapsed without touching the
/// filesystem, so symlinks are preserved.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use konfsave::paths::normalize;
///
/// let home = Path::new("/home/u");
/// assert_eq!(normalize("~/.config/kwinrc", home), PathBuf::from("/home/u/.config/kwinrc"));
/// assert_eq!(normalize(".config/../.kde4", home), PathBuf::from("/home/u/.kde4"));
/// assert_eq!(normalize("/etc/hosts", home), PathBuf::from("/etc/hosts"));
/// ```
#[must_use]
pub fn normalize(raw: &str, home: &Path) -> PathBuf {
    let joined = if raw == "~" {
        home.to_path_buf()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        home.join(rest)
    } else {
        let p = Path::new(raw);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            home.join(p)
        }
    };
    clean(&joined)
}

/// Collapse `.` and `..` components lexically.
#[must_use]
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Return `path` relative to `home`, or `None` if it lies outside it.
///
/// The home directory itself is not considered to be inside the home
/// directory.
#[must_use]
pub fn relative_to_home<'a>(path: &'a Path, home: &Path) -> Option<&'a Path> {
    path.strip_prefix(home)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
}

/// Render `path` with the home directory abbreviated to `~`.
#[must_use]
pub fn display_tilde(path: &Path, home: &Path) -> String {
    relative_to_home(path, home).map_or_else(
        || path.display().to_string(),
        |rel| format!("~/{}", rel.display()),
    )
}
