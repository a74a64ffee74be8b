// Shared helpers for integration tests.
//
// Provides a temporary home directory and data directory pair and a fluent
// builder so each integration test can set up an isolated environment
// without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use konfsave::cli::GlobalOpts;

/// Minimal configuration: two default groups and one exception.
pub const MINIMAL_CONFIG: &str = "\
[Defaults]
default-groups = :kde, :gtk
exceptions = ~/.config/secret.conf

[Paths]
~/.config/kdeglobals = :plasma
~/.config/kwinrc = :kwin
~/.config/gtk-3.0 = :gtk
~/.config/secret.conf = :plasma

[Metagroups]
:kde = :plasma, :kwin
";

/// An isolated home directory plus konfsave data directory backed by a
/// [`tempfile::TempDir`].
///
/// Both directories are deleted when the context is dropped.
pub struct IntegrationTestContext {
    /// Temporary directory holding `home/` and `data/`.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create a new context with [`MINIMAL_CONFIG`] in place.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("home")).expect("create home dir");
        std::fs::create_dir_all(root.path().join("data")).expect("create data dir");
        std::fs::write(root.path().join("data/konfsave.ini"), MINIMAL_CONFIG)
            .expect("write konfsave.ini");
        Self { root }
    }

    /// The fake home directory.
    pub fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    /// The konfsave data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    /// Storage directory of profile `name`.
    pub fn profile_dir(&self, name: &str) -> PathBuf {
        self.data_dir().join("profiles").join(name)
    }

    /// Global options pointing every command at this context.
    pub fn global(&self) -> GlobalOpts {
        GlobalOpts {
            dry_run: false,
            data_dir: Some(self.data_dir()),
            home: Some(self.home()),
        }
    }

    /// Write `content` to `rel` below the home directory.
    pub fn write_home(&self, rel: &str, content: &str) {
        write_file(&self.home().join(rel), content);
    }

    /// Read `rel` below the home directory.
    pub fn read_home(&self, rel: &str) -> String {
        std::fs::read_to_string(self.home().join(rel)).expect("read home file")
    }

    /// Contents of the active-profile pointer, if any.
    pub fn active_pointer(&self) -> Option<String> {
        std::fs::read_to_string(self.data_dir().join("current_profile")).ok()
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a new context with the minimal configuration.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Replace `konfsave.ini`.
    pub fn with_config(self, content: &str) -> Self {
        std::fs::write(self.ctx.data_dir().join("konfsave.ini"), content)
            .expect("write konfsave.ini");
        self
    }

    /// Create a file below the home directory.
    pub fn with_home_file(self, rel: &str, content: &str) -> Self {
        self.ctx.write_home(rel, content);
        self
    }

    /// Create a saved profile holding `files` and a record named `name`.
    pub fn with_profile(self, name: &str, files: &[(&str, &str)]) -> Self {
        let dir = self.ctx.profile_dir(name);
        for (rel, content) in files {
            write_file(&dir.join(rel), content);
        }
        write_file(
            &dir.join(".konfsave_profile"),
            &format!("{{\n  \"name\": \"{name}\"\n}}\n"),
        );
        self
    }

    /// Mark `name` as the active profile.
    pub fn with_active(self, name: &str) -> Self {
        let record = std::fs::read(self.ctx.profile_dir(name).join(".konfsave_profile"))
            .expect("read record");
        std::fs::write(self.ctx.data_dir().join("current_profile"), record)
            .expect("write pointer");
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}
