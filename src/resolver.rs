//! The path resolver: computes the exact set of files an operation acts on.
//!
//! Inputs are layered, highest precedence first:
//!
//! 1. caller `include` (this invocation only),
//! 2. caller `exclude`,
//! 3. the profile's stored `include`/`exclude`,
//! 4. the configured default groups and the global exception set.
//!
//! Every group is resolved through the [`GroupCatalog`] and every directory
//! is expanded into the files below it before the set algebra runs:
//!
//! ```text
//! excluded = (caller_exclude ∪ exceptions ∪ (profile_exclude − profile_include)) − caller_include
//! included = (caller_include ∪ profile_include) − excluded
//! result   = (defaults ∪ included) − excluded
//! ```
//!
//! Resolution is pure apart from reading directory listings; whether a path
//! exists or lies inside the home directory is checked at transfer time.
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::config::groups::{GroupCatalog, is_group_name};
use crate::logging::Log;
use crate::paths;
use crate::profiles::ProfileRecord;

/// One include/exclude/default item: a literal path or a group reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PathSpec {
    /// An absolute, lexically normalised path.
    Path(PathBuf),
    /// A group name including its `:` prefix.
    Group(String),
}

impl PathSpec {
    /// Interpret a raw item: a leading `:` makes it a group, anything else
    /// is a path relative to `home` unless absolute.
    #[must_use]
    pub fn parse(raw: &str, home: &Path) -> Self {
        let raw = raw.trim();
        if is_group_name(raw) {
            Self::Group(raw.to_string())
        } else {
            Self::Path(paths::normalize(raw, home))
        }
    }

    /// Parse every item of `raw`.
    #[must_use]
    pub fn parse_all<S: AsRef<str>>(raw: &[S], home: &Path) -> Vec<Self> {
        raw.iter().map(|r| Self::parse(r.as_ref(), home)).collect()
    }
}

/// Where the default set comes from.
///
/// The three states are deliberately distinct: an empty explicit list is
/// not the same as "use the configuration".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Defaults {
    /// The configured `default-groups`.
    #[default]
    Configured,
    /// A caller-supplied replacement for the configured groups.
    Explicit(Vec<PathSpec>),
    /// No defaults: only includes contribute.
    Empty,
}

/// Everything one resolution needs besides the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Caller includes; they override every exclude and the exceptions.
    pub include: Vec<PathSpec>,
    /// Caller excludes.
    pub exclude: Vec<PathSpec>,
    /// Includes stored in the profile record.
    pub profile_include: Vec<PathSpec>,
    /// Excludes stored in the profile record; lose to any include.
    pub profile_exclude: Vec<PathSpec>,
    /// Source of the default set.
    pub defaults: Defaults,
}

impl Request {
    /// A request with caller overrides only.
    #[must_use]
    pub fn new(include: Vec<PathSpec>, exclude: Vec<PathSpec>) -> Self {
        Self {
            include,
            exclude,
            ..Self::default()
        }
    }

    /// A request from raw command-line items.
    #[must_use]
    pub fn from_raw<S: AsRef<str>>(include: &[S], exclude: &[S], home: &Path) -> Self {
        Self::new(PathSpec::parse_all(include, home), PathSpec::parse_all(exclude, home))
    }

    /// Layer the stored overrides of `record` under the caller's.
    #[must_use]
    pub fn with_profile(mut self, record: &ProfileRecord, home: &Path) -> Self {
        self.profile_include = PathSpec::parse_all(&record.include, home);
        self.profile_exclude = PathSpec::parse_all(&record.exclude, home);
        self
    }

    /// Replace the source of the default set.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }
}

/// The final, deduplicated set of absolute file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPathSet(BTreeSet<PathBuf>);

impl ResolvedPathSet {
    /// Number of paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` if nothing resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return `true` if `path` is part of the set.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.0.contains(path)
    }

    /// Iterate in byte order.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.0.iter()
    }

    /// Paths ordered case-insensitively, for display.
    #[must_use]
    pub fn sorted_for_display(&self) -> Vec<&PathBuf> {
        let mut v: Vec<_> = self.0.iter().collect();
        v.sort_by_key(|p| p.to_string_lossy().to_lowercase());
        v
    }

    /// Consume the set.
    #[must_use]
    pub fn into_inner(self) -> BTreeSet<PathBuf> {
        self.0
    }
}

impl FromIterator<PathBuf> for ResolvedPathSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Computes resolved path sets against one catalog.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    catalog: &'a GroupCatalog,
    default_groups: Vec<PathSpec>,
    exceptions: Vec<PathSpec>,
    home: PathBuf,
    source_root: Option<PathBuf>,
}

impl<'a> Resolver<'a> {
    /// Build a resolver from explicit parts.
    #[must_use]
    pub fn new(
        catalog: &'a GroupCatalog,
        default_groups: Vec<PathSpec>,
        exceptions: Vec<PathSpec>,
        home: &Path,
    ) -> Self {
        Self {
            catalog,
            default_groups,
            exceptions,
            home: home.to_path_buf(),
            source_root: None,
        }
    }

    /// Build a resolver from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &'a Config, home: &Path) -> Self {
        Self::new(
            &config.catalog,
            PathSpec::parse_all(&config.settings.default_groups, home),
            PathSpec::parse_all(&config.settings.exceptions, home),
            home,
        )
    }

    /// Expand directories inside `root` (a profile's storage) instead of the
    /// home directory, mapping every file found back to its home location.
    ///
    /// Used by `load`, so that files present in the profile but not yet in
    /// the home directory are still found.
    #[must_use]
    pub fn rooted_at(mut self, root: &Path) -> Self {
        self.source_root = Some(root.to_path_buf());
        self
    }

    /// Compute the resolved path set for `request`.
    pub fn resolve(&self, request: &Request, log: &dyn Log) -> ResolvedPathSet {
        let caller_include = self.collect(&request.include, log);
        let caller_exclude = self.collect(&request.exclude, log);
        let profile_include = self.collect(&request.profile_include, log);
        let profile_exclude = self.collect(&request.profile_exclude, log);
        let exceptions = self.collect(&self.exceptions, log);

        let excluded: BTreeSet<PathBuf> = caller_exclude
            .into_iter()
            .chain(exceptions)
            .chain(profile_exclude.difference(&profile_include).cloned())
            .filter(|p| !caller_include.contains(p))
            .collect();

        let included = caller_include
            .into_iter()
            .chain(profile_include)
            .filter(|p| !excluded.contains(p));

        let defaults = match &request.defaults {
            Defaults::Configured => self.collect(&self.default_groups, log),
            Defaults::Explicit(specs) => self.collect(specs, log),
            Defaults::Empty => BTreeSet::new(),
        };

        let result: ResolvedPathSet = defaults
            .into_iter()
            .filter(|p| !excluded.contains(p))
            .chain(included)
            .collect();
        log.debug(&format!(
            "resolved {} path(s), {} excluded",
            result.len(),
            excluded.len()
        ));
        result
    }

    /// Resolve groups, then expand directories into files.
    fn collect(&self, specs: &[PathSpec], log: &dyn Log) -> BTreeSet<PathBuf> {
        let mut out = BTreeSet::new();
        for spec in specs {
            match spec {
                PathSpec::Path(p) => self.expand(p, &mut out, log),
                PathSpec::Group(name) => match self.catalog.resolve(name) {
                    Some(paths) => {
                        for p in paths {
                            self.expand(p, &mut out, log);
                        }
                    }
                    None => log.info(&format!("The group {name} is not defined; skipping")),
                },
            }
        }
        out
    }

    /// Add `path` to `out`, replaced by its files if it is a directory.
    fn expand(&self, path: &Path, out: &mut BTreeSet<PathBuf>, log: &dyn Log) {
        let rel = paths::relative_to_home(path, &self.home);
        let probe = match (&self.source_root, rel) {
            (Some(root), Some(rel)) => root.join(rel),
            _ => path.to_path_buf(),
        };
        if is_real_dir(&probe) {
            walk_files(&probe, &probe, path, out, log);
        } else {
            out.insert(path.to_path_buf());
        }
    }
}

/// Return `true` for directories that are not symlinks.
fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

/// Collect every non-directory below `dir`, re-based from `probe_root` onto
/// `target_root`. Symlinks are leaves, so the walk never leaves the tree.
fn walk_files(
    dir: &Path,
    probe_root: &Path,
    target_root: &Path,
    out: &mut BTreeSet<PathBuf>,
    log: &dyn Log,
) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log.warn(&format!("cannot read directory {}: {e}", dir.display()));
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        if is_dir {
            walk_files(&path, probe_root, target_root, out, log);
        } else if let Ok(rel) = path.strip_prefix(probe_root) {
            out.insert(target_root.join(rel));
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::groups::{CatalogBuilder, MetagroupDef};
    use crate::logging::BufferedLog;

    fn home() -> PathBuf {
        PathBuf::from("/home/u")
    }

    fn spec(raw: &str) -> PathSpec {
        PathSpec::parse(raw, &home())
    }

    fn set(items: &[&str]) -> BTreeSet<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    /// `:core` = app.conf, `:extra` = extra.conf, `:secret` = token.
    fn catalog() -> GroupCatalog {
        let mut b = CatalogBuilder::new();
        b.add_path(PathBuf::from("/home/u/.config/app.conf"), ":core")
            .add_path(PathBuf::from("/home/u/.config/extra.conf"), ":extra")
            .add_path(PathBuf::from("/home/u/.config/token"), ":secret")
            .add_metagroup(":all", MetagroupDef::Members(vec![":core".into(), ":extra".into()]));
        b.build().unwrap()
    }

    fn resolve(resolver: &Resolver<'_>, request: &Request) -> BTreeSet<PathBuf> {
        resolver.resolve(request, &BufferedLog::new()).into_inner()
    }

    #[test]
    fn parse_distinguishes_groups_and_paths() {
        assert_eq!(spec(":core"), PathSpec::Group(":core".into()));
        assert_eq!(spec("~/.kde4"), PathSpec::Path(PathBuf::from("/home/u/.kde4")));
        assert_eq!(spec(".kde4"), PathSpec::Path(PathBuf::from("/home/u/.kde4")));
        assert_eq!(spec("/etc/x"), PathSpec::Path(PathBuf::from("/etc/x")));
    }

    #[test]
    fn defaults_only() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![spec(":core")], vec![], &home());
        assert_eq!(
            resolve(&resolver, &Request::default()),
            set(&["/home/u/.config/app.conf"])
        );
    }

    #[test]
    fn caller_exclude_removes_default() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![spec(":core")], vec![], &home());
        let request = Request::new(vec![], vec![spec("~/.config/app.conf")]);
        assert!(resolve(&resolver, &request).is_empty());
    }

    #[test]
    fn caller_include_beats_caller_exclude() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![spec(":core")], vec![], &home());
        let request = Request::new(vec![spec("~/.config/app.conf")], vec![spec(":core")]);
        assert_eq!(resolve(&resolver, &request), set(&["/home/u/.config/app.conf"]));
    }

    #[test]
    fn exceptions_apply_to_defaults_and_profile_include() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![spec(":all")], vec![spec(":secret")], &home());
        let mut request = Request::default();
        request.profile_include = vec![spec(":secret")];
        request.defaults = Defaults::Explicit(vec![spec(":secret"), spec(":core")]);
        assert_eq!(resolve(&resolver, &request), set(&["/home/u/.config/app.conf"]));
    }

    #[test]
    fn caller_include_overrides_exceptions() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![spec(":core")], vec![spec(":secret")], &home());
        let request = Request::new(vec![spec(":secret")], vec![]);
        assert_eq!(
            resolve(&resolver, &request),
            set(&["/home/u/.config/app.conf", "/home/u/.config/token"])
        );
    }

    #[test]
    fn caller_include_beats_profile_exclude() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![spec(":all")], vec![], &home());
        let mut request = Request::new(vec![spec(":extra")], vec![]);
        request.profile_exclude = vec![spec(":extra")];
        assert!(resolve(&resolver, &request).contains(&PathBuf::from("/home/u/.config/extra.conf")));
    }

    #[test]
    fn profile_exclude_removes_defaults() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![spec(":all")], vec![], &home());
        let mut request = Request::default();
        request.profile_exclude = vec![spec(":extra")];
        assert_eq!(resolve(&resolver, &request), set(&["/home/u/.config/app.conf"]));
    }

    #[test]
    fn profile_include_beats_own_exclude() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![], vec![], &home());
        let mut request = Request::default();
        request.profile_include = vec![spec(":extra")];
        request.profile_exclude = vec![spec(":all")];
        assert_eq!(resolve(&resolver, &request), set(&["/home/u/.config/extra.conf"]));
    }

    #[test]
    fn empty_defaults_differ_from_configured() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![spec(":core")], vec![], &home());
        let request = Request::new(vec![spec(":extra")], vec![]).with_defaults(Defaults::Empty);
        assert_eq!(resolve(&resolver, &request), set(&["/home/u/.config/extra.conf"]));
        let explicit_empty =
            Request::new(vec![spec(":extra")], vec![]).with_defaults(Defaults::Explicit(vec![]));
        assert_eq!(resolve(&resolver, &explicit_empty), set(&["/home/u/.config/extra.conf"]));
        let configured = Request::new(vec![spec(":extra")], vec![]);
        assert_eq!(resolve(&resolver, &configured).len(), 2);
    }

    #[test]
    fn undefined_group_is_skipped_with_info() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![spec(":core")], vec![], &home());
        let log = BufferedLog::new();
        let result = resolver.resolve(&Request::new(vec![spec(":ghost")], vec![]), &log);
        assert_eq!(result.len(), 1);
        assert!(log.contains("info", ":ghost"), "{:?}", log.messages());
    }

    #[test]
    fn directories_expand_to_files() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path();
        fs::create_dir_all(home.join(".config/gtk-3.0/sub")).unwrap();
        fs::create_dir_all(home.join(".config/gtk-3.0/empty")).unwrap();
        fs::write(home.join(".config/gtk-3.0/settings.ini"), "a").unwrap();
        fs::write(home.join(".config/gtk-3.0/sub/bookmarks"), "b").unwrap();

        let catalog = GroupCatalog::default();
        let resolver = Resolver::new(&catalog, vec![], vec![], home);
        let request = Request::from_raw(&["~/.config/gtk-3.0"], &[] as &[&str], home);
        assert_eq!(
            resolve(&resolver, &request),
            [
                home.join(".config/gtk-3.0/settings.ini"),
                home.join(".config/gtk-3.0/sub/bookmarks"),
            ]
            .into_iter()
            .collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn excluding_one_file_from_an_included_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path();
        fs::create_dir_all(home.join("dir")).unwrap();
        fs::write(home.join("dir/keep"), "").unwrap();
        fs::write(home.join("dir/drop"), "").unwrap();

        let catalog = GroupCatalog::default();
        let resolver = Resolver::new(&catalog, vec![PathSpec::parse("dir", home)], vec![], home);
        let request = Request::from_raw(&[] as &[&str], &["dir/drop"], home);
        assert_eq!(
            resolve(&resolver, &request),
            std::iter::once(home.join("dir/keep")).collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn rooted_expansion_walks_profile_storage() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path().join("home");
        let profile = tmp.path().join("profile");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(profile.join("Kvantum/theme")).unwrap();
        fs::write(profile.join("Kvantum/theme/a.svg"), "").unwrap();

        let catalog = GroupCatalog::default();
        let resolver = Resolver::new(&catalog, vec![PathSpec::parse("Kvantum", &home)], vec![], &home)
            .rooted_at(&profile);
        assert_eq!(
            resolve(&resolver, &Request::default()),
            std::iter::once(home.join("Kvantum/theme/a.svg")).collect::<BTreeSet<_>>()
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_leaves() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path();
        fs::create_dir_all(home.join("real")).unwrap();
        fs::write(home.join("real/file"), "").unwrap();
        fs::create_dir_all(home.join("conf")).unwrap();
        std::os::unix::fs::symlink(home.join("real"), home.join("conf/link")).unwrap();

        let catalog = GroupCatalog::default();
        let resolver = Resolver::new(&catalog, vec![PathSpec::parse("conf", home)], vec![], home);
        assert_eq!(
            resolve(&resolver, &Request::default()),
            std::iter::once(home.join("conf/link")).collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn display_order_ignores_case() {
        let paths: ResolvedPathSet = ["/h/b", "/h/A", "/h/a2"].into_iter().map(PathBuf::from).collect();
        let shown: Vec<_> = paths.sorted_for_display().iter().map(|p| p.display().to_string()).collect();
        assert_eq!(shown, ["/h/A", "/h/a2", "/h/b"]);
    }

    #[test]
    fn resolution_is_idempotent() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog, vec![spec(":all")], vec![spec(":secret")], &home());
        let request = Request::new(vec![spec(":secret")], vec![spec(":extra")]);
        assert_eq!(resolve(&resolver, &request), resolve(&resolver, &request));
    }
}
