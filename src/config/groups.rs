//! The group catalog: symbolic group names mapped to sets of paths.
//!
//! Groups are declared in two places of `konfsave.ini`:
//!
//! - `[Paths]` lists literal paths and the groups each belongs to,
//! - `[Metagroups]` defines groups made of other groups, or promotes an
//!   existing group with the `*` sentinel.
//!
//! The catalog is built once, resolved eagerly, and immutable afterwards.
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Prefix distinguishing group names from paths.
pub const GROUP_PREFIX: char = ':';

/// Return `true` if `raw` names a group rather than a path.
#[must_use]
pub fn is_group_name(raw: &str) -> bool {
    raw.starts_with(GROUP_PREFIX)
}

/// A direct member of a group definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Member {
    /// A literal, absolute path.
    Path(PathBuf),
    /// A reference to another group (including its `:` prefix).
    Group(String),
}

/// Right-hand side of a `[Metagroups]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetagroupDef {
    /// The metagroup consists of these groups.
    Members(Vec<String>),
    /// Promote an already defined group to metagroup status (`*`).
    Promote,
}

/// A group reference that does not name any defined group.
///
/// Not an error: the reference contributes no paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// The group whose definition holds the reference.
    pub from: String,
    /// The undefined group name.
    pub name: String,
}

/// Accumulates group definitions before resolution.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    definitions: BTreeMap<String, Vec<Member>>,
    metagroups: BTreeSet<String>,
    promotions: Vec<String>,
}

impl CatalogBuilder {
    /// Start an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `path` belongs to `group`.
    pub fn add_path(&mut self, path: PathBuf, group: &str) -> &mut Self {
        let members = self.definitions.entry(group.to_string()).or_default();
        let member = Member::Path(path);
        if !members.contains(&member) {
            members.push(member);
        }
        self
    }

    /// Declare a metagroup.
    ///
    /// Promotions are checked in [`build`](Self::build) so that `[Metagroups]`
    /// entries may refer to groups declared later in the file.
    pub fn add_metagroup(&mut self, name: &str, def: MetagroupDef) -> &mut Self {
        match def {
            MetagroupDef::Members(groups) => {
                let members = self.definitions.entry(name.to_string()).or_default();
                for g in groups {
                    let member = Member::Group(g);
                    if !members.contains(&member) {
                        members.push(member);
                    }
                }
            }
            MetagroupDef::Promote => self.promotions.push(name.to_string()),
        }
        self.metagroups.insert(name.to_string());
        self
    }

    /// Resolve every group and freeze the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UndefinedPromotion`] if a `*` entry names a
    /// group that has no definition.
    pub fn build(self) -> Result<GroupCatalog, ConfigError> {
        if let Some(missing) = self
            .promotions
            .iter()
            .find(|name| !self.definitions.contains_key(*name))
        {
            return Err(ConfigError::UndefinedPromotion(missing.clone()));
        }

        let mut resolved = BTreeMap::new();
        let mut dangling = Vec::new();
        for name in self.definitions.keys() {
            let (paths, missing) = resolve_bfs(&self.definitions, name);
            dangling.extend(missing.into_iter().map(|m| DanglingReference {
                from: name.clone(),
                name: m,
            }));
            resolved.insert(name.clone(), paths);
        }

        Ok(GroupCatalog {
            definitions: self.definitions,
            metagroups: self.metagroups,
            resolved,
            dangling,
        })
    }
}

/// Breadth-first expansion of `root` into literal paths.
///
/// A visited set guarantees termination on cyclic definitions. Returns the
/// paths plus every undefined group name encountered on the way.
fn resolve_bfs(
    definitions: &BTreeMap<String, Vec<Member>>,
    root: &str,
) -> (BTreeSet<PathBuf>, Vec<String>) {
    let mut paths = BTreeSet::new();
    let mut missing = Vec::new();
    let mut visited = BTreeSet::from([root.to_string()]);
    let mut queue: VecDeque<&Member> = definitions
        .get(root)
        .map(|m| m.iter().collect())
        .unwrap_or_default();

    while let Some(member) = queue.pop_front() {
        match member {
            Member::Path(p) => {
                paths.insert(p.clone());
            }
            Member::Group(g) => {
                if !visited.insert(g.clone()) {
                    continue;
                }
                match definitions.get(g) {
                    Some(members) => queue.extend(members.iter()),
                    None => missing.push(g.clone()),
                }
            }
        }
    }
    (paths, missing)
}

/// Immutable, fully resolved group catalog.
#[derive(Debug, Clone, Default)]
pub struct GroupCatalog {
    definitions: BTreeMap<String, Vec<Member>>,
    metagroups: BTreeSet<String>,
    resolved: BTreeMap<String, BTreeSet<PathBuf>>,
    dangling: Vec<DanglingReference>,
}

impl GroupCatalog {
    /// Paths reachable from `name`, or `None` if the group is undefined.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&BTreeSet<PathBuf>> {
        self.resolved.get(name)
    }

    /// Direct members of `name` as written in the configuration.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&[Member]> {
        self.definitions.get(name).map(Vec::as_slice)
    }

    /// Return `true` if `name` is a defined group.
    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Every defined group name.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Names declared in `[Metagroups]`, including promoted groups.
    pub fn metagroups(&self) -> impl Iterator<Item = &str> {
        self.metagroups.iter().map(String::as_str)
    }

    /// References to undefined groups found while resolving.
    #[must_use]
    pub fn dangling(&self) -> &[DanglingReference] {
        &self.dangling
    }

    /// Groups that list `path` directly.
    #[must_use]
    pub fn groups_of(&self, path: &Path) -> Vec<&str> {
        self.definitions
            .iter()
            .filter(|(_, members)| {
                members
                    .iter()
                    .any(|m| matches!(m, Member::Path(p) if p == path))
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    fn set(items: &[&str]) -> BTreeSet<PathBuf> {
        items.iter().map(|s| p(s)).collect()
    }

    #[test]
    fn group_prefix_detection() {
        assert!(is_group_name(":kde"));
        assert!(!is_group_name("~/.config/kdeglobals"));
        assert!(!is_group_name("kde"));
    }

    #[test]
    fn resolves_literal_members() {
        let mut b = CatalogBuilder::new();
        b.add_path(p("/h/.config/kwinrc"), ":kwin")
            .add_path(p("/h/.config/kwinrulesrc"), ":kwin");
        let catalog = b.build().unwrap();
        assert_eq!(
            catalog.resolve(":kwin"),
            Some(&set(&["/h/.config/kwinrc", "/h/.config/kwinrulesrc"]))
        );
        assert_eq!(catalog.resolve(":nothing"), None);
    }

    #[test]
    fn metagroup_is_union_of_subgroups() {
        let mut b = CatalogBuilder::new();
        b.add_path(p("/h/a"), ":one")
            .add_path(p("/h/b"), ":two")
            .add_path(p("/h/c"), ":two")
            .add_metagroup(":both", MetagroupDef::Members(vec![":one".into(), ":two".into()]));
        let catalog = b.build().unwrap();
        let union: BTreeSet<_> = catalog
            .resolve(":one")
            .unwrap()
            .union(catalog.resolve(":two").unwrap())
            .cloned()
            .collect();
        assert_eq!(catalog.resolve(":both"), Some(&union));
        assert_eq!(catalog.metagroups().collect::<Vec<_>>(), [":both"]);
    }

    #[test]
    fn nested_metagroups_resolve_transitively() {
        let mut b = CatalogBuilder::new();
        b.add_path(p("/h/leaf"), ":leaf")
            .add_metagroup(":mid", MetagroupDef::Members(vec![":leaf".into()]))
            .add_metagroup(":top", MetagroupDef::Members(vec![":mid".into()]));
        let catalog = b.build().unwrap();
        assert_eq!(catalog.resolve(":top"), Some(&set(&["/h/leaf"])));
    }

    #[test]
    fn self_reference_terminates() {
        let mut b = CatalogBuilder::new();
        b.add_path(p("/h/a"), ":loop")
            .add_metagroup(":loop", MetagroupDef::Members(vec![":loop".into()]));
        let catalog = b.build().unwrap();
        assert_eq!(catalog.resolve(":loop"), Some(&set(&["/h/a"])));
    }

    #[test]
    fn mutual_cycle_terminates_with_reachable_paths() {
        let mut b = CatalogBuilder::new();
        b.add_path(p("/h/a"), ":a")
            .add_path(p("/h/b"), ":b")
            .add_metagroup(":a", MetagroupDef::Members(vec![":b".into()]))
            .add_metagroup(":b", MetagroupDef::Members(vec![":a".into()]));
        let catalog = b.build().unwrap();
        assert_eq!(catalog.resolve(":a"), Some(&set(&["/h/a", "/h/b"])));
        assert_eq!(catalog.resolve(":b"), Some(&set(&["/h/a", "/h/b"])));
        assert!(catalog.dangling().is_empty());
    }

    #[test]
    fn undefined_reference_is_recorded_not_fatal() {
        let mut b = CatalogBuilder::new();
        b.add_path(p("/h/a"), ":a")
            .add_metagroup(":meta", MetagroupDef::Members(vec![":a".into(), ":ghost".into()]));
        let catalog = b.build().unwrap();
        assert_eq!(catalog.resolve(":meta"), Some(&set(&["/h/a"])));
        assert_eq!(
            catalog.dangling(),
            [DanglingReference {
                from: ":meta".to_string(),
                name: ":ghost".to_string()
            }]
        );
    }

    #[test]
    fn promotion_of_defined_group_succeeds() {
        let mut b = CatalogBuilder::new();
        b.add_metagroup(":theme", MetagroupDef::Promote)
            .add_path(p("/h/.config/Kvantum"), ":theme");
        let catalog = b.build().unwrap();
        assert!(catalog.metagroups().any(|g| g == ":theme"));
        assert_eq!(catalog.resolve(":theme"), Some(&set(&["/h/.config/Kvantum"])));
    }

    #[test]
    fn promotion_of_undefined_group_is_fatal() {
        let mut b = CatalogBuilder::new();
        b.add_metagroup(":nope", MetagroupDef::Promote);
        let err = b.build().unwrap_err();
        assert!(matches!(err, ConfigError::UndefinedPromotion(ref g) if g == ":nope"));
    }

    #[test]
    fn duplicate_members_are_kept_once() {
        let mut b = CatalogBuilder::new();
        b.add_path(p("/h/a"), ":a").add_path(p("/h/a"), ":a");
        let catalog = b.build().unwrap();
        assert_eq!(catalog.definition(":a").unwrap().len(), 1);
    }

    #[test]
    fn groups_of_lists_direct_owners() {
        let mut b = CatalogBuilder::new();
        b.add_path(p("/h/k"), ":kvantum")
            .add_path(p("/h/k"), ":theme")
            .add_metagroup(":kde", MetagroupDef::Members(vec![":kvantum".into()]));
        let catalog = b.build().unwrap();
        assert_eq!(catalog.groups_of(Path::new("/h/k")), [":kvantum", ":theme"]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let build = || {
            let mut b = CatalogBuilder::new();
            b.add_path(p("/h/z"), ":g")
                .add_path(p("/h/a"), ":g")
                .add_metagroup(":m", MetagroupDef::Members(vec![":g".into()]));
            b.build().unwrap()
        };
        assert_eq!(build().resolve(":m"), build().resolve(":m"));
    }
}
