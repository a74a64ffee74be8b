pub mod groups;
pub mod ini;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::paths;
use groups::{CatalogBuilder, GroupCatalog, MetagroupDef, is_group_name};
use validation::ConfigWarning;

/// The configuration written on first run.
pub const DEFAULT_CONFIG: &str = include_str!("../../assets/default_config.ini");

/// Characters allowed in profile names besides alphanumerics and `_`.
pub const DEFAULT_NAME_CHARACTERS: &str = "-+&()[]";

/// Value that promotes an existing group to a metagroup.
const PROMOTE_SENTINEL: &str = "*";

const DEFAULTS_SECTION: &str = "Defaults";
const PATHS_SECTION: &str = "Paths";
const METAGROUPS_SECTION: &str = "Metagroups";

/// Values from the `[Defaults]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Groups copied when no explicit default set is given.
    pub default_groups: Vec<String>,
    /// Raw exception entries (paths or group names).
    pub exceptions: Vec<String>,
    /// Extra characters accepted in profile names.
    pub name_characters: String,
    /// Directory receiving archives when no destination is given.
    pub archive_directory: PathBuf,
}

/// Fully loaded configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Values from the `[Defaults]` section.
    pub settings: Settings,
    /// Groups from `[Paths]` and `[Metagroups]`.
    pub catalog: GroupCatalog,
    /// Problems that were ignored while loading.
    pub warnings: Vec<ConfigWarning>,
}

impl Config {
    /// Load `path`, writing the bundled default there first if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or read, fails to
    /// parse, lacks a required key, or promotes an undefined group.
    pub fn load_or_create(path: &Path, home: &Path) -> Result<Self, ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
            std::fs::write(path, DEFAULT_CONFIG).map_err(io_err)?;
        }
        let content = std::fs::read_to_string(path).map_err(io_err)?;
        let source = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self::parse(&content, home, &source)
    }

    /// Parse configuration text. `source` names the file in diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid syntax, a missing `default-groups` key,
    /// or promotion of an undefined group.
    pub fn parse(content: &str, home: &Path, source: &str) -> Result<Self, ConfigError> {
        let sections =
            ini::parse_kv_sections_from_str(content).map_err(|e| ConfigError::InvalidSyntax {
                file: source.to_string(),
                message: e.to_string(),
            })?;

        let mut warnings = Vec::new();
        let mut builder = CatalogBuilder::new();
        let mut settings = None;

        for section in &sections {
            match section.header.as_str() {
                DEFAULTS_SECTION => {
                    settings = Some(parse_defaults(section, home, source, &mut warnings)?);
                }
                PATHS_SECTION => parse_paths(section, home, source, &mut builder, &mut warnings),
                METAGROUPS_SECTION => {
                    parse_metagroups(section, source, &mut builder, &mut warnings);
                }
                other => warnings.push(ConfigWarning::new(
                    source,
                    other,
                    "unknown section ignored",
                )),
            }
        }

        let settings = settings.ok_or_else(missing_default_groups)?;
        let catalog = builder.build()?;

        Ok(Self {
            settings,
            catalog,
            warnings,
        })
    }
}

fn missing_default_groups() -> ConfigError {
    ConfigError::MissingKey {
        section: DEFAULTS_SECTION.to_string(),
        key: "default-groups".to_string(),
    }
}

/// Keep only group names, warning about anything else.
fn group_names(
    raw: &str,
    item: &str,
    source: &str,
    warnings: &mut Vec<ConfigWarning>,
) -> Vec<String> {
    ini::split_list(raw)
        .into_iter()
        .filter(|name| {
            let ok = is_group_name(name);
            if !ok {
                warnings.push(ConfigWarning::new(
                    source,
                    item,
                    format!("'{name}' is not a group name (group names start with ':')"),
                ));
            }
            ok
        })
        .collect()
}

fn parse_defaults(
    section: &ini::KvSection,
    home: &Path,
    source: &str,
    warnings: &mut Vec<ConfigWarning>,
) -> Result<Settings, ConfigError> {
    let default_groups = section
        .get("default-groups")
        .map(|v| group_names(v, "Defaults.default-groups", source, warnings))
        .ok_or_else(missing_default_groups)?;

    for (key, _) in &section.entries {
        if !matches!(
            key.as_str(),
            "default-groups" | "exceptions" | "profile-name-characters" | "archive-directory"
        ) {
            warnings.push(ConfigWarning::new(
                source,
                format!("Defaults.{key}"),
                "unknown key ignored",
            ));
        }
    }

    Ok(Settings {
        default_groups,
        exceptions: section.get("exceptions").map(ini::split_list).unwrap_or_default(),
        name_characters: section
            .get("profile-name-characters")
            .unwrap_or(DEFAULT_NAME_CHARACTERS)
            .to_string(),
        archive_directory: section
            .get("archive-directory")
            .filter(|v| !v.is_empty())
            .map_or_else(|| home.to_path_buf(), |v| paths::normalize(v, home)),
    })
}

fn parse_paths(
    section: &ini::KvSection,
    home: &Path,
    source: &str,
    builder: &mut CatalogBuilder,
    warnings: &mut Vec<ConfigWarning>,
) {
    for (raw_path, value) in &section.entries {
        let item = format!("Paths.{raw_path}");
        let path = paths::normalize(raw_path, home);
        let groups = group_names(value, &item, source, warnings);
        if groups.is_empty() {
            warnings.push(ConfigWarning::new(source, &item, "path belongs to no group"));
        }
        for group in groups {
            builder.add_path(path.clone(), &group);
        }
    }
}

fn parse_metagroups(
    section: &ini::KvSection,
    source: &str,
    builder: &mut CatalogBuilder,
    warnings: &mut Vec<ConfigWarning>,
) {
    for (name, value) in &section.entries {
        let item = format!("Metagroups.{name}");
        if !is_group_name(name) {
            warnings.push(ConfigWarning::new(
                source,
                &item,
                "metagroup names must start with ':'",
            ));
            continue;
        }
        let def = if value.trim() == PROMOTE_SENTINEL {
            MetagroupDef::Promote
        } else {
            MetagroupDef::Members(group_names(value, &item, source, warnings))
        };
        builder.add_metagroup(name, def);
    }
}
