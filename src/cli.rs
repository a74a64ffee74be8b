use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::archive::Compression;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "konfsave",
    about = "Save, load and share named profiles of desktop configuration files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Report what would be copied without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Override the konfsave data directory
    #[arg(long, global = true, env = "KONFSAVE_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Override the home directory
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the active profile and saved profiles, or details of one profile
    #[command(visible_aliases = ["i", "ls"])]
    Info(InfoOpts),
    /// List the files that save would copy
    #[command(visible_alias = "f")]
    Files(FilesOpts),
    /// List default or available file groups
    #[command(visible_alias = "g")]
    Groups(GroupsOpts),
    /// Save the current configuration as a profile
    #[command(visible_alias = "s")]
    Save(SaveOpts),
    /// Load a saved profile into the home directory
    #[command(visible_alias = "l")]
    Load(LoadOpts),
    /// Modify a profile's stored attributes
    #[command(visible_alias = "c")]
    Change(ChangeOpts),
    /// Rename a saved profile
    Rename(RenameOpts),
    /// Delete saved profiles
    #[command(visible_alias = "d")]
    Delete(DeleteOpts),
    /// Export a profile as a ZIP archive
    #[command(visible_alias = "a")]
    Archive(ArchiveOpts),
    /// Import an archived profile without loading it
    #[command(visible_alias = "u")]
    Unarchive(UnarchiveOpts),
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Short name used for the per-command log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Info(_) => "info",
            Self::Files(_) => "files",
            Self::Groups(_) => "groups",
            Self::Save(_) => "save",
            Self::Load(_) => "load",
            Self::Change(_) => "change",
            Self::Rename(_) => "rename",
            Self::Delete(_) => "delete",
            Self::Archive(_) => "archive",
            Self::Unarchive(_) => "unarchive",
            Self::Completions(_) => "completions",
            Self::Version => "version",
        }
    }
}

/// Caller overrides shared by `files`, `save` and `load`.
#[derive(Parser, Debug, Clone, Default)]
pub struct Overrides {
    /// Files or groups to add; paths are absolute or relative to the home
    /// directory, group names start with ':'
    #[arg(short, long, num_args = 0.., action = ArgAction::Append, value_name = "PATH")]
    pub include: Vec<String>,

    /// Files or groups to leave out; files already in a profile are kept
    #[arg(short, long, num_args = 0.., action = ArgAction::Append, value_name = "PATH")]
    pub exclude: Vec<String>,

    /// Ignore the configured default groups; only includes are copied
    #[arg(long)]
    pub no_defaults: bool,
}

/// Options for the `info` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InfoOpts {
    /// Print details of this profile
    pub profile: Option<String>,
}

/// Options for the `files` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct FilesOpts {
    /// Use the stored overrides of this profile instead of the active one
    pub profile: Option<String>,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Options for the `groups` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct GroupsOpts {
    /// Once: list every metagroup. Twice: list every group
    #[arg(short, long, action = ArgAction::Count)]
    pub available: u8,

    /// Once: show definitions. Twice: resolve to paths. Thrice: expand
    /// directories into files
    #[arg(short = 'x', long, action = ArgAction::Count)]
    pub expand: u8,

    /// Print JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Options for the `save` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SaveOpts {
    /// Profile name; defaults to the active profile
    pub profile: Option<String>,

    /// Save into this directory instead of the profile store
    #[arg(short, long, value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Copy the contents of symlinked files instead of the links
    #[arg(short = 's', long)]
    pub follow_symlinks: bool,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Options for the `load` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct LoadOpts {
    /// The profile to load
    pub profile: String,

    /// Skip the unsaved-configuration check and its confirmation
    #[arg(long)]
    pub overwrite: bool,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Options for the `change` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ChangeOpts {
    /// Profile to change; defaults to the active profile
    pub profile: Option<String>,

    /// New name; the profile's directory is renamed too
    #[arg(short, long)]
    pub name: Option<String>,

    /// New author; an empty value clears it
    #[arg(long)]
    pub author: Option<String>,

    /// New description; an empty value clears it
    #[arg(long)]
    pub description: Option<String>,

    /// Groups the profile supports
    #[arg(long, num_args = 0.., value_name = "GROUP")]
    pub groups: Option<Vec<String>>,

    /// Replace the stored include list; no values clears it
    #[arg(short, long, num_args = 0.., value_name = "PATH")]
    pub include: Option<Vec<String>>,

    /// Replace the stored exclude list; no values clears it
    #[arg(short, long, num_args = 0.., value_name = "PATH")]
    pub exclude: Option<Vec<String>>,
}

/// Options for the `rename` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RenameOpts {
    /// Current name
    pub old: String,
    /// New name
    pub new: String,
}

/// Options for the `delete` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DeleteOpts {
    /// The profiles to delete
    #[arg(required = true)]
    pub profiles: Vec<String>,

    /// Do not ask for confirmation
    #[arg(long)]
    pub noconfirm: bool,
}

/// Options for the `archive` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ArchiveOpts {
    /// Profile to archive; defaults to the active profile
    pub profile: Option<String>,

    /// Full path of the resulting archive
    #[arg(short, long, value_name = "PATH")]
    pub destination: Option<PathBuf>,

    /// Replace an existing archive
    #[arg(short, long)]
    pub overwrite: bool,

    /// Compression method
    #[arg(long, value_enum, default_value_t = Compression::Deflate)]
    pub compression: Compression,

    /// Compression level (1-9)
    #[arg(long, value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(1..=9))]
    pub compression_level: Option<u8>,
}

/// Options for the `unarchive` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UnarchiveOpts {
    /// The archive to import
    pub file: PathBuf,

    /// Import under this name instead of the archived one
    #[arg(short, long)]
    pub name: Option<String>,

    /// Extract over an existing profile of the same name
    #[arg(long)]
    pub overwrite: bool,

    /// Do not ask for confirmation
    #[arg(long)]
    pub noconfirm: bool,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_save_with_overrides() {
        let cli = Cli::parse_from([
            "konfsave", "save", "work", "-i", "~/.config/a", ":gtk", "-e", ":kwin",
        ]);
        assert!(
            matches!(&cli.command, Command::Save(_)),
            "Expected Save command"
        );
        if let Command::Save(opts) = cli.command {
            assert_eq!(opts.profile.as_deref(), Some("work"));
            assert_eq!(opts.overrides.include, ["~/.config/a", ":gtk"]);
            assert_eq!(opts.overrides.exclude, [":kwin"]);
            assert!(!opts.follow_symlinks);
        }
    }

    #[test]
    fn parse_save_destination_and_symlinks() {
        let cli = Cli::parse_from(["konfsave", "save", "-d", "/tmp/out", "-s"]);
        assert!(
            matches!(&cli.command, Command::Save(_)),
            "Expected Save command"
        );
        if let Command::Save(opts) = cli.command {
            assert_eq!(opts.destination, Some(PathBuf::from("/tmp/out")));
            assert!(opts.follow_symlinks);
            assert!(opts.profile.is_none());
        }
    }

    #[test]
    fn repeated_include_flags_append() {
        let cli = Cli::parse_from(["konfsave", "files", "-i", "a", "-i", "b"]);
        assert!(
            matches!(&cli.command, Command::Files(_)),
            "Expected Files command"
        );
        if let Command::Files(opts) = cli.command {
            assert_eq!(opts.overrides.include, ["a", "b"]);
        }
    }

    #[test]
    fn parse_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "konfsave",
            "load",
            "work",
            "--dry-run",
            "--home",
            "/sandbox/home",
            "-v",
        ]);
        assert!(cli.global.dry_run);
        assert!(cli.verbose);
        assert_eq!(cli.global.home, Some(PathBuf::from("/sandbox/home")));
        assert!(matches!(cli.command, Command::Load(ref o) if o.profile == "work" && !o.overwrite));
    }

    #[test]
    fn parse_groups_counts() {
        let cli = Cli::parse_from(["konfsave", "groups", "-aa", "-xxx", "--json"]);
        assert!(
            matches!(&cli.command, Command::Groups(_)),
            "Expected Groups command"
        );
        if let Command::Groups(opts) = cli.command {
            assert_eq!(opts.available, 2);
            assert_eq!(opts.expand, 3);
            assert!(opts.json);
        }
    }

    #[test]
    fn parse_change_with_empty_list_clears() {
        let cli = Cli::parse_from(["konfsave", "change", "work", "--include", "--author", "me"]);
        assert!(
            matches!(&cli.command, Command::Change(_)),
            "Expected Change command"
        );
        if let Command::Change(opts) = cli.command {
            assert_eq!(opts.include, Some(vec![]));
            assert_eq!(opts.exclude, None);
            assert_eq!(opts.author.as_deref(), Some("me"));
        }
    }

    #[test]
    fn delete_requires_a_name() {
        assert!(Cli::try_parse_from(["konfsave", "delete"]).is_err());
        let cli = Cli::parse_from(["konfsave", "d", "a", "b", "--noconfirm"]);
        assert!(matches!(cli.command, Command::Delete(ref o) if o.profiles == ["a", "b"] && o.noconfirm));
    }

    #[test]
    fn archive_level_is_bounded() {
        assert!(Cli::try_parse_from(["konfsave", "archive", "--compression-level", "10"]).is_err());
        let cli = Cli::parse_from([
            "konfsave",
            "archive",
            "work",
            "--compression",
            "store",
            "-o",
        ]);
        assert!(
            matches!(&cli.command, Command::Archive(_)),
            "Expected Archive command"
        );
        if let Command::Archive(opts) = cli.command {
            assert_eq!(opts.compression, Compression::Store);
            assert!(opts.overwrite);
        }
    }

    #[test]
    fn parse_unarchive() {
        let cli = Cli::parse_from(["konfsave", "unarchive", "p.konfsave.zip", "-n", "copy"]);
        assert!(matches!(
            cli.command,
            Command::Unarchive(ref o) if o.name.as_deref() == Some("copy") && !o.noconfirm
        ));
    }

    #[test]
    fn aliases_resolve() {
        assert!(matches!(
            Cli::parse_from(["konfsave", "ls"]).command,
            Command::Info(_)
        ));
        assert!(matches!(
            Cli::parse_from(["konfsave", "g"]).command,
            Command::Groups(_)
        ));
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["konfsave", "version"]);
        assert!(matches!(cli.command, Command::Version));
        assert_eq!(cli.command.name(), "version");
    }
}
