//! Command implementations and the setup they share.
pub mod archive;
pub mod change;
pub mod completions;
pub mod delete;
pub mod files;
pub mod groups;
pub mod info;
pub mod load;
pub mod rename;
pub mod save;
pub mod version;

use anyhow::Result;

use crate::cli::{GlobalOpts, Overrides};
use crate::config::Config;
use crate::error::ProfileError;
use crate::logging::Log;
use crate::paths::Layout;
use crate::profiles::{NameRule, ProfileRecord, ProfileStore};
use crate::resolver::{Defaults, Request, Resolver};
use crate::transfer::{TransferEngine, TransferOptions, TransferStats};

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates layout detection, configuration loading and store creation
/// so that each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Home, data and profile locations.
    pub layout: Layout,
    /// Loaded settings and group catalog.
    pub config: Config,
    /// Profile records and the active pointer.
    pub store: ProfileStore,
    /// Report instead of writing.
    pub dry_run: bool,
}

impl CommandSetup {
    /// Detect the layout, load (or create) the configuration and open the
    /// profile store.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// configuration cannot be loaded.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        let layout = Layout::detect(global.home.as_deref(), global.data_dir.as_deref())?;
        log.debug(&format!("home: {}", layout.home.display()));
        log.debug(&format!("data dir: {}", layout.data_dir.display()));

        let config = Config::load_or_create(&layout.config_path(), &layout.home)?;
        log.debug(&format!(
            "{} groups, {} default",
            config.catalog.groups().count(),
            config.settings.default_groups.len()
        ));

        if !config.warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                config.warnings.len()
            ));
            for warning in &config.warnings {
                log.warn(&format!("  {warning}"));
            }
        }
        for dangling in config.catalog.dangling() {
            log.info(&format!(
                "The group {} (referenced by {}) is not defined",
                dangling.name, dangling.from
            ));
        }

        let store = ProfileStore::new(
            layout.clone(),
            NameRule::new(&config.settings.name_characters),
        );
        Ok(Self {
            layout,
            config,
            store,
            dry_run: global.dry_run,
        })
    }

    /// A resolver over the loaded catalog.
    #[must_use]
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::from_config(&self.config, &self.layout.home)
    }

    /// A transfer engine honouring `--dry-run`.
    #[must_use]
    pub fn engine(&self, follow_symlinks: bool) -> TransferEngine {
        TransferEngine::new(
            &self.layout.home,
            TransferOptions {
                follow_symlinks,
                dry_run: self.dry_run,
            },
        )
    }

    /// Build a resolution request from caller overrides and, if given, the
    /// stored overrides of `record`.
    #[must_use]
    pub fn request(&self, overrides: &Overrides, record: Option<&ProfileRecord>) -> Request {
        let home = &self.layout.home;
        let mut request = Request::from_raw(&overrides.include, &overrides.exclude, home);
        if let Some(record) = record {
            request = request.with_profile(record, home);
        }
        if overrides.no_defaults {
            request = request.with_defaults(Defaults::Empty);
        }
        request
    }

    /// `name` if given and valid, otherwise the active profile's name.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is invalid, or if it is omitted and no
    /// profile is active.
    pub fn profile_or_active(&self, name: Option<&str>, log: &dyn Log) -> Result<String> {
        match name {
            Some(name) => {
                self.store.rule().validate(name)?;
                Ok(name.to_string())
            }
            None => self
                .store
                .active_name(log)
                .ok_or_else(|| ProfileError::NoActiveProfile.into()),
        }
    }
}

/// Log the transfer summary and fail if any path could not be copied.
///
/// # Errors
///
/// Returns an error if one or more copies failed.
pub fn finish_transfer(stats: &TransferStats, dry_run: bool, log: &dyn Log) -> Result<()> {
    log.info(&stats.summary(dry_run));
    if stats.failed > 0 {
        anyhow::bail!("{} path(s) could not be copied", stats.failed);
    }
    Ok(())
}

/// Tell the user that a confirmation was declined.
#[allow(clippy::print_stdout)]
pub fn report_aborted(action: &str) {
    println!("{action} aborted.");
}
