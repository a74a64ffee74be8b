//! Commands: write a profile to a ZIP archive and import one back.
use anyhow::Result;

use crate::archive::{self, ArchiveOptions, UnarchiveOptions};
use crate::cli::{ArchiveOpts, GlobalOpts, UnarchiveOpts};
use crate::commands::{CommandSetup, report_aborted};
use crate::logging::Log;
use crate::prompt::{Confirm, Outcome};

/// Run the archive command.
///
/// # Errors
///
/// Returns an error if no profile is named or active, the profile has no
/// valid record, the destination exists without `--overwrite`, or writing
/// the archive fails.
pub fn run_archive(global: &GlobalOpts, opts: &ArchiveOpts, log: &dyn Log) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let name = setup.profile_or_active(opts.profile.as_deref(), log)?;
    let archive_dir = &setup.config.settings.archive_directory;

    if setup.dry_run {
        let destination = opts
            .destination
            .clone()
            .unwrap_or_else(|| archive::default_destination(archive_dir, &name));
        log.dry_run(&format!("archive \"{name}\" into {}", destination.display()));
        return Ok(());
    }

    let options = ArchiveOptions {
        destination: opts.destination.clone(),
        overwrite: opts.overwrite,
        compression: opts.compression,
        level: opts.compression_level,
    };
    let path = archive::archive_profile(&setup.store, &name, archive_dir, &options, log)?;
    log.info(&format!("Archived \"{name}\" to {}", path.display()));
    Ok(())
}

/// Run the unarchive command.
///
/// # Errors
///
/// Returns an error if the archive cannot be read, the profile name is
/// unknown or invalid, the profile exists under `--noconfirm` without
/// `--overwrite`, or extraction fails.
pub fn run_unarchive(
    global: &GlobalOpts,
    opts: &UnarchiveOpts,
    confirm: &dyn Confirm,
    log: &dyn Log,
) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    if setup.dry_run {
        log.dry_run(&format!("unarchive {}", opts.file.display()));
        return Ok(());
    }

    let options = UnarchiveOptions {
        name: opts.name.clone(),
        overwrite: opts.overwrite,
        noconfirm: opts.noconfirm,
    };
    match archive::unarchive_profile(&setup.store, &opts.file, &options, confirm, log)? {
        Outcome::Cancelled => report_aborted("Unarchiving"),
        Outcome::Completed(name) => log.info(&format!(
            "Unarchived \"{name}\"; run `konfsave load {name}` to apply it"
        )),
    }
    Ok(())
}
