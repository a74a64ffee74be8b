//! Command: rename a saved profile.
use anyhow::Result;

use crate::cli::{GlobalOpts, RenameOpts};
use crate::commands::CommandSetup;
use crate::logging::Log;

/// Run the rename command.
///
/// # Errors
///
/// Returns an error if either name is invalid, the old profile does not
/// exist, or the new name is already taken.
pub fn run(global: &GlobalOpts, opts: &RenameOpts, log: &dyn Log) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    setup.store.rule().validate(&opts.old)?;
    if setup.dry_run {
        log.dry_run(&format!("rename \"{}\" to \"{}\"", opts.old, opts.new));
        return Ok(());
    }
    setup.store.rename(&opts.old, &opts.new, log)?;
    log.info(&format!("Renamed \"{}\" to \"{}\"", opts.old, opts.new));
    Ok(())
}
