//! Command: modify a profile's stored attributes.
use anyhow::Result;

use crate::cli::{ChangeOpts, GlobalOpts};
use crate::commands::CommandSetup;
use crate::logging::Log;
use crate::profiles::RecordChanges;

impl From<&ChangeOpts> for RecordChanges {
    fn from(opts: &ChangeOpts) -> Self {
        Self {
            name: opts.name.clone(),
            author: opts.author.clone(),
            description: opts.description.clone(),
            groups: opts.groups.clone(),
            include: opts.include.clone(),
            exclude: opts.exclude.clone(),
        }
    }
}

/// Run the change command.
///
/// # Errors
///
/// Returns an error if no profile is named or active, the profile does not
/// exist, the new name is invalid or taken, or the record cannot be written.
pub fn run(global: &GlobalOpts, opts: &ChangeOpts, log: &dyn Log) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let name = setup.profile_or_active(opts.profile.as_deref(), log)?;
    let changes = RecordChanges::from(opts);

    if changes.is_empty() {
        log.info(&format!("Nothing to change for \"{name}\""));
        return Ok(());
    }
    if setup.dry_run {
        log.dry_run(&format!("update the record of \"{name}\": {changes:?}"));
        return Ok(());
    }

    let record = setup.store.change(&name, changes, log)?;
    log.info(&format!("Updated profile \"{}\"", record.name));
    Ok(())
}
