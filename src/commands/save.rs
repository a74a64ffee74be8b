//! Command: save the current configuration as a profile.
use anyhow::Result;

use crate::cli::{GlobalOpts, SaveOpts};
use crate::commands::{CommandSetup, finish_transfer, report_aborted};
use crate::logging::Log;
use crate::profiles::ProfileRecord;
use crate::prompt::Confirm;

/// Run the save command.
///
/// Without `--destination` the files go into the profile store and the
/// profile becomes active. With it, files and record are written to the
/// given directory and the store is left alone.
///
/// # Errors
///
/// Returns an error if the name is invalid, no profile is named or active,
/// the record cannot be written, or any path failed to copy.
pub fn run(
    global: &GlobalOpts,
    opts: &SaveOpts,
    confirm: &dyn Confirm,
    log: &dyn Log,
) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let store = &setup.store;
    let name = setup.profile_or_active(opts.profile.as_deref(), log)?;

    if opts.destination.is_none()
        && store.exists(&name)
        && store.active_name(log).as_deref() != Some(name.as_str())
        && !confirm.confirm(&format!(
            "The profile \"{name}\" already exists. Overwrite it?"
        ))?
    {
        report_aborted("Saving");
        return Ok(());
    }

    let mut record = store
        .read(Some(&name), log)
        .found()
        .unwrap_or_else(|| ProfileRecord::new(&name));
    record.name.clone_from(&name);

    let request = setup.request(&opts.overrides, Some(&record));
    let set = setup.resolver().resolve(&request, log);
    let target = opts
        .destination
        .clone()
        .unwrap_or_else(|| store.layout().profile_dir(&name));

    log.stage(&format!(
        "Saving {} path(s) as \"{name}\" into {}",
        set.len(),
        target.display()
    ));
    let stats = setup.engine(opts.follow_symlinks).save(&set, &target, log);

    if setup.dry_run {
        log.dry_run(&format!("write profile record for \"{name}\""));
    } else if opts.destination.is_some() {
        let path = record.write_into(&target)?;
        log.debug(&format!("record written to {}", path.display()));
    } else {
        store.write(&record)?;
        store.activate(&name)?;
        log.info(&format!("\"{name}\" is now the active profile"));
    }

    finish_transfer(&stats, setup.dry_run, log)
}
