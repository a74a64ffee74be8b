//! Command: load a saved profile into the home directory.
use anyhow::Result;

use crate::cli::{GlobalOpts, LoadOpts};
use crate::commands::{CommandSetup, finish_transfer, report_aborted};
use crate::error::ProfileError;
use crate::logging::Log;
use crate::prompt::Confirm;

/// Run the load command.
///
/// Unless `--overwrite` is given the user is warned about the state of the
/// current configuration and asked to confirm. The active pointer is cleared
/// before copying and set to the loaded profile afterwards.
///
/// # Errors
///
/// Returns an error if the name is invalid, the profile has no valid
/// record, the pointer cannot be updated, or any path failed to copy.
pub fn run(
    global: &GlobalOpts,
    opts: &LoadOpts,
    confirm: &dyn Confirm,
    log: &dyn Log,
) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let store = &setup.store;
    let name = opts.profile.as_str();
    store.rule().validate(name)?;

    let record = store
        .read(Some(name), log)
        .found()
        .ok_or_else(|| ProfileError::NotFound(name.to_string()))?;

    if !opts.overwrite {
        log.warn(overwrite_warning(store.active_name(log).as_deref(), name));
        if !confirm.confirm("Are you sure you want to overwrite the current system configuration?")? {
            report_aborted("Loading");
            return Ok(());
        }
    }

    let profile_dir = store.layout().profile_dir(name);
    let request = setup.request(&opts.overrides, Some(&record));
    let set = setup
        .resolver()
        .rooted_at(&profile_dir)
        .resolve(&request, log);

    log.stage(&format!("Loading \"{name}\" ({} path(s))", set.len()));
    if !setup.dry_run {
        store.clear_active()?;
    }
    let stats = setup.engine(false).load(&set, &profile_dir, log);

    if setup.dry_run {
        log.dry_run(&format!("activate \"{name}\""));
    } else {
        store.activate(name)?;
        log.info(&format!("\"{name}\" is now the active profile"));
    }
    finish_transfer(&stats, setup.dry_run, log)
}

/// The warning shown before overwriting the home directory.
fn overwrite_warning(active: Option<&str>, loading: &str) -> &'static str {
    match active {
        None => {
            "There is no active profile, and the current configuration is NOT SAVED. \
             Loading will overwrite it."
        }
        Some(active) if active != loading => {
            "You're loading a new profile. Unsaved changes to the current profile will be lost."
        }
        Some(_) => {
            "You're overwriting the current profile with its saved version. \
             Unsaved changes will be lost."
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cli::Overrides;
    use crate::commands::tests::global;
    use crate::logging::BufferedLog;
    use crate::prompt::{AssumeYes, MockConfirm};
    use std::fs;
    use std::path::Path;

    fn load_opts(name: &str, overwrite: bool) -> LoadOpts {
        LoadOpts {
            profile: name.to_string(),
            overwrite,
            overrides: Overrides::default(),
        }
    }

    fn seed_profile(root: &Path, name: &str) {
        let dir = root.join("data/profiles").join(name);
        fs::create_dir_all(dir.join(".config")).unwrap();
        fs::write(dir.join(".config/kwinrc"), format!("[{name}]")).unwrap();
        fs::write(
            dir.join(".konfsave_profile"),
            format!("{{\"name\": \"{name}\"}}"),
        )
        .unwrap();
    }

    #[test]
    fn load_copies_into_home_and_activates() {
        let tmp = tempfile::tempdir().unwrap();
        let opts = global(tmp.path());
        seed_profile(tmp.path(), "work");

        run(&opts, &load_opts("work", true), &AssumeYes, &BufferedLog::new()).unwrap();

        assert_eq!(
            fs::read_to_string(tmp.path().join("home/.config/kwinrc")).unwrap(),
            "[work]"
        );
        let pointer = fs::read_to_string(tmp.path().join("data/current_profile")).unwrap();
        assert!(pointer.contains("\"work\""));
    }

    #[test]
    fn missing_profile_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = run(
            &global(tmp.path()),
            &load_opts("ghost", true),
            &AssumeYes,
            &BufferedLog::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("doesn't exist"));
    }

    #[test]
    fn declined_confirmation_changes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let opts = global(tmp.path());
        seed_profile(tmp.path(), "work");
        let log = BufferedLog::new();
        let mut declined = MockConfirm::new();
        declined.expect_confirm().times(1).returning(|_| Ok(false));

        run(&opts, &load_opts("work", false), &declined, &log).unwrap();

        assert!(!tmp.path().join("home/.config/kwinrc").exists());
        assert!(!tmp.path().join("data/current_profile").exists());
        assert!(log.contains("warn", "NOT SAVED"));
    }

    #[test]
    fn warning_depends_on_active_profile() {
        assert!(overwrite_warning(None, "a").contains("NOT SAVED"));
        assert!(overwrite_warning(Some("b"), "a").contains("new profile"));
        assert!(overwrite_warning(Some("a"), "a").contains("current profile"));
    }
}
