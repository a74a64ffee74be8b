//! Command: delete saved profiles.
use anyhow::Result;

use crate::cli::{DeleteOpts, GlobalOpts};
use crate::commands::{CommandSetup, report_aborted};
use crate::logging::Log;
use crate::prompt::{AssumeYes, Confirm, Outcome};

/// Run the delete command.
///
/// Only profile storage is removed; files in the home directory stay.
///
/// # Errors
///
/// Returns an error if the prompt fails or a directory cannot be removed.
/// Names without a saved profile are reported and skipped.
pub fn run(
    global: &GlobalOpts,
    opts: &DeleteOpts,
    confirm: &dyn Confirm,
    log: &dyn Log,
) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    if setup.dry_run {
        for name in &opts.profiles {
            log.dry_run(&format!("delete profile \"{name}\""));
        }
        return Ok(());
    }

    let confirm: &dyn Confirm = if opts.noconfirm { &AssumeYes } else { confirm };
    match setup.store.delete(&opts.profiles, confirm, log)? {
        Outcome::Cancelled => report_aborted("Deleting"),
        Outcome::Completed(summary) => {
            log.debug(&format!(
                "deleted {}, {} not found",
                summary.deleted.len(),
                summary.missing.len()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::commands::tests::global;
    use crate::logging::BufferedLog;
    use crate::prompt::MockConfirm;
    use std::fs;

    fn seed(root: &std::path::Path, name: &str) -> std::path::PathBuf {
        let dir = root.join("data/profiles").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(".konfsave_profile"), format!("{{\"name\": \"{name}\"}}")).unwrap();
        dir
    }

    fn delete_opts(names: &[&str], noconfirm: bool) -> DeleteOpts {
        DeleteOpts {
            profiles: names.iter().map(|n| (*n).to_string()).collect(),
            noconfirm,
        }
    }

    #[test]
    fn noconfirm_skips_prompt() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = seed(tmp.path(), "old");
        let mut never = MockConfirm::new();
        never.expect_confirm().times(0);

        run(&global(tmp.path()), &delete_opts(&["old"], true), &never, &BufferedLog::new())
            .unwrap();

        assert!(!dir.exists());
    }

    #[test]
    fn missing_names_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = seed(tmp.path(), "old");
        let log = BufferedLog::new();

        run(
            &global(tmp.path()),
            &delete_opts(&["old", "ghost"], true),
            &AssumeYes,
            &log,
        )
        .unwrap();

        assert!(!dir.exists());
        assert!(log.contains("error", "ghost"));
    }

    #[test]
    fn declined_prompt_keeps_profiles() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = seed(tmp.path(), "old");
        let mut declined = MockConfirm::new();
        declined.expect_confirm().times(1).returning(|_| Ok(false));

        run(&global(tmp.path()), &delete_opts(&["old"], false), &declined, &BufferedLog::new())
            .unwrap();

        assert!(dir.exists());
    }
}
