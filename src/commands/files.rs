//! Command: list the files a save would copy.
use anyhow::Result;

use crate::cli::{FilesOpts, GlobalOpts};
use crate::commands::CommandSetup;
use crate::logging::{BufferedLog, Log};
use crate::resolver::ResolvedPathSet;

/// Run the files command.
///
/// Uses the stored overrides of the named profile, or of the active profile
/// when none is named. Resolution messages are printed after the list.
///
/// # Errors
///
/// Returns an error if setup fails or the profile name is invalid.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &FilesOpts, log: &dyn Log) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    if let Some(name) = opts.profile.as_deref() {
        setup.store.rule().validate(name)?;
    }
    let record = setup.store.read(opts.profile.as_deref(), log).found();
    let request = setup.request(&opts.overrides, record.as_ref());

    let buffered = BufferedLog::new();
    let set = setup.resolver().resolve(&request, &buffered);

    let listing = render(&set);
    if !listing.is_empty() {
        println!("{listing}");
    }
    buffered.replay(log);
    Ok(())
}

/// One path per line, sorted case-insensitively.
#[must_use]
pub fn render(set: &ResolvedPathSet) -> String {
    set.sorted_for_display()
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn render_sorts_ignoring_case() {
        let set: ResolvedPathSet = ["/h/b", "/h/A", "/h/a2"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        insta::assert_snapshot!(render(&set), @r"
        /h/A
        /h/a2
        /h/b
        ");
    }

    #[test]
    fn render_empty_set() {
        assert_eq!(render(&ResolvedPathSet::default()), "");
    }
}
