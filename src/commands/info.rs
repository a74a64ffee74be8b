//! Command: show the active profile and saved profiles, or one profile's
//! details.
use std::path::Path;

use anyhow::Result;

use crate::cli::{GlobalOpts, InfoOpts};
use crate::commands::CommandSetup;
use crate::logging::Log;
use crate::profiles::{Lookup, ProfileRecord};

/// Run the info command.
///
/// # Errors
///
/// Returns an error if setup fails or the profile directory cannot be listed.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &InfoOpts, log: &dyn Log) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let store = &setup.store;

    let Some(name) = opts.profile.as_deref() else {
        let active = store.active_name(log);
        let saved = store.list()?;
        println!("{}", render_overview(active.as_deref(), &saved));
        return Ok(());
    };

    store.rule().validate(name)?;
    match store.read(Some(name), log) {
        Lookup::Found(record) => {
            println!("{}", render_profile(&record, &store.layout().profile_dir(name)));
        }
        Lookup::NotFound => println!("The profile {name} doesn't exist."),
        // Already reported by the store
        Lookup::Invalid { .. } => {}
    }
    Ok(())
}

/// Summary of the active profile followed by every saved profile.
#[must_use]
pub fn render_overview(active: Option<&str>, saved: &[String]) -> String {
    let mut out = active.map_or_else(
        || "No profile is currently active.".to_string(),
        |name| format!("Current profile: {name}"),
    );
    out.push('\n');
    if saved.is_empty() {
        out.push_str("No profiles are saved.");
    } else {
        out.push_str("Saved profiles:");
        for name in saved {
            out.push_str("\n  ");
            out.push_str(name);
        }
    }
    out
}

/// Details of a single profile.
#[must_use]
pub fn render_profile(record: &ProfileRecord, dir: &Path) -> String {
    let mut lines = vec![
        format!("Name: {}", record.name),
        format!("Stored at: {}", dir.display()),
        format!("Author: {}", record.author.as_deref().unwrap_or("Unknown")),
    ];
    lines.push(match &record.groups {
        Some(groups) if !groups.is_empty() => format!("Supported groups: {}", groups.join(", ")),
        _ => "Supported groups: (unspecified)".to_string(),
    });
    if let Some(description) = &record.description {
        lines.push(format!("Description: {description}"));
    }
    if !record.include.is_empty() {
        lines.push(format!("Always included: {}", record.include.join(", ")));
    }
    if !record.exclude.is_empty() {
        lines.push(format!("Always excluded: {}", record.exclude.join(", ")));
    }
    lines.join("\n")
}
