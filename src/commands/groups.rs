//! Command: list default or available file groups.
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::cli::{GlobalOpts, GroupsOpts};
use crate::commands::CommandSetup;
use crate::config::Config;
use crate::config::groups::Member;
use crate::logging::{BufferedLog, Log};
use crate::paths::display_tilde;
use crate::resolver::{Defaults, PathSpec, Request, Resolver};

/// How much of each group to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Detail {
    Names,
    Definitions,
    Paths,
    Files,
}

impl Detail {
    const fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Names,
            1 => Self::Definitions,
            2 => Self::Paths,
            _ => Self::Files,
        }
    }
}

/// A titled list of groups, optionally with their contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupListing {
    /// Heading printed above the list.
    pub title: &'static str,
    /// Group names, in display order.
    pub groups: Vec<String>,
    /// Per-group contents when detail was requested.
    pub contents: Option<Vec<(String, Vec<String>)>>,
}

impl GroupListing {
    /// Build the listing for `available` and `expand` counts.
    #[must_use]
    pub fn build(config: &Config, home: &Path, available: u8, expand: u8, log: &dyn Log) -> Self {
        let catalog = &config.catalog;
        let (title, groups): (_, Vec<String>) = match available {
            0 => ("Default groups:", config.settings.default_groups.clone()),
            1 => (
                "Available metagroups:",
                catalog.metagroups().map(str::to_string).collect(),
            ),
            _ => (
                "All available groups:",
                catalog.groups().map(str::to_string).collect(),
            ),
        };

        let detail = Detail::from_count(expand);
        let contents = (detail != Detail::Names).then(|| {
            groups
                .iter()
                .map(|name| (name.clone(), group_contents(config, home, name, detail, log)))
                .collect()
        });

        Self {
            title,
            groups,
            contents,
        }
    }

    /// Plain-text rendering.
    #[must_use]
    pub fn render_text(&self) -> String {
        let Some(contents) = &self.contents else {
            return format!("{}\n{}", self.title, self.groups.join(", "));
        };
        let mut out = self.title.to_string();
        for (name, items) in contents {
            out.push('\n');
            out.push_str(name);
            for item in items {
                out.push_str("\n  ");
                out.push_str(item);
            }
        }
        out
    }

    /// JSON rendering: a list of names, or a map of name to contents.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn render_json(&self) -> serde_json::Result<String> {
        let Some(contents) = &self.contents else {
            return serde_json::to_string_pretty(&self.groups);
        };
        let map: BTreeMap<&str, &[String]> = contents
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_slice()))
            .collect();
        serde_json::to_string_pretty(&map)
    }
}

fn group_contents(
    config: &Config,
    home: &Path,
    name: &str,
    detail: Detail,
    log: &dyn Log,
) -> Vec<String> {
    let catalog = &config.catalog;
    match detail {
        Detail::Names => Vec::new(),
        Detail::Definitions => catalog
            .definition(name)
            .unwrap_or_default()
            .iter()
            .map(|member| match member {
                Member::Path(p) => display_tilde(p, home),
                Member::Group(g) => g.clone(),
            })
            .collect(),
        Detail::Paths => catalog
            .resolve(name)
            .map(|paths| paths.iter().map(|p| display_tilde(p, home)).collect())
            .unwrap_or_default(),
        Detail::Files => {
            let resolver = Resolver::new(catalog, Vec::new(), Vec::new(), home);
            let request = Request::default()
                .with_defaults(Defaults::Explicit(vec![PathSpec::Group(name.to_string())]));
            resolver
                .resolve(&request, log)
                .sorted_for_display()
                .into_iter()
                .map(|p| display_tilde(p, home))
                .collect()
        }
    }
}

/// Run the groups command.
///
/// # Errors
///
/// Returns an error if setup or JSON serialisation fails.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &GroupsOpts, log: &dyn Log) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let buffered = BufferedLog::new();
    let listing = GroupListing::build(
        &setup.config,
        &setup.layout.home,
        opts.available,
        opts.expand,
        &buffered,
    );
    if opts.json {
        println!("{}", listing.render_json()?);
    } else {
        println!("{}", listing.render_text());
    }
    buffered.replay(log);
    Ok(())
}
