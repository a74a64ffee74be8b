//! Command: print a shell completion script.
use std::io;

use clap::CommandFactory as _;
use clap_complete::generate;

use crate::cli::{Cli, CompletionsOpts};

/// Write the completion script for the requested shell to stdout.
pub fn run(opts: &CompletionsOpts) {
    let mut cmd = Cli::command();
    generate(opts.shell, &mut cmd, "konfsave", &mut io::stdout());
}
