use anyhow::Result;
use clap::Parser;

use konfsave::cli::{Cli, Command};
use konfsave::commands;
use konfsave::logging::{self, Logger};
use konfsave::prompt::StdinConfirm;

#[allow(clippy::print_stdout)]
fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    logging::init_subscriber(args.verbose, args.command.name());
    let log = Logger::new(args.command.name());

    // Prompts block on stdin; leave with the conventional SIGINT status
    if let Err(e) = ctrlc::set_handler(|| {
        println!("\nAction cancelled.");
        std::process::exit(130);
    }) {
        log.debug(&format!("cannot install the interrupt handler: {e}"));
    }

    let result = dispatch(args, &log);
    if result.is_err() {
        log.hint_log_file();
    }
    result
}

fn dispatch(args: Cli, log: &Logger) -> Result<()> {
    let global = &args.global;
    let confirm = StdinConfirm;
    match args.command {
        Command::Info(opts) => commands::info::run(global, &opts, log),
        Command::Files(opts) => commands::files::run(global, &opts, log),
        Command::Groups(opts) => commands::groups::run(global, &opts, log),
        Command::Save(opts) => commands::save::run(global, &opts, &confirm, log),
        Command::Load(opts) => commands::load::run(global, &opts, &confirm, log),
        Command::Change(opts) => commands::change::run(global, &opts, log),
        Command::Rename(opts) => commands::rename::run(global, &opts, log),
        Command::Delete(opts) => commands::delete::run(global, &opts, &confirm, log),
        Command::Archive(opts) => commands::archive::run_archive(global, &opts, log),
        Command::Unarchive(opts) => {
            commands::archive::run_unarchive(global, &opts, &confirm, log)
        }
        Command::Completions(opts) => {
            commands::completions::run(&opts);
            Ok(())
        }
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
