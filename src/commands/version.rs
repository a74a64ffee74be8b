//! Command: print version information.

/// Print the konfsave version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("konfsave {}", version());
}

/// The build version, preferring `KONFSAVE_VERSION` when set at compile time.
#[must_use]
pub fn version() -> &'static str {
    option_env!("KONFSAVE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}
