//! Helpers for the log file: its location, timestamps, and plain-text lines.
use std::env;
use std::fs;
use std::path::PathBuf;

/// Timestamp layout of the log file header.
pub(super) const HEADER_STAMP: &str = "%Y-%m-%d %H:%M:%S";
/// Timestamp layout prefixed to each log file line.
pub(super) const LINE_STAMP: &str = "%H:%M:%S";

/// Current UTC time rendered with a `chrono` format string.
pub(super) fn utc_stamp(layout: &str) -> String {
    chrono::Utc::now().format(layout).to_string()
}

/// Remove terminal escape sequences so log file lines stay plain.
///
/// CSI sequences (`ESC [` ... final byte in `@`..=`~`) are dropped whole;
/// any other escape drops only the byte following `ESC`.
pub(super) fn strip_ansi(s: &str) -> String {
    enum State {
        Text,
        Escape,
        Csi,
    }

    let mut state = State::Text;
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        state = match state {
            State::Text if c == '\x1b' => State::Escape,
            State::Text => {
                out.push(c);
                State::Text
            }
            State::Escape if c == '[' => State::Csi,
            State::Escape => State::Text,
            State::Csi if ('@'..='~').contains(&c) => State::Text,
            State::Csi => State::Csi,
        };
    }
    out
}

/// `<cache>/konfsave/<command>.log`, creating the directory on the way.
///
/// The cache root is `$XDG_CACHE_HOME`, else `$HOME/.cache`. Returns `None`
/// when neither is set or the directory cannot be created.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let root = env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let dir = root.join("konfsave");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}
