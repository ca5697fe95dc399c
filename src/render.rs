//! Pure rendering of log entries into console and file lines.
//!
//! Every line carries a `[DD/MM/YY HH:MM:SS.mmm]` local timestamp. Console
//! lines wrap the timestamp (and the context, for Dev lines) in an ANSI
//! color: magenta for Dev, blue for Ops. File lines are the same text
//! without escape codes:
//!
//! ```text
//! DEV [14/03/26 09:26:53.589] [DB] [src/db.rs:42] user alice logged in
//! OPS [14/03/26 09:26:53.590] service started
//! ```

use std::fmt::Write as _;

use chrono::{DateTime, Local};

use crate::entry::{EntryKind, LogEntry};

const TIMESTAMP_FORMAT: &str = "%d/%m/%y %H:%M:%S%.3f";
const DEV_COLOR: &str = "\x1b[0;35m";
const OPS_COLOR: &str = "\x1b[0;34m";
const RESET: &str = "\x1b[0m";

/// Appends the entry's message to `out`.
///
/// With no arguments the message is copied verbatim. Otherwise each `{}` is
/// replaced by the next argument, `{{` and `}}` collapse to a single brace,
/// and a placeholder without a matching argument renders as `{MISSING}`.
pub fn expand_message(message: &str, args: &[String], out: &mut String) {
    if args.is_empty() {
        out.push_str(message);
        return;
    }

    let mut chars = message.chars().peekable();
    let mut next_arg = args.iter();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('}')) => {
                chars.next();
                match next_arg.next() {
                    Some(arg) => out.push_str(arg),
                    None => out.push_str("{MISSING}"),
                }
            }
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            _ => out.push(c),
        }
    }
}

/// Renders a colorized console line (newline included) into `out`.
pub fn console_line(entry: &LogEntry, now: DateTime<Local>, out: &mut String) {
    out.clear();
    let stamp = now.format(TIMESTAMP_FORMAT);
    // Writing into a String cannot fail.
    let _ = match entry.kind() {
        EntryKind::Dev => write!(
            out,
            "DEV {DEV_COLOR}[{stamp}] [{}]{RESET} [{}] ",
            entry.context(),
            entry.source()
        ),
        EntryKind::Ops => write!(out, "OPS {OPS_COLOR}[{stamp}]{RESET} "),
    };
    expand_message(entry.message(), entry.args(), out);
    out.push('\n');
}

/// Renders an uncolored file line (newline included) into `out`.
pub fn file_line(entry: &LogEntry, now: DateTime<Local>, out: &mut String) {
    out.clear();
    let _ = write!(out, "{} [{}] ", entry.kind().tag(), now.format(TIMESTAMP_FORMAT));
    if entry.is_dev() {
        let _ = write!(out, "[{}] [{}] ", entry.context(), entry.source());
    }
    expand_message(entry.message(), entry.args(), out);
    out.push('\n');
}
