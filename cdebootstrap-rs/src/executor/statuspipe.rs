//! Parses dpkg's `--status-fd` protocol: one `status: <pkg>: <state>`
//! line per package-status transition.

use std::io::{BufRead, BufReader, Read};
use std::sync::OnceLock;

use debuniverse::Status;
use regex::Regex;

fn status_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^status: ([a-z0-9.+-]+): ([a-z-]+)$").expect("valid regex"))
}

/// Parses a single status-fd line, returning `(package, status)` if it
/// matches the expected shape and names a recognized status.
pub(super) fn parse_status_line(line: &str) -> Option<(String, Status)> {
    let caps = status_line_re().captures(line.trim_end_matches(['\r', '\n']))?;
    let name = caps.get(1)?.as_str().to_string();
    let status = Status::parse(caps.get(2)?.as_str())?;
    Some((name, status))
}

/// Reads every status-fd line from `pipe`, logging a transition message
/// whenever the parsed status reaches `unpacked` or `installed`.
///
/// Unlike stdout/stderr, this never fails the command: an unparseable
/// line is dropped with a trace log rather than treated as an error.
pub(super) fn read_status_pipe<R: Read>(pipe: Option<R>) -> Vec<(String, Status)> {
    let Some(pipe) = pipe else {
        return Vec::new();
    };

    let mut reader = BufReader::new(pipe);
    let mut line_buf = String::new();
    let mut updates = Vec::new();

    loop {
        line_buf.clear();
        match reader.read_line(&mut line_buf) {
            Ok(0) => break,
            Ok(_) => match parse_status_line(&line_buf) {
                Some((name, status)) => {
                    if matches!(status, Status::Unpacked | Status::Installed) {
                        tracing::info!(package = %name, status = %status, "package status transition");
                    }
                    updates.push((name, status));
                }
                None => tracing::trace!(line = %line_buf.trim_end(), "unparseable status-fd line"),
            },
            Err(e) => {
                tracing::warn!(error = %e, "I/O error reading status pipe, stopping read");
                break;
            }
        }
    }

    updates
}
