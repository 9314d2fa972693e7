use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread;

use crate::control::{ControlCmd, ParseCommandError};

/// Read one command per line from stdin until EOF or until the runtime
/// stops listening.
pub fn spawn_reader(tx: Sender<ControlCmd>, scrub_seconds: u64) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin: read failed");
                    break;
                }
            };

            let cmd = match parse_line(&line, scrub_seconds) {
                Ok(cmd) => cmd,
                Err(ParseCommandError::Empty) => continue,
                Err(e) => {
                    tracing::warn!("stdin: {e}");
                    continue;
                }
            };
            if tx.send(cmd).is_err() {
                break;
            }
        }
        tracing::debug!("stdin: reader finished");
    });
}

/// Like `ControlCmd::from_str`, plus the scrub shortcuts.
pub(super) fn parse_line(line: &str, scrub_seconds: u64) -> Result<ControlCmd, ParseCommandError> {
    let scrub = scrub_seconds as f64;
    match line.trim() {
        ">>" | "ff" | "seek +" => Ok(ControlCmd::SeekBy(scrub)),
        "<<" | "rew" | "seek -" => Ok(ControlCmd::SeekBy(-scrub)),
        other => other.parse(),
    }
}
