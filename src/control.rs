//! Commands accepted by the runtime loop.
//!
//! Every control surface (the MPRIS service, the line-oriented stdin
//! reader) translates its input into a `ControlCmd` and sends it down the
//! same channel, so the controller is only ever touched from one thread.

use std::path::PathBuf;
use std::str::FromStr;

use crate::player::RepeatMode;

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Play the queue entry at this index.
    PlayIndex(usize),
    /// Absolute position in seconds.
    Seek(f64),
    /// Relative jump in seconds.
    SeekBy(f64),
    SetVolume(f32),
    ToggleShuffle,
    SetShuffle(bool),
    ToggleRepeat,
    SetRepeat(RepeatMode),
    /// Replace the queue with tracks loaded from a directory or track list.
    Open(PathBuf),
    /// Print a one-line summary of the playback state.
    Status,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}`")]
    Unknown(String),

    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("`{command}`: invalid argument `{value}`")]
    InvalidArgument { command: &'static str, value: String },
}

impl FromStr for ControlCmd {
    type Err = ParseCommandError;

    /// Parse one line of the text protocol, e.g. `seek +10` or `repeat all`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then_some(rest);

        let cmd = match word.to_ascii_lowercase().as_str() {
            "" => return Err(ParseCommandError::Empty),
            "quit" | "q" | "exit" => Self::Quit,
            "play" => match arg {
                None => Self::Play,
                Some(n) => Self::PlayIndex(parse_number("play", n)?),
            },
            "pause" => Self::Pause,
            "toggle" | "play-pause" => Self::PlayPause,
            "stop" => Self::Stop,
            "next" | "n" => Self::Next,
            "prev" | "previous" | "p" => Self::Prev,
            "seek" => {
                let value = arg.ok_or(ParseCommandError::MissingArgument {
                    command: "seek",
                    expected: "a position in seconds",
                })?;
                if value.starts_with('+') || value.starts_with('-') {
                    Self::SeekBy(parse_number("seek", value)?)
                } else {
                    Self::Seek(parse_number("seek", value)?)
                }
            }
            "vol" | "volume" => {
                let value = arg.ok_or(ParseCommandError::MissingArgument {
                    command: "vol",
                    expected: "a level between 0 and 1",
                })?;
                Self::SetVolume(parse_number("vol", value)?)
            }
            "shuffle" => match arg.map(str::to_ascii_lowercase).as_deref() {
                None => Self::ToggleShuffle,
                Some("on" | "true" | "1") => Self::SetShuffle(true),
                Some("off" | "false" | "0") => Self::SetShuffle(false),
                Some(other) => {
                    return Err(ParseCommandError::InvalidArgument {
                        command: "shuffle",
                        value: other.to_string(),
                    });
                }
            },
            "repeat" | "loop" => match arg.map(str::to_ascii_lowercase).as_deref() {
                None => Self::ToggleRepeat,
                Some("none" | "off") => Self::SetRepeat(RepeatMode::None),
                Some("one" | "track") => Self::SetRepeat(RepeatMode::One),
                Some("all" | "playlist") => Self::SetRepeat(RepeatMode::All),
                Some(other) => {
                    return Err(ParseCommandError::InvalidArgument {
                        command: "repeat",
                        value: other.to_string(),
                    });
                }
            },
            "open" | "load" => {
                let path = arg.ok_or(ParseCommandError::MissingArgument {
                    command: "open",
                    expected: "a directory or track list path",
                })?;
                Self::Open(PathBuf::from(path))
            }
            "status" => Self::Status,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        Ok(cmd)
    }
}

fn parse_number<T: FromStr>(command: &'static str, value: &str) -> Result<T, ParseCommandError> {
    value
        .strip_prefix('+')
        .unwrap_or(value)
        .parse()
        .map_err(|_| ParseCommandError::InvalidArgument {
            command,
            value: value.to_string(),
        })
}
