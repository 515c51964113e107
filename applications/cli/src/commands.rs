//! Interactive command parsing

use crate::error::{CliError, Result};
use cadence_core::PlayMode;

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Flip play/pause
    Toggle,
    Pause,
    Next,
    Previous,
    /// Seek to an absolute position in seconds
    Seek(f64),
    /// Seek to a percentage of the track
    SeekPercent(f64),
    Volume(i32),
    Mute,
    /// Cycle to the next mode, or switch to the given one
    Mode(Option<PlayMode>),
    /// Play the loaded playlist from an index
    PlayAll(usize),
    Shuffle,
    /// Play the track at a playlist position
    Pick(usize),
    Clear,
    Status,
    List,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  play | p              toggle play/pause
  pause                 pause
  next | n              next track
  prev | b              previous track
  seek <secs|N%>        seek to a position or percentage
  vol <0-100>           set volume (0 mutes)
  mute                  toggle mute
  mode [name]           cycle mode, or set sequential|loop|random|single
  all [index]           play the playlist from index
  shuffle               shuffle the playlist and play
  pick <index>          play one track from the playlist
  clear                 drop the playlist
  status | s            show the session
  list | ls             show the playlist
  quit | q              save and exit";

impl ReplCommand {
    /// Parse a prompt line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();

        let command = match name.to_ascii_lowercase().as_str() {
            "play" | "p" | "toggle" => Self::Toggle,
            "pause" => Self::Pause,
            "next" | "n" => Self::Next,
            "prev" | "previous" | "b" => Self::Previous,
            "seek" => parse_seek(arg)?,
            "vol" | "volume" => Self::Volume(required(name, arg)?),
            "mute" | "m" => Self::Mute,
            "mode" => Self::Mode(arg.map(parse_mode).transpose()?),
            "all" => Self::PlayAll(arg.map(|a| parse_number(name, a)).transpose()?.unwrap_or(0)),
            "shuffle" => Self::Shuffle,
            "pick" => Self::Pick(required(name, arg)?),
            "clear" => Self::Clear,
            "status" | "s" => Self::Status,
            "list" | "ls" => Self::List,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(CliError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn required<T: std::str::FromStr>(command: &str, arg: Option<&str>) -> Result<T> {
    let arg = arg.ok_or_else(|| CliError::invalid_argument(command, "missing value"))?;
    parse_number(command, arg)
}

fn parse_number<T: std::str::FromStr>(command: &str, arg: &str) -> Result<T> {
    arg.parse()
        .map_err(|_| CliError::invalid_argument(command, format!("'{arg}' is not a number")))
}

fn parse_seek(arg: Option<&str>) -> Result<ReplCommand> {
    let arg = arg.ok_or_else(|| CliError::invalid_argument("seek", "missing position"))?;
    match arg.strip_suffix('%') {
        Some(percent) => Ok(ReplCommand::SeekPercent(parse_number("seek", percent)?)),
        None => Ok(ReplCommand::Seek(parse_number("seek", arg)?)),
    }
}

fn parse_mode(arg: &str) -> Result<PlayMode> {
    let name = arg.to_ascii_lowercase();
    let name = match name.as_str() {
        "shuffle" => "random",
        "repeat" => "loop",
        "one" => "single",
        other => other,
    };
    PlayMode::from_str(name)
        .ok_or_else(|| CliError::invalid_argument("mode", format!("unknown mode '{arg}'")))
}
