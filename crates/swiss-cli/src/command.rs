//! Parsing of console input lines.

use chrono::NaiveDate;
use swiss_core::{Outcome, OutcomeError, PlayerId};
use swiss_engine::registry::{NewPlayer, Sex};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help' for the list")]
    Unknown(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{0}' is not a number")]
    InvalidNumber(String),
    #[error("'{0}' is not a date, use YYYY-MM-DD")]
    InvalidDate(String),
    #[error("'{0}' is not a sex, use m or w")]
    InvalidSex(String),
    #[error(transparent)]
    Outcome(#[from] OutcomeError),
    #[error("unexpected '{0}'")]
    Unexpected(String),
    #[error("expected 'Family, Given, Elo[, YYYY-MM-DD[, m|w[, FED]]]' or a player ID")]
    Entrant,
}

/// A console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    Players,
    Result { match_id: u32, outcome: Outcome },
    Cancel { match_id: u32 },
    Pairings { round: Option<u32> },
    Standings,
    Schedule,
    Withdraw { player: PlayerId },
    /// Retry a round transition, optionally permitting repeated opponents.
    Advance { allow_repeats: bool },
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  new                        create a tournament
  players                    list registered players
  result <match> <W|B|D|F>   enter a result
  cancel <match>             cancel a result of the current round
  pairings [round]           show pairings (current round by default)
  standings                  show the standings
  schedule                   show the round dates
  withdraw <player>          withdraw a player from later rounds
  advance [repeats]          retry pairing the next round
  help                       show this list
  quit                       save and exit";

/// Parses one command line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "new" => Command::New,
        "players" => Command::Players,
        "result" | "r" => {
            let match_id = number(words.next(), "result", "a match ID")?;
            let tag = words.next().ok_or(CommandError::MissingArgument {
                command: "result",
                argument: "an outcome (W, B, D or F)",
            })?;
            Command::Result {
                match_id,
                outcome: tag.parse()?,
            }
        }
        "cancel" => Command::Cancel {
            match_id: number(words.next(), "cancel", "a match ID")?,
        },
        "pairings" | "p" => Command::Pairings {
            round: words.next().map(parse_number).transpose()?,
        },
        "standings" | "s" => Command::Standings,
        "schedule" => Command::Schedule,
        "withdraw" => {
            let player = words.next().ok_or(CommandError::MissingArgument {
                command: "withdraw",
                argument: "a player ID",
            })?;
            Command::Withdraw {
                player: PlayerId::new(player.to_ascii_uppercase()),
            }
        }
        "advance" => match words.next() {
            None => Command::Advance {
                allow_repeats: false,
            },
            Some(word) if word.eq_ignore_ascii_case("repeats") => Command::Advance {
                allow_repeats: true,
            },
            Some(word) => return Err(CommandError::Unexpected(word.to_string())),
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    match words.next() {
        Some(extra) => Err(CommandError::Unexpected(extra.to_string())),
        None => Ok(Some(command)),
    }
}

fn parse_number(word: &str) -> Result<u32, CommandError> {
    word.parse()
        .map_err(|_| CommandError::InvalidNumber(word.to_string()))
}

fn number(
    word: Option<&str>,
    command: &'static str,
    argument: &'static str,
) -> Result<u32, CommandError> {
    parse_number(word.ok_or(CommandError::MissingArgument { command, argument })?)
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| CommandError::InvalidDate(text.trim().to_string()))
}

/// A player line while setting up a tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entrant {
    Registered(PlayerId),
    Newcomer(NewPlayer),
}

/// Parses an existing player ID, or `Family, Given, Elo[, YYYY-MM-DD[, m|w[, FED]]]`.
pub fn parse_entrant(line: &str) -> Result<Entrant, CommandError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if let [single] = fields.as_slice() {
        if single.is_empty() || single.contains(char::is_whitespace) {
            return Err(CommandError::Entrant);
        }
        return Ok(Entrant::Registered(PlayerId::new(single.to_ascii_uppercase())));
    }

    let [family, given, elo, rest @ ..] = fields.as_slice() else {
        return Err(CommandError::Entrant);
    };
    if family.is_empty() || given.is_empty() || rest.len() > 3 {
        return Err(CommandError::Entrant);
    }
    let elo = elo
        .parse()
        .map_err(|_| CommandError::InvalidNumber(elo.to_string()))?;
    let mut newcomer = NewPlayer::new(*family, *given, elo);
    if let Some(birth) = rest.first().filter(|s| !s.is_empty()) {
        newcomer.birth_date = Some(parse_date(birth)?);
    }
    if let Some(sex) = rest.get(1).filter(|s| !s.is_empty()) {
        newcomer.sex = match sex.to_ascii_lowercase().as_str() {
            "m" => Sex::Male,
            "w" | "f" => Sex::Female,
            _ => return Err(CommandError::InvalidSex(sex.to_string())),
        };
    }
    if let Some(federation) = rest.get(2).filter(|s| !s.is_empty()) {
        newcomer.federation = federation.to_string();
    }
    Ok(Entrant::Newcomer(newcomer))
}
