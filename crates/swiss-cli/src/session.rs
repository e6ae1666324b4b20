//! The interactive director loop.

use crate::command::{self, Command, Entrant};
use crate::prompt::Prompter;
use std::io::{BufRead, Write};
use swiss_core::PlayerId;
use swiss_engine::{report, Advance, Director, DirectorError, TournamentSetup};

pub struct Session<R, W> {
    director: Director,
    prompter: Prompter<R, W>,
}

/// Storage failures end the session; everything else is reported and the
/// loop continues.
fn fatal(error: DirectorError) -> Result<String, anyhow::Error> {
    match error {
        DirectorError::Storage(e) => Err(anyhow::Error::new(e).context("cannot save tournament state")),
        other => Ok(format!("Error: {other}")),
    }
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(director: Director, prompter: Prompter<R, W>) -> Self {
        Session { director, prompter }
    }

    /// Runs until `quit` or end of input.
    pub fn run(&mut self) -> anyhow::Result<()> {
        self.prompter.say(command::HELP)?;
        if let Some(tournament) = self.director.tournament() {
            let status = format!(
                "Resuming '{}', round {} of {}",
                tournament.name, tournament.current_round, tournament.total_rounds
            );
            self.prompter.say(status)?;
        }

        while let Some(line) = self.prompter.ask("swiss> ")? {
            let command = match command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    self.prompter.say(format!("Error: {e}"))?;
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            if let Err(e) = self.dispatch(command) {
                match e.downcast::<DirectorError>() {
                    Ok(director_error) => {
                        let message = fatal(director_error)?;
                        self.prompter.say(message)?;
                    }
                    Err(other) => return Err(other),
                }
            }
        }
        self.prompter.say("Saved. Bye.")?;
        Ok(())
    }

    fn dispatch(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Help => self.prompter.say(command::HELP)?,
            Command::Quit => {}
            Command::New => self.new_tournament()?,
            Command::Players => self.list_players()?,
            _ if self.director.tournament().is_none() => {
                self.prompter.say("No tournament is running; type 'new' to create one.")?
            }
            Command::Result { match_id, outcome } => {
                let advance = self.director.record_result(match_id, outcome)?;
                self.prompter.say(format!("Match {match_id}: {outcome}"))?;
                self.show_advance(advance)?;
            }
            Command::Cancel { match_id } => {
                let previous = self.director.cancel_result(match_id)?;
                self.prompter
                    .say(format!("Match {match_id}: {previous} cancelled, now pending"))?;
            }
            Command::Withdraw { player } => {
                let advance = self.director.withdraw(&player)?;
                self.prompter.say(format!("{player} withdrawn"))?;
                self.show_advance(advance)?;
            }
            Command::Advance { allow_repeats } => {
                let mut options = self.director.config().pairing.clone();
                options.allow_forced_repeats |= allow_repeats;
                let advance = self.director.advance_with(&options)?;
                self.show_advance(advance)?;
            }
            Command::Pairings { round } => self.show_pairings(round)?,
            Command::Standings => {
                let table = self.director.standings()?;
                let round = self.director.tournament().map_or(0, |t| t.current_round);
                self.prompter
                    .say(report::standings(&format!("Standings, round {round}"), &table))?;
            }
            Command::Schedule => {
                if let Some(tournament) = self.director.tournament() {
                    let text = report::schedule(tournament);
                    self.prompter.say(text)?;
                }
            }
        }
        Ok(())
    }

    fn show_pairings(&mut self, round: Option<u32>) -> anyhow::Result<()> {
        let Some(tournament) = self.director.tournament() else {
            return Ok(());
        };
        let index = round.unwrap_or(tournament.current_round);
        let text = match tournament.round(index) {
            Some(found) => report::pairings(tournament, found),
            None => format!("Round {index} has not been paired."),
        };
        self.prompter.say(text)?;
        Ok(())
    }

    fn show_advance(&mut self, advance: Advance) -> anyhow::Result<()> {
        match advance {
            Advance::Pending { round, remaining } => {
                self.prompter
                    .say(format!("{remaining} game(s) left in round {round}"))?;
            }
            Advance::Paired { round } => {
                self.show_pairings(Some(round - 1))?;
                let table = self.director.standings()?;
                self.prompter.say(report::standings(
                    &format!("Standings after round {}", round - 1),
                    &table,
                ))?;
                self.show_pairings(Some(round))?;
            }
            Advance::Blocked { round, error } => {
                self.prompter.say(format!(
                    "Round {round} cannot be paired ({error}); withdraw a player or type 'advance repeats'"
                ))?;
            }
            Advance::Finalized { standings, archive } => {
                self.prompter.say(report::standings("Final standings", &standings))?;
                self.prompter
                    .say(format!("Tournament archived to {}", archive.display()))?;
            }
        }
        Ok(())
    }

    fn list_players(&mut self) -> anyhow::Result<()> {
        let lines: Vec<String> = self
            .director
            .registry()
            .records()
            .iter()
            .map(|r| {
                format!(
                    "{:<10} {:<28} {:>5} {:>5} games  {}/{}/{}/{} medals",
                    r.id.as_str(),
                    r.display_name(),
                    r.elo,
                    r.games_played,
                    r.medals.gold,
                    r.medals.silver,
                    r.medals.bronze,
                    r.medals.wood
                )
            })
            .collect();
        if lines.is_empty() {
            self.prompter.say("No registered players.")?;
        }
        for line in lines {
            self.prompter.say(line)?;
        }
        Ok(())
    }

    fn new_tournament(&mut self) -> anyhow::Result<()> {
        if let Some(live) = self.director.tournament() {
            let message = format!("Error: tournament '{}' is still running", live.name);
            self.prompter.say(message)?;
            return Ok(());
        }
        let Some(name) = self.prompter.ask_parsed("Name: ", |s| {
            if s.is_empty() {
                Err("the name cannot be empty")
            } else {
                Ok(s.to_string())
            }
        })?
        else {
            return Ok(());
        };
        let Some(start_date) = self.prompter.ask_parsed("Start date (YYYY-MM-DD): ", command::parse_date)? else {
            return Ok(());
        };
        let Some(end_date) = self.prompter.ask_parsed("End date (YYYY-MM-DD): ", |s| {
            let end = command::parse_date(s).map_err(|e| e.to_string())?;
            if end < start_date {
                Err("the end date is before the start date".to_string())
            } else {
                Ok(end)
            }
        })?
        else {
            return Ok(());
        };
        let Some(rounds) = self.prompter.ask_parsed("Rounds: ", |s| match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("'{s}' is not a positive number")),
        })?
        else {
            return Ok(());
        };

        self.prompter.say(
            "Players: a registry ID or 'Family, Given, Elo[, YYYY-MM-DD[, m|w[, FED]]]'; empty line to finish",
        )?;
        let mut players: Vec<PlayerId> = Vec::new();
        while let Some(line) = self.prompter.ask("  player: ")? {
            if line.is_empty() {
                break;
            }
            let id = match command::parse_entrant(&line) {
                Ok(Entrant::Registered(id)) if self.director.registry().contains(&id) => id,
                Ok(Entrant::Registered(id)) => {
                    self.prompter.say(format!("  {id} is not registered"))?;
                    continue;
                }
                Ok(Entrant::Newcomer(newcomer)) => match self.director.register_player(newcomer) {
                    Ok(id) => {
                        self.prompter.say(format!("  registered as {id}"))?;
                        id
                    }
                    Err(e) => {
                        let message = fatal(e)?;
                        self.prompter.say(format!("  {message}"))?;
                        continue;
                    }
                },
                Err(e) => {
                    self.prompter.say(format!("  {e}"))?;
                    continue;
                }
            };
            if players.contains(&id) {
                self.prompter.say(format!("  {id} is already entered"))?;
            } else {
                players.push(id);
            }
        }

        let setup = TournamentSetup {
            name,
            start_date,
            end_date,
            rounds,
            players,
        };
        let tournament = self.director.create_tournament(setup)?;
        let text = match tournament.current() {
            Some(round) => report::pairings(tournament, round),
            None => String::new(),
        };
        self.prompter.say(text)?;
        Ok(())
    }
}
