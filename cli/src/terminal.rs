use anyhow::Context;
use helpers::general::lin_interp;
use racebet::core::competitor::Competitor;
use racebet::core::handle_race::handle_race;
use racebet::core::session::{Phase, Stake, WagerSession};
use racebet::interfaces::cues::{Cue, CueSink};
use racebet::interfaces::gui_interface::RaceState;
use racebet::post::race_record::format_leaderboard;
use racebet::pre::read_game_pars::GamePars;
use rand::rngs::StdRng;
use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const BAR_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select(usize),
    Wager(Stake),
    Race,
    Again,
    Board,
    Status,
    Help,
    Quit,
}

/// parse_command turns one input line into a command. Competitors are numbered from 1 on the
/// terminal.
pub fn parse_command(line: &str) -> anyhow::Result<Command> {
    let mut tokens = line.split_whitespace();
    let keyword = match tokens.next() {
        Some(keyword) => keyword.to_lowercase(),
        None => anyhow::bail!("Empty command, type 'help' for a list of commands"),
    };
    let arg = tokens.next();

    let command = match (keyword.as_str(), arg) {
        ("select", Some(arg)) | ("s", Some(arg)) => {
            let no: usize = arg
                .parse()
                .context(format!("'{}' is not a competitor number", arg))?;
            if no == 0 {
                anyhow::bail!("Competitors are numbered from 1");
            }
            Command::Select(no - 1)
        }
        ("bet", Some(arg)) | ("b", Some(arg)) => {
            if arg.eq_ignore_ascii_case("all") {
                Command::Wager(Stake::AllIn)
            } else {
                let amount: u64 = arg
                    .parse()
                    .context(format!("'{}' is not a wager, use a number or 'all'", arg))?;
                Command::Wager(Stake::Amount(amount))
            }
        }
        ("race", None) | ("r", None) => Command::Race,
        ("again", None) | ("a", None) => Command::Again,
        ("board", None) => Command::Board,
        ("status", None) => Command::Status,
        ("help", None) | ("h", None) => Command::Help,
        ("quit", None) | ("q", None) | ("exit", None) => Command::Quit,
        _ => anyhow::bail!("Unknown command '{}', type 'help' for a list of commands", line.trim()),
    };

    if tokens.next().is_some() {
        anyhow::bail!("Too many arguments in '{}'", line.trim());
    }
    Ok(command)
}

/// format_race_state draws one bar per runner, the position is mapped onto the bar width.
pub fn format_race_state(race_state: &RaceState, roster: &[Competitor]) -> Vec<String> {
    race_state
        .runner_states
        .iter()
        .map(|runner_state| {
            let filled = lin_interp(
                runner_state.position,
                0.0,
                race_state.finish,
                0.0,
                BAR_WIDTH as f64,
            )
            .round() as usize;
            let glyph = roster
                .get(runner_state.idx)
                .map(|c| c.glyph.as_str())
                .unwrap_or("?");
            format!(
                "{}|{}{}{}| {:5.1}",
                glyph,
                "=".repeat(filled.saturating_sub(1)),
                if filled > 0 { ">" } else { "" },
                " ".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
                runner_state.position
            )
        })
        .collect()
}

pub struct TerminalGame<'a, C: CueSink> {
    pub session: WagerSession,
    game_pars: &'a GamePars,
    roster: &'a [Competitor],
    rng: StdRng,
    realtime_factor: f64,
    cues: C,
}

impl<'a, C: CueSink> TerminalGame<'a, C> {
    pub fn new(
        game_pars: &'a GamePars,
        roster: &'a [Competitor],
        rng: StdRng,
        realtime_factor: f64,
        cues: C,
    ) -> TerminalGame<'a, C> {
        TerminalGame {
            session: WagerSession::new(&game_pars.session_pars, roster.len()),
            game_pars,
            roster,
            rng,
            realtime_factor,
            cues,
        }
    }

    /// run reads commands until the input ends or the player quits.
    pub fn run<R: BufRead>(&mut self, input: R) -> anyhow::Result<()> {
        self.print_help();
        self.print_status();

        for line in input.lines() {
            let line = line.context("Failed to read from the terminal!")?;
            if line.trim().is_empty() {
                continue;
            }

            match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command)?,
                Err(err) => println!("{:#}", err),
            }
        }

        Ok(())
    }

    pub fn execute(&mut self, command: Command) -> anyhow::Result<()> {
        debug!("command {:?}", command);
        match command {
            Command::Select(idx) => {
                if self.session.select_competitor(idx) {
                    self.cues.play(Cue::Select);
                    println!("Selected {}", self.roster[idx].label());
                }
            }
            Command::Wager(stake) => match self.session.place_wager(stake) {
                Ok(true) => {
                    self.cues.play(Cue::Wager);
                    println!("Wager: {} coins", self.session.current_wager());
                }
                Ok(false) => (),
                Err(err) => println!("You don't have that many coins! 💸 ({})", err),
            },
            Command::Race => self.race()?,
            Command::Again => {
                if self.session.phase() == Phase::Result {
                    self.session.reset();
                    self.cues.play(Cue::Reset);
                    self.print_status();
                }
            }
            Command::Board => self.print_leaderboard(),
            Command::Status => self.print_status(),
            Command::Help => self.print_help(),
            Command::Quit => (),
        }
        Ok(())
    }

    fn race(&mut self) -> anyhow::Result<()> {
        let mut race = match self.session.start_race(&self.game_pars.race_pars, &mut self.rng) {
            Some(race) => race,
            None => return Ok(()),
        };
        self.cues.play(Cue::Race);
        println!("Balance after wager: {} coins", self.session.balance());

        // the race runs on its own thread, this thread only renders what it forwards
        let (tx, rx) = flume::unbounded();
        let realtime_factor = self.realtime_factor;
        let race_thread =
            thread::spawn(move || handle_race(&mut race, Some(&tx), realtime_factor));

        let no_lines = self.roster.len();
        let mut first_frame = true;
        let mut final_state = None;
        for race_state in rx.iter() {
            if !first_frame {
                print!("\x1b[{}A", no_lines);
            }
            first_frame = false;
            for line in format_race_state(&race_state, self.roster) {
                println!("{}", line);
            }
            std::io::stdout().flush().context("Failed to flush the terminal!")?;
            if race_state.final_result.is_some() {
                final_state = Some(race_state);
            }
        }

        let race_result = match race_thread.join() {
            Ok(race_result) => race_result?,
            Err(_) => anyhow::bail!("Race thread panicked!"),
        };
        if final_state.is_none() {
            warn!("race finished without a final state, using the returned result");
        }

        thread::sleep(Duration::from_millis(self.game_pars.session_pars.result_delay_ms));
        race_result.print_standings(self.roster);
        self.settle(race_result.winner);
        Ok(())
    }

    fn settle(&mut self, winner: usize) {
        let record = match self.session.settle(winner) {
            Some(record) => record.clone(),
            None => return,
        };

        println!("Winner: {}", self.roster[winner].label());
        if record.won {
            self.cues.play(Cue::Win);
            println!("🎉 YOU WON! 🎉 You won {} coins! 💰", record.payout);
        } else {
            self.cues.play(Cue::Lose);
            println!("😢 YOU LOST! 😢 You lost {} coins...", record.wager);
        }
        self.print_status();
        self.print_leaderboard();

        if self.session.recovery_pending() {
            // blocks input on purpose, nothing else can happen until the grant is paid
            thread::sleep(Duration::from_millis(
                self.game_pars.session_pars.recovery_delay_ms,
            ));
            if self.session.grant_recovery() {
                println!(
                    "Game over! You are out of coins! 😭 You get {} new coins to keep playing! 🎮",
                    self.session.balance()
                );
            }
        }
        println!("Type 'again' to play another race.");
    }

    fn print_status(&self) {
        let selected = self
            .session
            .selected_competitor()
            .map(|idx| self.roster[idx].label())
            .unwrap_or_else(|| String::from("-"));
        println!(
            "Coins: {} | Total winnings: {} | Wager: {} | Runner: {}",
            self.session.balance(),
            self.session.total_winnings(),
            self.session.current_wager(),
            selected
        );
    }

    fn print_leaderboard(&self) {
        println!("Recent races:");
        let board = self.session.leaderboard();
        for line in format_leaderboard(&board, self.roster) {
            println!("  {}", line);
        }
    }

    fn print_help(&self) {
        println!("Runners:");
        for competitor in self.roster.iter() {
            println!("  {}: {}", competitor.idx + 1, competitor.label());
        }
        let stakes: Vec<String> = self.session.stakes().iter().map(|s| s.to_string()).collect();
        println!("Commands:");
        println!("  select N | s N     pick runner N");
        println!("  bet N | b N        wager N coins (stakes: {}), or 'bet all'", stakes.join(", "));
        println!("  race | r           start the race");
        println!("  again | a          play again after a race");
        println!("  board              show recent races");
        println!("  status             show coins and wager");
        println!("  quit | q           end the game");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use racebet::core::competitor::create_roster;
    use racebet::core::race::RacePars;
    use racebet::interfaces::cues::{RecordingCues, SilentCues};
    use racebet::interfaces::gui_interface::RunnerState;
    use rand::SeedableRng;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("select 3").unwrap(), Command::Select(2));
        assert_eq!(parse_command("S 1").unwrap(), Command::Select(0));
        assert_eq!(parse_command("bet 25").unwrap(), Command::Wager(Stake::Amount(25)));
        assert_eq!(parse_command("b ALL").unwrap(), Command::Wager(Stake::AllIn));
        assert_eq!(parse_command(" race ").unwrap(), Command::Race);
        assert_eq!(parse_command("again").unwrap(), Command::Again);
        assert_eq!(parse_command("q").unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_bad_commands() {
        assert!(parse_command("select 0").is_err());
        assert!(parse_command("select x").is_err());
        assert!(parse_command("bet -5").is_err());
        assert!(parse_command("race now").is_err());
        assert!(parse_command("gallop").is_err());
        assert!(parse_command("").is_err());
    }

    #[test]
    fn bars_follow_positions() {
        let roster = create_roster(&GamePars::default().competitors).unwrap();
        let race_state = RaceState {
            runner_states: vec![
                RunnerState {
                    idx: 0,
                    position: 0.0,
                    speed: 0.5,
                },
                RunnerState {
                    idx: 1,
                    position: 100.0,
                    speed: 1.0,
                },
            ],
            cur_step: 10,
            no_steps: 60,
            finish: 100.0,
            final_result: None,
        };
        let lines = format_race_state(&race_state, &roster);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("🐴|     "));
        assert!(lines[1].contains(&format!("{}>|", "=".repeat(BAR_WIDTH - 1))));
    }

    #[test]
    fn scripted_game_settles_races() {
        let mut game_pars = GamePars::default();
        game_pars.race_pars = RacePars {
            duration_ms: 3,
            step_interval_ms: 1,
            ..RacePars::default()
        };
        game_pars.session_pars.result_delay_ms = 0;
        game_pars.session_pars.recovery_delay_ms = 0;
        let roster = create_roster(&game_pars.competitors).unwrap();

        let mut game = TerminalGame::new(
            &game_pars,
            &roster,
            StdRng::seed_from_u64(5),
            100.0,
            RecordingCues::default(),
        );
        let script = "s 2\nb 10\nr\nr\nagain\ns 3\nb 200\nb all\nrace\nq\ns 1\n";
        game.run(script.as_bytes()).unwrap();

        assert_eq!(game.session.history().len(), 2);
        assert_eq!(game.session.history()[0].wager, 10);
        assert_eq!(game.session.history()[0].competitor, 1);
        assert_eq!(game.session.history()[1].competitor, 2);
        assert_eq!(game.session.phase(), Phase::Result);
        assert_eq!(game.cues.played.iter().filter(|&&c| c == Cue::Race).count(), 2);
    }

    #[test]
    fn silent_game_still_plays() {
        let mut game_pars = GamePars::default();
        game_pars.race_pars = RacePars {
            duration_ms: 2,
            step_interval_ms: 1,
            ..RacePars::default()
        };
        game_pars.session_pars.result_delay_ms = 0;
        game_pars.session_pars.recovery_delay_ms = 0;
        let roster = create_roster(&game_pars.competitors).unwrap();

        let mut game =
            TerminalGame::new(&game_pars, &roster, StdRng::seed_from_u64(9), 100.0, SilentCues);
        game.run("s 4
b 50
race
".as_bytes()).unwrap();

        let record = &game.session.history()[0];
        assert_eq!(record.competitor, 3);
        assert_eq!(game.session.balance(), if record.won { 150 } else { 50 });
    }
}
