use crate::interfaces::racesim_interface::RacesimInterface;
use eframe::{egui, epi};
use helpers::general::lin_interp;
use racebet::core::competitor::Competitor;
use racebet::core::handle_race::handle_race;
use racebet::core::session::{Phase, Stake, WagerSession};
use racebet::interfaces::cues::{Cue, CueSink, RecordingCues};
use racebet::post::race_record::format_leaderboard;
use racebet::post::race_result::RaceResult;
use racebet::pre::read_game_pars::GamePars;
use rand::rngs::StdRng;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const LANE_HEIGHT: f32 = 60.0;
const CUE_FLASH_DURATION: Duration = Duration::from_millis(800);

#[derive(Debug)]
pub struct Outcome {
    pub title: String,
    pub message: String,
    pub won: bool,
    pub winner: usize,
}

#[derive(Debug)]
pub struct RaceGame {
    pub racesim_interface: RacesimInterface,
    pub session: WagerSession,
    pub roster: Vec<Competitor>,
    pub game_pars: GamePars,
    pub realtime_factor: f64,
    rng: StdRng,
    race_thread: Option<JoinHandle<anyhow::Result<RaceResult>>>,
    t_race_end: Option<Instant>,
    t_recovery_due: Option<Instant>,
    pub outcome: Option<Outcome>,
    pub notice: Option<String>,
    pub cues: RecordingCues,
    t_last_cue: Option<Instant>,
}

impl RaceGame {
    pub fn new(
        game_pars: &GamePars,
        roster: Vec<Competitor>,
        rng: StdRng,
        realtime_factor: f64,
    ) -> RaceGame {
        RaceGame {
            racesim_interface: RacesimInterface::default(),
            session: WagerSession::new(&game_pars.session_pars, roster.len()),
            roster,
            game_pars: game_pars.to_owned(),
            realtime_factor,
            rng,
            race_thread: None,
            t_race_end: None,
            t_recovery_due: None,
            outcome: None,
            notice: None,
            cues: RecordingCues::default(),
            t_last_cue: None,
        }
    }

    fn play_cue(&mut self, cue: Cue) {
        self.cues.play(cue);
        self.t_last_cue = Some(Instant::now());
    }

    // ---------------------------------------------------------------------------------------------
    // USER ACTIONS --------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn select_competitor(&mut self, idx: usize) {
        if self.session.select_competitor(idx) {
            self.play_cue(Cue::Select);
        }
    }

    pub fn place_wager(&mut self, stake: Stake) {
        match self.session.place_wager(stake) {
            Ok(true) => {
                self.notice = None;
                self.play_cue(Cue::Wager);
            }
            Ok(false) => (),
            Err(err) => self.notice = Some(format!("You don't have that many coins! 💸 ({})", err)),
        }
    }

    pub fn start_race(&mut self) {
        let mut race = match self.session.start_race(&self.game_pars.race_pars, &mut self.rng) {
            Some(race) => race,
            None => return,
        };

        let (tx, rx) = flume::unbounded();
        let realtime_factor = self.realtime_factor;
        self.race_thread = Some(thread::spawn(move || {
            handle_race(&mut race, Some(&tx), realtime_factor)
        }));
        self.racesim_interface.connect(rx);
        self.outcome = None;
        self.notice = None;
        self.play_cue(Cue::Race);
    }

    pub fn play_again(&mut self) {
        if self.session.phase() != Phase::Result {
            return;
        }
        self.session.reset();
        self.racesim_interface.disconnect();
        self.outcome = None;
        self.play_cue(Cue::Reset);
    }

    // ---------------------------------------------------------------------------------------------
    // TIMERS --------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// update_timers moves the game on once the race thread delivered its result and handles the
    /// delayed recovery grant.
    pub fn update_timers(&mut self) {
        self.racesim_interface.update();

        if self.session.phase() == Phase::Racing && self.t_race_end.is_none() {
            if self.racesim_interface.race_state.final_result.is_some() {
                self.t_race_end = Some(Instant::now());
            } else if self.racesim_interface.disconnected {
                self.recover_race_result();
            }
        }

        let result_delay = Duration::from_millis(self.game_pars.session_pars.result_delay_ms);
        if let Some(t_race_end) = self.t_race_end {
            if t_race_end.elapsed() >= result_delay {
                self.t_race_end = None;
                if let Some(race_result) = self.racesim_interface.race_state.final_result.clone() {
                    self.settle(race_result.winner);
                }
            }
        }

        if let Some(t_recovery_due) = self.t_recovery_due {
            if Instant::now() >= t_recovery_due {
                self.t_recovery_due = None;
                if self.session.grant_recovery() {
                    self.notice = Some(format!(
                        "Game over! You are out of coins! 😭 You get {} new coins to keep playing! 🎮",
                        self.session.balance()
                    ));
                }
            }
        }
    }

    /// recover_race_result joins a race thread that hung up without sending its final state.
    fn recover_race_result(&mut self) {
        let race_thread = match self.race_thread.take() {
            Some(race_thread) => race_thread,
            None => return,
        };
        match race_thread.join() {
            Ok(Ok(race_result)) => {
                self.racesim_interface.race_state.final_result = Some(race_result);
                self.t_race_end = Some(Instant::now());
            }
            Ok(Err(err)) => warn!("race thread failed: {:#}", err),
            Err(_) => warn!("race thread panicked"),
        }
    }

    fn settle(&mut self, winner: usize) {
        if let Some(race_thread) = self.race_thread.take() {
            if let Ok(Err(err)) = race_thread.join() {
                warn!("race thread reported an error after its result: {:#}", err);
            }
        }

        let record = match self.session.settle(winner) {
            Some(record) => record.clone(),
            None => return,
        };

        let outcome = if record.won {
            Outcome {
                title: String::from("🎉 YOU WON! 🎉"),
                message: format!("You won {} coins! 💰", record.payout),
                won: true,
                winner,
            }
        } else {
            Outcome {
                title: String::from("😢 YOU LOST! 😢"),
                message: format!("You lost {} coins...", record.wager),
                won: false,
                winner,
            }
        };
        info!("{} {}", outcome.title, outcome.message);
        self.play_cue(if record.won { Cue::Win } else { Cue::Lose });
        self.outcome = Some(outcome);

        if self.session.recovery_pending() {
            self.t_recovery_due = Some(
                Instant::now()
                    + Duration::from_millis(self.game_pars.session_pars.recovery_delay_ms),
            );
        }
    }

    // ---------------------------------------------------------------------------------------------
    // DRAWING -------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn set_status_content(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(format!("🪙 {}", self.session.balance()));
            ui.separator();
            ui.label(format!("Total winnings: {}", self.session.total_winnings()));
            ui.separator();
            ui.label(format!("Current wager: {}", self.session.current_wager()));

            if let (Some(t_last_cue), Some(cue)) = (self.t_last_cue, self.cues.played.last()) {
                if t_last_cue.elapsed() < CUE_FLASH_DURATION {
                    ui.separator();
                    ui.label(format!("♪ {:?}", cue));
                }
            }
        });
    }

    fn set_controls_content(&mut self, ui: &mut egui::Ui) {
        ui.heading("Pick your runner");
        for idx in 0..self.roster.len() {
            let selected = self.session.selected_competitor() == Some(idx);
            let label = self.roster[idx].label();
            if ui.selectable_label(selected, label).clicked() {
                self.select_competitor(idx);
            }
        }

        ui.separator();
        ui.heading("Place your wager");
        let stakes = self.session.stakes().to_vec();
        ui.horizontal(|ui| {
            for stake in stakes {
                let selected = self.session.current_wager() == stake;
                if ui.selectable_label(selected, format!("{}", stake)).clicked() {
                    self.place_wager(Stake::Amount(stake));
                }
            }
            if ui.button("All in").clicked() {
                self.place_wager(Stake::AllIn);
            }
        });

        if let Some(notice) = &self.notice {
            ui.colored_label(egui::Color32::from_rgb(255, 170, 0), notice);
        }

        ui.separator();
        match self.session.phase() {
            Phase::Selection => {
                let text = if self.session.can_start_race() {
                    "🏁 Start race"
                } else {
                    "Pick a runner and a wager"
                };
                if ui.button(text).clicked() {
                    self.start_race();
                }
            }
            Phase::Racing => {
                ui.label("Racing...");
            }
            Phase::Result => {
                if let Some(outcome) = &self.outcome {
                    let color = if outcome.won {
                        egui::Color32::from_rgb(80, 220, 100)
                    } else {
                        egui::Color32::from_rgb(230, 80, 80)
                    };
                    ui.colored_label(color, outcome.title.as_str());
                    ui.label(format!("Winner: {}", self.roster[outcome.winner].label()));
                    ui.label(outcome.message.as_str());
                }
                if ui.button("Play again").clicked() {
                    self.play_again();
                }
            }
        }

        ui.separator();
        ui.heading("Recent races");
        let board = self.session.leaderboard();
        for line in format_leaderboard(&board, &self.roster) {
            ui.label(line);
        }
    }

    /// set_track_content draws one lane per competitor with the runner at its current position.
    pub fn set_track_content(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let (response, painter) =
            ui.allocate_painter(ui.available_size_before_wrap_finite(), egui::Sense::hover());
        let rect = response.rect;
        let x_start = rect.min.x + 40.0;
        let x_finish = rect.max.x - 60.0;
        let race_state = &self.racesim_interface.race_state;
        let finish = if race_state.finish > 0.0 {
            race_state.finish
        } else {
            self.game_pars.race_pars.finish
        };

        let mut shapes = vec![];

        // finish line
        shapes.push(egui::Shape::line_segment(
            [
                egui::Pos2::new(x_finish, rect.min.y),
                egui::Pos2::new(x_finish, rect.min.y + LANE_HEIGHT * self.roster.len() as f32),
            ],
            egui::Stroke::new(3.0, egui::Color32::WHITE),
        ));

        for (i, competitor) in self.roster.iter().enumerate() {
            let y_center = rect.min.y + LANE_HEIGHT * (i as f32 + 0.5);
            let color = egui::Color32::from_rgb(
                competitor.color.r,
                competitor.color.g,
                competitor.color.b,
            );

            // lane separator
            shapes.push(egui::Shape::line_segment(
                [
                    egui::Pos2::new(rect.min.x, y_center + LANE_HEIGHT / 2.0),
                    egui::Pos2::new(rect.max.x, y_center + LANE_HEIGHT / 2.0),
                ],
                egui::Stroke::new(1.0, egui::Color32::from_gray(90)),
            ));

            let position = race_state
                .runner_states
                .get(i)
                .map(|runner_state| runner_state.position)
                .unwrap_or(0.0);
            let x = lin_interp(position, 0.0, finish, x_start as f64, x_finish as f64) as f32;

            if self.session.selected_competitor() == Some(i) {
                shapes.push(egui::Shape::rect_filled(
                    egui::Rect::from_min_max(
                        egui::Pos2::new(rect.min.x, y_center - LANE_HEIGHT / 2.0),
                        egui::Pos2::new(rect.max.x, y_center + LANE_HEIGHT / 2.0),
                    ),
                    0.0,
                    egui::Color32::from_rgba_premultiplied(20, 20, 20, 20),
                ));
            }

            shapes.push(egui::Shape::circle_filled(
                egui::Pos2::new(x, y_center),
                18.0,
                color,
            ));
            shapes.push(egui::Shape::text(
                ui.fonts(),
                egui::Pos2::new(x, y_center),
                egui::Align2::CENTER_CENTER,
                &competitor.glyph,
                egui::TextStyle::Heading,
                egui::Color32::WHITE,
            ));
            shapes.push(egui::Shape::text(
                ui.fonts(),
                egui::Pos2::new(rect.min.x + 4.0, y_center - LANE_HEIGHT / 2.0 + 4.0),
                egui::Align2::LEFT_TOP,
                &competitor.name,
                egui::TextStyle::Small,
                egui::Color32::from_gray(160),
            ));
        }

        if race_state.no_steps > 0 {
            shapes.push(egui::Shape::text(
                ui.fonts(),
                egui::Pos2::new(rect.max.x - 8.0, rect.max.y - 8.0),
                egui::Align2::RIGHT_BOTTOM,
                format!("Step {}/{}", race_state.cur_step, race_state.no_steps),
                egui::TextStyle::Body,
                egui::Color32::WHITE,
            ));
        }

        painter.extend(shapes);
        response
    }
}

impl epi::App for RaceGame {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::CtxRef, _frame: &mut epi::Frame) {
        self.update_timers();

        egui::TopBottomPanel::top("status").show(ctx, |ui| {
            self.set_status_content(ui);
        });

        egui::SidePanel::left("controls").show(ctx, |ui| {
            self.set_controls_content(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let mut frame = egui::Frame::dark_canvas(ui.style());
            frame.fill = egui::Color32::from_rgb(20, 80, 20);
            frame.show(ui, |ui| {
                self.set_track_content(ui);
            });
        });

        // request repaint of the UI
        ctx.request_repaint();
    }

    fn name(&self) -> &str {
        "Race Bet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use racebet::core::competitor::create_roster;
    use racebet::core::race::RacePars;
    use rand::SeedableRng;

    fn game() -> RaceGame {
        let mut game_pars = GamePars::default();
        game_pars.race_pars = RacePars {
            duration_ms: 4,
            step_interval_ms: 1,
            ..RacePars::default()
        };
        game_pars.session_pars.result_delay_ms = 0;
        game_pars.session_pars.recovery_delay_ms = 0;
        let roster = create_roster(&game_pars.competitors).unwrap();
        RaceGame::new(&game_pars, roster, StdRng::seed_from_u64(17), 1.0)
    }

    fn wait_for_result(game: &mut RaceGame) {
        let t_start = Instant::now();
        while game.session.phase() == Phase::Racing {
            assert!(t_start.elapsed() < Duration::from_secs(5), "race did not finish");
            game.update_timers();
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn full_round_settles_once() {
        let mut game = game();
        game.select_competitor(1);
        game.place_wager(Stake::Amount(10));
        game.start_race();
        game.start_race();
        assert_eq!(game.session.balance(), 90);

        wait_for_result(&mut game);
        assert_eq!(game.session.phase(), Phase::Result);
        assert_eq!(game.session.history().len(), 1);
        assert!(game.outcome.is_some());

        game.play_again();
        assert_eq!(game.session.phase(), Phase::Selection);
        assert_eq!(
            game.cues.played,
            vec![
                Cue::Select,
                Cue::Wager,
                Cue::Race,
                if game.session.history()[0].won { Cue::Win } else { Cue::Lose },
                Cue::Reset,
            ]
        );
    }

    #[test]
    fn excessive_wager_shows_notice() {
        let mut game = game();
        game.place_wager(Stake::Amount(1000));
        assert!(game.notice.is_some());
        assert_eq!(game.session.current_wager(), 0);
        assert!(game.cues.played.is_empty());
    }

    #[test]
    fn all_in_loss_is_recovered() {
        let mut game = game();
        let mut rounds = 0;
        while game.session.history().iter().all(|r| r.won) {
            assert!(rounds < 50, "never lost an all-in race");
            rounds += 1;
            game.select_competitor(0);
            game.place_wager(Stake::AllIn);
            game.start_race();
            wait_for_result(&mut game);
            game.play_again();
        }
        game.update_timers();
        assert_eq!(game.session.balance(), 50);
        assert!(game.notice.is_some());
    }
}
