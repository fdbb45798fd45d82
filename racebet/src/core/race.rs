use crate::post::race_result::RaceResult;
use helpers::general::{argmax, InputValueError};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// * `duration_ms` - (ms) Nominal race duration, together with the step interval it defines the
///   step budget
/// * `step_interval_ms` - (ms) Time between two simulation steps in real-time mode
/// * `speed_min` - Lower bound of the speed draw (closed range)
/// * `speed_max` - Upper bound of the speed draw (closed range)
/// * `finish` - Position of the finish line, positions are clamped to it
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RacePars {
    pub duration_ms: u64,
    pub step_interval_ms: u64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub finish: f64,
}

impl Default for RacePars {
    fn default() -> Self {
        RacePars {
            duration_ms: 3000,
            step_interval_ms: 50,
            speed_min: 0.5,
            speed_max: 1.0,
            finish: 100.0,
        }
    }
}

impl RacePars {
    /// no_steps returns the step budget of a race. A degenerate budget still yields one step.
    pub fn no_steps(&self) -> u32 {
        if self.step_interval_ms == 0 {
            return 1;
        }
        // oversized budgets are rejected by validate, saturate here
        u32::try_from(self.duration_ms / self.step_interval_ms)
            .unwrap_or(u32::MAX)
            .max(1)
    }

    pub fn validate(&self) -> Result<(), InputValueError> {
        if self.step_interval_ms == 0 {
            return Err(InputValueError(String::from("step_interval_ms must be positive")));
        }
        if self.duration_ms == 0 {
            return Err(InputValueError(String::from("duration_ms must be positive")));
        }
        if u32::try_from(self.duration_ms / self.step_interval_ms).is_err() {
            return Err(InputValueError(format!(
                "duration_ms {} yields more than {} steps",
                self.duration_ms,
                u32::MAX
            )));
        }
        if !(self.speed_min.is_finite() && self.speed_max.is_finite()) {
            return Err(InputValueError(String::from("speed range must be finite")));
        }
        if self.speed_min < 0.0 || self.speed_min > self.speed_max {
            return Err(InputValueError(format!(
                "speed range [{}, {}] must satisfy 0 <= min <= max",
                self.speed_min, self.speed_max
            )));
        }
        if !(self.finish.is_finite() && self.finish > 0.0) {
            return Err(InputValueError(format!("finish {} must be positive", self.finish)));
        }
        Ok(())
    }
}

/// draw_speeds draws one speed per competitor, independently and uniformly from the closed
/// range of the race parameters.
pub fn draw_speeds<R: Rng + ?Sized>(race_pars: &RacePars, no_competitors: usize, rng: &mut R) -> Vec<f64> {
    let dist = Uniform::new_inclusive(race_pars.speed_min, race_pars.speed_max);
    (0..no_competitors).map(|_| dist.sample(rng)).collect()
}

/// advance_positions moves every runner forward by its speed times the per-step advance and
/// clamps at the finish.
pub fn advance_positions(positions: &mut [f64], speeds: &[f64], step_advance: f64, finish: f64) {
    for (position, &speed) in positions.iter_mut().zip(speeds.iter()) {
        *position += speed * step_advance;
        if *position > finish {
            *position = finish;
        }
    }
}

/// get_winner returns the index of the leading runner, the lowest index wins ties.
pub fn get_winner(positions: &[f64]) -> Result<usize, InputValueError> {
    argmax(positions)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Race {
    pub finish: f64,
    pub no_steps: u32,
    pub cur_step: u32,
    pub step_interval_ms: u64,
    step_advance: f64,
    speeds: Vec<f64>,
    positions: Vec<f64>,
}

impl Race {
    /// new creates a race and draws the speeds of all competitors from the inserted generator.
    pub fn new<R: Rng + ?Sized>(
        race_pars: &RacePars,
        no_competitors: usize,
        rng: &mut R,
    ) -> Result<Race, InputValueError> {
        race_pars.validate()?;
        let speeds = draw_speeds(race_pars, no_competitors, rng);
        Race::with_speeds(race_pars, speeds)
    }

    /// with_speeds creates a race with predetermined speeds.
    pub fn with_speeds(race_pars: &RacePars, speeds: Vec<f64>) -> Result<Race, InputValueError> {
        race_pars.validate()?;
        if speeds.is_empty() {
            return Err(InputValueError(String::from("a race needs at least one competitor")));
        }
        if speeds.iter().any(|&speed| !speed.is_finite() || speed < 0.0) {
            return Err(InputValueError(String::from("speeds must be finite and non-negative")));
        }

        let no_steps = race_pars.no_steps();

        Ok(Race {
            finish: race_pars.finish,
            no_steps,
            cur_step: 0,
            step_interval_ms: race_pars.step_interval_ms,
            step_advance: race_pars.finish / no_steps as f64,
            positions: vec![0.0; speeds.len()],
            speeds,
        })
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// The method simulates one time step. Calling it on a finished race does nothing.
    pub fn simulate_timestep(&mut self) {
        if self.get_finished() {
            return;
        }
        self.cur_step += 1;
        advance_positions(&mut self.positions, &self.speeds, self.step_advance, self.finish);
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// A race is finished once at least one step was simulated and either the step budget is
    /// exhausted or some runner reached the finish.
    pub fn get_finished(&self) -> bool {
        self.cur_step > 0
            && (self.cur_step >= self.no_steps || self.positions.iter().any(|&p| p >= self.finish))
    }

    pub fn get_positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn get_speeds(&self) -> &[f64] {
        &self.speeds
    }

    pub fn get_winner(&self) -> usize {
        // positions is never empty, see with_speeds
        get_winner(&self.positions).unwrap_or(0)
    }

    /// simulate_to_end runs the remaining steps without any pacing.
    pub fn simulate_to_end(&mut self) -> RaceResult {
        while !self.get_finished() {
            self.simulate_timestep();
        }
        self.get_race_result()
    }

    pub fn get_race_result(&self) -> RaceResult {
        RaceResult {
            no_steps_run: self.cur_step,
            speeds: self.speeds.to_owned(),
            final_positions: self.positions.to_owned(),
            winner: self.get_winner(),
        }
    }
}
