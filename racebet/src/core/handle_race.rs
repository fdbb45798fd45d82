use crate::core::race::Race;
use crate::interfaces::gui_interface::{RaceState, RunnerState};
use crate::post::race_result::RaceResult;
use anyhow::Context;
use flume::Sender;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// get_race_state takes a snapshot of the current runner positions for rendering.
pub fn get_race_state(race: &Race) -> RaceState {
    RaceState {
        runner_states: race
            .get_positions()
            .iter()
            .zip(race.get_speeds().iter())
            .enumerate()
            .map(|(idx, (&position, &speed))| RunnerState {
                idx,
                position,
                speed,
            })
            .collect(),
        cur_step: race.cur_step,
        no_steps: race.no_steps,
        finish: race.finish,
        final_result: None,
    }
}

/// handle_race runs the inserted race until it is finished and returns the result for settlement.
/// If a sender is inserted, the race is paced in real time and every step is forwarded to the
/// renderer, followed by one final state carrying the result.
pub fn handle_race(
    race: &mut Race,
    tx: Option<&Sender<RaceState>>,
    realtime_factor: f64,
) -> anyhow::Result<RaceResult> {
    let tx = match tx {
        Some(tx) => tx,
        None => {
            let race_result = race.simulate_to_end();
            debug!(
                "race finished after {} steps, winner {}",
                race_result.no_steps_run, race_result.winner
            );
            return Ok(race_result);
        }
    };

    if !(realtime_factor.is_finite() && realtime_factor > 0.0) {
        anyhow::bail!("Real-time factor must be positive, got {}!", realtime_factor);
    }
    let t_step = Duration::from_secs_f64(race.step_interval_ms as f64 / 1000.0 / realtime_factor);

    while !race.get_finished() {
        let t_start = Instant::now();
        race.simulate_timestep();

        tx.send(get_race_state(race))
            .context("Failed to send race state to the renderer!")?;

        // sleep until the step is finished in real time as well
        match t_step.checked_sub(t_start.elapsed()) {
            Some(t_sleep) => sleep(t_sleep),
            None => warn!("could not keep up with real time in step {}", race.cur_step),
        }
    }

    let race_result = race.get_race_result();
    let final_msg = RaceState {
        final_result: Some(race_result.clone()),
        ..get_race_state(race)
    };
    tx.send(final_msg)
        .context("Failed to send final race result to the renderer!")?;

    debug!(
        "race finished after {} steps, winner {}",
        race_result.no_steps_run, race_result.winner
    );
    Ok(race_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::race::RacePars;

    fn fast_pars() -> RacePars {
        RacePars {
            duration_ms: 5,
            step_interval_ms: 1,
            ..RacePars::default()
        }
    }

    #[test]
    fn headless_race_runs_to_completion() {
        let mut race = Race::with_speeds(&RacePars::default(), vec![0.5, 0.8, 0.6]).unwrap();
        let result = handle_race(&mut race, None, 1.0).unwrap();
        assert!(race.get_finished());
        assert_eq!(result.winner, 1);
    }

    #[test]
    fn realtime_race_forwards_every_step_and_the_result() {
        let (tx, rx) = flume::unbounded();
        let mut race = Race::with_speeds(&fast_pars(), vec![0.5, 0.8]).unwrap();
        let result = handle_race(&mut race, Some(&tx), 100.0).unwrap();

        let states: Vec<RaceState> = rx.try_iter().collect();
        assert_eq!(states.len(), 6);
        assert_eq!(states[0].cur_step, 1);
        assert!(states[..5].iter().all(|s| s.final_result.is_none()));
        assert_eq!(states[5].final_result.as_ref(), Some(&result));
        assert_eq!(states[5].runner_states.len(), 2);
    }

    #[test]
    fn dropped_receiver_is_an_error() {
        let (tx, rx) = flume::unbounded();
        drop(rx);
        let mut race = Race::with_speeds(&fast_pars(), vec![0.5]).unwrap();
        assert!(handle_race(&mut race, Some(&tx), 100.0).is_err());
    }

    #[test]
    fn non_positive_realtime_factor_is_an_error() {
        let (tx, _rx) = flume::unbounded();
        let mut race = Race::with_speeds(&fast_pars(), vec![0.5]).unwrap();
        assert!(handle_race(&mut race, Some(&tx), 0.0).is_err());
    }
}
