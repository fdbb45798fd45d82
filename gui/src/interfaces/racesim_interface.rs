use flume::{Receiver, TryRecvError};
use racebet::interfaces::gui_interface::RaceState;

/// RacesimInterface holds the receiving end of the channel of the currently running race and the
/// latest race state received from it.
#[derive(Debug, Default)]
pub struct RacesimInterface {
    pub rx: Option<Receiver<RaceState>>,
    pub race_state: RaceState,
    pub disconnected: bool,
}

impl RacesimInterface {
    /// connect replaces the channel by the one of a newly started race.
    pub fn connect(&mut self, rx: Receiver<RaceState>) {
        self.rx = Some(rx);
        self.race_state = RaceState::default();
        self.disconnected = false;
    }

    /// update drains all pending race states and keeps the latest one.
    pub fn update(&mut self) {
        let rx = match &self.rx {
            Some(rx) => rx,
            None => return,
        };

        loop {
            match rx.try_recv() {
                Ok(race_state) => self.race_state = race_state,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.rx = None;
        self.race_state = RaceState::default();
        self.disconnected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use racebet::post::race_result::RaceResult;

    #[test]
    fn keeps_latest_state() {
        let (tx, rx) = flume::unbounded();
        let mut interface = RacesimInterface::default();
        interface.connect(rx);

        for cur_step in 1..=3 {
            tx.send(RaceState {
                cur_step,
                ..RaceState::default()
            })
            .unwrap();
        }
        interface.update();
        assert_eq!(interface.race_state.cur_step, 3);
        assert!(!interface.disconnected);
    }

    #[test]
    fn notices_finished_sender() {
        let (tx, rx) = flume::unbounded();
        let mut interface = RacesimInterface::default();
        interface.connect(rx);

        tx.send(RaceState {
            final_result: Some(RaceResult {
                no_steps_run: 1,
                speeds: vec![1.0],
                final_positions: vec![100.0],
                winner: 0,
            }),
            ..RaceState::default()
        })
        .unwrap();
        drop(tx);

        interface.update();
        assert!(interface.race_state.final_result.is_some());
        assert!(interface.disconnected);
    }
}
