use crate::core::competitor::Competitor;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// RaceResult contains all race information that is required for settlement and printing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RaceResult {
    pub no_steps_run: u32,
    pub speeds: Vec<f64>,
    pub final_positions: Vec<f64>,
    pub winner: usize,
}

impl RaceResult {
    /// get_standings returns the competitor indices ordered by final position, leader first.
    /// Equal positions keep index order.
    pub fn get_standings(&self) -> Vec<usize> {
        let mut idxs: Vec<usize> = (0..self.final_positions.len()).collect();
        idxs.sort_by(|&a, &b| {
            self.final_positions[b]
                .partial_cmp(&self.final_positions[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        idxs
    }

    /// format_standings returns one line per competitor with final position and drawn speed.
    pub fn format_standings(&self, roster: &[Competitor]) -> Result<String, std::fmt::Error> {
        let mut tmp_string = String::new();

        for (place, idx) in self.get_standings().into_iter().enumerate() {
            let label = roster
                .get(idx)
                .map(|c| c.label())
                .unwrap_or_else(|| format!("#{}", idx));
            writeln!(
                &mut tmp_string,
                "{:2}. {:<12} {:6.2} (speed {:.3})",
                place + 1,
                label,
                self.final_positions[idx],
                self.speeds[idx]
            )?;
        }

        Ok(tmp_string)
    }

    /// print_standings prints the final standings to the console output.
    pub fn print_standings(&self, roster: &[Competitor]) {
        match self.format_standings(roster) {
            Ok(standings) => {
                println!("RESULT: Finished after {} steps", self.no_steps_run);
                print!("{}", standings);
            }
            Err(err) => tracing::warn!("could not format standings: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::competitor::{create_roster, default_roster};

    fn result() -> RaceResult {
        RaceResult {
            no_steps_run: 60,
            speeds: vec![0.5, 0.9, 0.7, 0.9],
            final_positions: vec![50.0, 90.0, 70.0, 90.0],
            winner: 1,
        }
    }

    #[test]
    fn standings_are_ordered_by_position() {
        assert_eq!(result().get_standings(), vec![1, 3, 2, 0]);
    }

    #[test]
    fn standings_text_has_leader_first() {
        let roster = create_roster(&default_roster()).unwrap();
        let text = result().format_standings(&roster).unwrap();
        let first_line = text.lines().next().unwrap();
        assert!(first_line.starts_with(" 1."));
        assert!(first_line.contains("Unicorn"));
        assert_eq!(text.lines().count(), 4);
    }
}
