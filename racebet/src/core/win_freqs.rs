use crate::core::race::{Race, RacePars};
use helpers::general::InputValueError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// simulate_win_frequencies runs `no_runs` independent races and counts the wins of every
/// competitor. Run `i` uses the seed `seed + i`, so the counts do not depend on the number of
/// threads.
pub fn simulate_win_frequencies(
    race_pars: &RacePars,
    no_competitors: usize,
    no_runs: u32,
    seed: u64,
) -> Result<Vec<u32>, InputValueError> {
    race_pars.validate()?;
    if no_competitors == 0 {
        return Err(InputValueError(String::from("a race needs at least one competitor")));
    }

    let winners: Result<Vec<usize>, InputValueError> = (0..no_runs)
        .into_par_iter()
        .map(|i| -> Result<usize, InputValueError> {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let mut race = Race::new(race_pars, no_competitors, &mut rng)?;
            Ok(race.simulate_to_end().winner)
        })
        .collect();

    let mut win_counts = vec![0; no_competitors];
    for winner in winners? {
        win_counts[winner] += 1;
    }
    Ok(win_counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_add_up_to_runs() {
        let counts = simulate_win_frequencies(&RacePars::default(), 6, 600, 11).unwrap();
        assert_eq!(counts.len(), 6);
        assert_eq!(counts.iter().sum::<u32>(), 600);
    }

    #[test]
    fn same_seed_same_counts() {
        let a = simulate_win_frequencies(&RacePars::default(), 4, 200, 5).unwrap();
        let b = simulate_win_frequencies(&RacePars::default(), 4, 200, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn identical_speeds_always_favour_first_competitor() {
        let race_pars = RacePars {
            speed_min: 0.75,
            speed_max: 0.75,
            ..RacePars::default()
        };
        let counts = simulate_win_frequencies(&race_pars, 3, 50, 0).unwrap();
        assert_eq!(counts, vec![50, 0, 0]);
    }

    #[test]
    fn no_competitors_is_an_error() {
        assert!(simulate_win_frequencies(&RacePars::default(), 0, 10, 0).is_err());
    }
}
