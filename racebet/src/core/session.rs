use crate::core::race::{Race, RacePars};
use crate::post::race_record::{leaderboard, RaceRecord};
use chrono::Local;
use helpers::general::InputValueError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Largest starting balance, an all-in win on it still fits into the balance.
pub const MAX_STARTING_BALANCE: u64 = u64::MAX / 2;

/// * `starting_balance` - Coins at program start
/// * `stakes` - Stakes offered besides going all-in
/// * `recovery_grant` - Coins granted when the balance hits zero
/// * `recovery_delay_ms` - (ms) Delay before the recovery grant is paid out
/// * `result_delay_ms` - (ms) Pause between the end of the race and the settlement
/// * `leaderboard_size` - Number of races shown in the leaderboard
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionPars {
    pub starting_balance: u64,
    pub stakes: Vec<u64>,
    pub recovery_grant: u64,
    pub recovery_delay_ms: u64,
    pub result_delay_ms: u64,
    pub leaderboard_size: usize,
}

impl Default for SessionPars {
    fn default() -> Self {
        SessionPars {
            starting_balance: 100,
            stakes: vec![10, 25, 50],
            recovery_grant: 50,
            recovery_delay_ms: 2000,
            result_delay_ms: 500,
            leaderboard_size: 10,
        }
    }
}

impl SessionPars {
    pub fn validate(&self) -> Result<(), InputValueError> {
        if self.starting_balance > MAX_STARTING_BALANCE {
            return Err(InputValueError(format!(
                "starting_balance must not exceed {}",
                MAX_STARTING_BALANCE
            )));
        }
        if self.recovery_grant == 0 {
            return Err(InputValueError(String::from("recovery_grant must be positive")));
        }
        if self.stakes.iter().any(|&stake| stake == 0) {
            return Err(InputValueError(String::from("stakes must be positive")));
        }
        Ok(())
    }
}

/// Stake is a wager request as it comes from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stake {
    Amount(u64),
    AllIn,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WagerError {
    #[error("wager of {requested} coins exceeds the balance of {balance} coins")]
    ExceedsBalance { requested: u64, balance: u64 },
    #[error("a win on a wager of {requested} coins would overflow the balance of {balance} coins")]
    PayoutOverflow { requested: u64, balance: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Selection,
    Racing,
    Result,
}

/// WagerSession owns the mutable game state and gates all user actions against it.
#[derive(Debug, Clone)]
pub struct WagerSession {
    balance: u64,
    total_winnings: u64,
    selected_competitor: Option<usize>,
    current_wager: u64,
    phase: Phase,
    recovery_pending: bool,
    history: Vec<RaceRecord>,
    no_competitors: usize,
    session_pars: SessionPars,
}

impl WagerSession {
    pub fn new(session_pars: &SessionPars, no_competitors: usize) -> WagerSession {
        WagerSession {
            balance: session_pars.starting_balance,
            total_winnings: 0,
            selected_competitor: None,
            current_wager: 0,
            phase: Phase::Selection,
            recovery_pending: false,
            history: Vec::new(),
            no_competitors,
            session_pars: session_pars.to_owned(),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // ACTIONS -------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// select_competitor records the selection. Ignored while a race is in progress or if the
    /// index does not belong to a competitor.
    pub fn select_competitor(&mut self, idx: usize) -> bool {
        if self.in_progress() || idx >= self.no_competitors {
            return false;
        }
        self.selected_competitor = Some(idx);
        true
    }

    /// place_wager sets the current wager. Ignored (`Ok(false)`) while a race is in progress.
    pub fn place_wager(&mut self, stake: Stake) -> Result<bool, WagerError> {
        if self.in_progress() {
            return Ok(false);
        }

        let requested = match stake {
            Stake::Amount(amount) => amount,
            Stake::AllIn => self.balance,
        };

        if requested > self.balance {
            return Err(WagerError::ExceedsBalance {
                requested,
                balance: self.balance,
            });
        }

        // balance after the debit plus the doubled wager must stay representable
        if requested
            .checked_mul(2)
            .and_then(|payout| (self.balance - requested).checked_add(payout))
            .is_none()
        {
            return Err(WagerError::PayoutOverflow {
                requested,
                balance: self.balance,
            });
        }

        self.current_wager = requested;
        Ok(true)
    }

    pub fn can_start_race(&self) -> bool {
        !self.in_progress()
            && self.selected_competitor.is_some()
            && self.current_wager > 0
            && self.current_wager <= self.balance
    }

    /// start_race commits the wager and creates the race. The session is marked as racing before
    /// the wager is debited and before the race exists, so a repeated call cannot start a second
    /// race.
    pub fn start_race<R: Rng + ?Sized>(
        &mut self,
        race_pars: &RacePars,
        rng: &mut R,
    ) -> Option<Race> {
        if !self.can_start_race() {
            return None;
        }

        self.phase = Phase::Racing;
        self.balance -= self.current_wager;

        match Race::new(race_pars, self.no_competitors, rng) {
            Ok(race) => {
                info!(
                    "race started: competitor {:?}, wager {}, balance {}",
                    self.selected_competitor, self.current_wager, self.balance
                );
                Some(race)
            }
            Err(err) => {
                // undo the commit, nothing was raced
                warn!("could not create race: {}", err);
                self.balance += self.current_wager;
                self.phase = Phase::Selection;
                None
            }
        }
    }

    /// settle applies the outcome of the running race. Only the first call per race is accepted.
    pub fn settle(&mut self, winner: usize) -> Option<&RaceRecord> {
        if self.phase != Phase::Racing {
            return None;
        }
        let competitor = self.selected_competitor?;

        let won = winner == competitor;
        // place_wager guarantees that neither the payout nor the new balance overflows
        let payout = if won {
            self.current_wager.saturating_mul(2)
        } else {
            0
        };

        self.balance = self.balance.saturating_add(payout);
        self.total_winnings = self.total_winnings.saturating_add(payout);
        self.recovery_pending = self.balance == 0;

        self.history.push(RaceRecord {
            competitor,
            wager: self.current_wager,
            winner,
            won,
            payout,
            balance_after: self.balance,
            timestamp: Local::now(),
        });
        self.phase = Phase::Result;

        info!(
            "race settled: winner {}, won {}, payout {}, balance {}",
            winner, won, payout, self.balance
        );
        self.history.last()
    }

    pub fn recovery_pending(&self) -> bool {
        self.recovery_pending
    }

    /// grant_recovery pays out the recovery grant if the balance is still empty.
    pub fn grant_recovery(&mut self) -> bool {
        if !self.recovery_pending {
            return false;
        }
        self.recovery_pending = false;
        if self.balance != 0 {
            return false;
        }
        self.balance = self.session_pars.recovery_grant;
        info!("balance empty, granted {} coins", self.balance);
        true
    }

    /// reset returns to the selection phase. Balance, winnings and history are kept.
    pub fn reset(&mut self) {
        self.selected_competitor = None;
        self.current_wager = 0;
        self.phase = Phase::Selection;
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn in_progress(&self) -> bool {
        self.phase != Phase::Selection
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn total_winnings(&self) -> u64 {
        self.total_winnings
    }

    pub fn current_wager(&self) -> u64 {
        self.current_wager
    }

    pub fn selected_competitor(&self) -> Option<usize> {
        self.selected_competitor
    }

    pub fn history(&self) -> &[RaceRecord] {
        &self.history
    }

    pub fn stakes(&self) -> &[u64] {
        &self.session_pars.stakes
    }

    pub fn leaderboard(&self) -> Vec<&RaceRecord> {
        leaderboard(&self.history, self.session_pars.leaderboard_size)
    }
}
