use crate::core::competitor::{default_roster, CompetitorPars};
use crate::core::race::RacePars;
use crate::core::session::SessionPars;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;
use thiserror::Error;

/// GamePars is used to store all other parameter structs.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GamePars {
    pub session_pars: SessionPars,
    pub race_pars: RacePars,
    pub competitors: Vec<CompetitorPars>,
}

impl Default for GamePars {
    fn default() -> Self {
        GamePars {
            session_pars: SessionPars::default(),
            race_pars: RacePars::default(),
            competitors: default_roster(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParError {
    #[error("at least one competitor is required")]
    NoCompetitors,

    #[error("invalid race parameters: {0}")]
    Race(helpers::general::InputValueError),

    #[error("invalid session parameters: {0}")]
    Session(helpers::general::InputValueError),
}

impl GamePars {
    pub fn validate(&self) -> Result<(), ParError> {
        if self.competitors.is_empty() {
            return Err(ParError::NoCompetitors);
        }
        self.race_pars.validate().map_err(ParError::Race)?;
        self.session_pars.validate().map_err(ParError::Session)?;
        Ok(())
    }
}

/// read_game_pars reads the JSON file and decodes the JSON string into the game parameters
/// struct. Missing fields fall back to their defaults.
pub fn read_game_pars(filepath: &Path) -> anyhow::Result<GamePars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.display()
        ))?;
    let pars: GamePars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.display()
    ))?;
    pars.validate().context(format!(
        "Invalid parameter file {}!",
        filepath.display()
    ))?;
    Ok(pars)
}
