use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "racebet",
    about = "A time-stepped animal race with double-or-nothing wagering"
)]
pub struct GameOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    /// Activate GUI - races are animated in a window instead of the terminal
    #[clap(short, long)]
    pub gui: bool,

    /// Ring the terminal bell for audio cues (terminal mode only)
    #[clap(long)]
    pub sound: bool,

    /// Save a chart of the balance after every race when the game ends (terminal mode only)
    #[clap(long)]
    pub plot: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of unattended simulation runs, prints win frequencies instead of playing
    #[clap(short, long, default_value = "0")]
    pub no_sim_runs: u32,

    /// Set path to the game parameter file (OPTIONAL: built-in defaults otherwise)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set real-time factor of the race animation
    #[clap(short, long, default_value = "1.0")]
    pub realtime_factor: f64,

    /// Set seed of the random number generator for reproducible races
    #[clap(short, long)]
    pub seed: Option<u64>,

    /// Write the race history to this CSV file when the game ends
    #[clap(short, long)]
    pub export_history: Option<PathBuf>,
}
