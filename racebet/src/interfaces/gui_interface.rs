use crate::post::race_result::RaceResult;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerState {
    pub idx: usize,
    pub position: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceState {
    pub runner_states: Vec<RunnerState>,
    pub cur_step: u32,
    pub no_steps: u32,
    pub finish: f64,

    // final results payload (sent once when the race finishes)
    pub final_result: Option<RaceResult>,
}
