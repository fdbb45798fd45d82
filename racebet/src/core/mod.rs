pub mod competitor;
pub mod handle_race;
pub mod race;
pub mod session;
pub mod win_freqs;
