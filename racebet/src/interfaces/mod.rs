pub mod cues;
pub mod gui_interface;
