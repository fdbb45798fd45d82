use std::io::Write;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
}

/// * `freq_hz` - (Hz) Pitch of the tone
/// * `duration_s` - (s) Length of the tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub freq_hz: f64,
    pub duration_s: f64,
    pub waveform: Waveform,
}

impl Note {
    const fn sine(freq_hz: f64, duration_s: f64) -> Note {
        Note {
            freq_hz,
            duration_s,
            waveform: Waveform::Sine,
        }
    }

    const fn square(freq_hz: f64, duration_s: f64) -> Note {
        Note {
            freq_hz,
            duration_s,
            waveform: Waveform::Square,
        }
    }
}

const SELECT_NOTES: [Note; 1] = [Note::sine(440.0, 0.1)];
const WAGER_NOTES: [Note; 1] = [Note::sine(523.0, 0.1)];
const RESET_NOTES: [Note; 1] = [Note::sine(440.0, 0.15)];
const RACE_NOTES: [Note; 3] = [
    Note::square(600.0, 0.1),
    Note::square(700.0, 0.1),
    Note::square(800.0, 0.1),
];
// C E G C
const WIN_NOTES: [Note; 4] = [
    Note::sine(523.0, 0.3),
    Note::sine(659.0, 0.3),
    Note::sine(784.0, 0.3),
    Note::sine(1047.0, 0.3),
];
// C A G F
const LOSE_NOTES: [Note; 4] = [
    Note::sine(523.0, 0.2),
    Note::sine(440.0, 0.2),
    Note::sine(392.0, 0.2),
    Note::sine(349.0, 0.2),
];

/// Cue is one of the audio signals of the game. Each cue is a sequence of notes started at a
/// fixed spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Select,
    Wager,
    Race,
    Win,
    Lose,
    Reset,
}

impl Cue {
    pub fn notes(&self) -> &'static [Note] {
        match self {
            Cue::Select => &SELECT_NOTES,
            Cue::Wager => &WAGER_NOTES,
            Cue::Race => &RACE_NOTES,
            Cue::Win => &WIN_NOTES,
            Cue::Lose => &LOSE_NOTES,
            Cue::Reset => &RESET_NOTES,
        }
    }

    /// spacing returns the delay between the starts of two consecutive notes.
    pub fn spacing(&self) -> Duration {
        match self {
            Cue::Race => Duration::from_millis(300),
            _ => Duration::from_millis(150),
        }
    }

    /// get_schedule returns each note together with its start offset.
    pub fn get_schedule(&self) -> Vec<(Duration, Note)> {
        let spacing = self.spacing();
        self.notes()
            .iter()
            .enumerate()
            .map(|(i, &note)| (spacing * i as u32, note))
            .collect()
    }
}

/// CueSink plays cues with whatever tone generator the front-end has available.
pub trait CueSink {
    fn play(&mut self, cue: Cue);
}

/// SilentCues discards every cue.
#[derive(Debug, Default)]
pub struct SilentCues;

impl CueSink for SilentCues {
    fn play(&mut self, _cue: Cue) {}
}

/// TerminalCues logs every cue and optionally rings the terminal bell once per note.
#[derive(Debug, Default)]
pub struct TerminalCues {
    pub bell: bool,
}

impl CueSink for TerminalCues {
    fn play(&mut self, cue: Cue) {
        let notes: Vec<String> = cue
            .notes()
            .iter()
            .map(|n| format!("{:.0}Hz/{:.2}s", n.freq_hz, n.duration_s))
            .collect();
        debug!("cue {:?}: {}", cue, notes.join(" "));

        if self.bell {
            let mut stdout = std::io::stdout();
            let bells = "\x07".repeat(cue.notes().len());
            // bell output is best effort
            let _ = stdout.write_all(bells.as_bytes()).and_then(|_| stdout.flush());
        }
    }
}

/// RecordingCues keeps the played cues, the GUI uses it to flash the last cue.
#[derive(Debug, Default)]
pub struct RecordingCues {
    pub played: Vec<Cue>,
}

impl CueSink for RecordingCues {
    fn play(&mut self, cue: Cue) {
        self.played.push(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_cue_ascends() {
        let freqs: Vec<f64> = Cue::Win.notes().iter().map(|n| n.freq_hz).collect();
        assert_eq!(freqs, vec![523.0, 659.0, 784.0, 1047.0]);
    }

    #[test]
    fn lose_cue_descends() {
        let notes = Cue::Lose.notes();
        assert!(notes.windows(2).all(|w| w[0].freq_hz > w[1].freq_hz));
    }

    #[test]
    fn race_cue_is_square_and_spaced_wider() {
        let schedule = Cue::Race.get_schedule();
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[2].0, Duration::from_millis(600));
        assert!(schedule.iter().all(|(_, n)| n.waveform == Waveform::Square));
    }

    #[test]
    fn recording_sink_keeps_order() {
        let mut sink = RecordingCues::default();
        sink.play(Cue::Select);
        sink.play(Cue::Win);
        assert_eq!(sink.played, vec![Cue::Select, Cue::Win]);
    }
}
