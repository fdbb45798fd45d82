use crate::core::competitor::Competitor;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// RaceRecord is the immutable snapshot written once per settled race.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RaceRecord {
    pub competitor: usize,
    pub wager: u64,
    pub winner: usize,
    pub won: bool,
    pub payout: u64,
    pub balance_after: u64,
    pub timestamp: DateTime<Local>,
}

/// leaderboard returns the most recent `size` records, newest first.
pub fn leaderboard(history: &[RaceRecord], size: usize) -> Vec<&RaceRecord> {
    history.iter().rev().take(size).collect()
}

fn get_label(roster: &[Competitor], idx: usize) -> (String, String) {
    roster
        .get(idx)
        .map(|c| (c.glyph.to_owned(), c.name.to_owned()))
        .unwrap_or_else(|| (String::from("?"), format!("#{}", idx)))
}

/// format_record renders one leaderboard entry.
pub fn format_record(record: &RaceRecord, roster: &[Competitor]) -> String {
    let (glyph, name) = get_label(roster, record.competitor);
    let (winner_glyph, _) = get_label(roster, record.winner);
    let result_mark = if record.won { "✅" } else { "❌" };
    let payout = if record.won {
        format!(" (+{} coins)", record.payout)
    } else {
        String::new()
    };

    format!(
        "{} - {} {} ({} coins) | {} Winner: {}{}",
        record.timestamp.format("%H:%M:%S"),
        glyph,
        name,
        record.wager,
        result_mark,
        winner_glyph,
        payout
    )
}

/// format_leaderboard renders the given leaderboard entries line by line.
pub fn format_leaderboard(records: &[&RaceRecord], roster: &[Competitor]) -> Vec<String> {
    if records.is_empty() {
        return vec![String::from("No races yet! Start your first race! 🚀")];
    }
    records.iter().map(|r| format_record(r, roster)).collect()
}

/// write_history_csv writes all records to a CSV file, one row per race.
pub fn write_history_csv(history: &[RaceRecord], path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in history {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::competitor::{create_roster, default_roster};

    fn record(competitor: usize, winner: usize, wager: u64) -> RaceRecord {
        let won = competitor == winner;
        RaceRecord {
            competitor,
            wager,
            winner,
            won,
            payout: if won { 2 * wager } else { 0 },
            balance_after: 100,
            timestamp: Local::now(),
        }
    }

    #[test]
    fn leaderboard_is_newest_first_and_truncated() {
        let history: Vec<RaceRecord> = (0..15).map(|i| record(0, 1, i)).collect();
        let board = leaderboard(&history, 10);
        assert_eq!(board.len(), 10);
        assert_eq!(board[0].wager, 14);
        assert_eq!(board[9].wager, 5);
    }

    #[test]
    fn short_history_is_shown_completely() {
        let history: Vec<RaceRecord> = (0..3).map(|i| record(0, 1, i)).collect();
        let board = leaderboard(&history, 10);
        assert_eq!(board.iter().map(|r| r.wager).collect::<Vec<_>>(), vec![2, 1, 0]);
    }

    #[test]
    fn win_line_shows_payout() {
        let roster = create_roster(&default_roster()).unwrap();
        let line = format_record(&record(2, 2, 25), &roster);
        assert!(line.contains("🐸 Pepe (25 coins)"));
        assert!(line.contains("✅ Winner: 🐸 (+50 coins)"));
    }

    #[test]
    fn loss_line_has_no_payout() {
        let roster = create_roster(&default_roster()).unwrap();
        let line = format_record(&record(0, 4, 10), &roster);
        assert!(line.contains("❌ Winner: 🐉"));
        assert!(!line.contains("+"));
    }

    #[test]
    fn empty_leaderboard_has_placeholder() {
        let lines = format_leaderboard(&[], &[]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("No races yet"));
    }
}
