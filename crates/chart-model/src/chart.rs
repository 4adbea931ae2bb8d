use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use crate::note::Note;

/// An already-parsed chart: the ordered note list the runtime judges against.
///
/// File-format concerns live upstream; by the time a `Chart` exists its notes
/// are validated and sorted by ascending scheduled time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    lane_count: usize,
    notes: Vec<Note>,
}

impl Chart {
    /// Build a chart from a lane count and a note list.
    ///
    /// Fails on an empty lane layout, a note outside the lane range, or a
    /// hold whose end does not come strictly after its start. Notes are
    /// sorted by ascending scheduled time; the sort is stable so
    /// equal-time notes keep their declaration order.
    pub fn new(lane_count: usize, mut notes: Vec<Note>) -> Result<Self> {
        ensure!(lane_count > 0, "chart must have at least one lane");
        for note in &notes {
            ensure!(
                note.lane < lane_count,
                "note at {}us targets lane {} but the chart has {} lanes",
                note.time_us,
                note.lane,
                lane_count
            );
            if let Some(end_us) = note.end_time_us() {
                ensure!(
                    end_us > note.time_us,
                    "hold at {}us must end after it starts (end {}us)",
                    note.time_us,
                    end_us
                );
            }
        }
        notes.sort_by_key(|n| n.time_us);
        log::debug!(
            "chart created: {} lanes, {} notes",
            lane_count,
            notes.len()
        );
        Ok(Self { lane_count, notes })
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    /// Notes in ascending scheduled-time order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Total number of judgeable events (holds count twice).
    pub fn scheduled_event_count(&self) -> usize {
        self.notes.iter().map(Note::event_count).sum()
    }

    /// Time of the last scheduled event, 0 for an empty chart.
    pub fn duration_us(&self) -> i64 {
        self.notes.iter().map(Note::last_time_us).max().unwrap_or(0)
    }

    pub fn notes_in_lane(&self, lane: usize) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |n| n.lane == lane)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_lanes() {
        assert!(Chart::new(0, vec![]).is_err());
    }

    #[test]
    fn rejects_out_of_range_lane() {
        let notes = vec![Note::tap(4, 1_000_000)];
        assert!(Chart::new(4, notes).is_err());
    }

    #[test]
    fn rejects_inverted_hold() {
        let notes = vec![Note::hold(0, 2_000_000, 2_000_000)];
        assert!(Chart::new(4, notes).is_err());
    }

    #[test]
    fn sorts_notes_by_time() {
        let notes = vec![
            Note::tap(1, 3_000_000),
            Note::tap(0, 1_000_000),
            Note::tap(2, 2_000_000),
        ];
        let chart = Chart::new(4, notes).unwrap();
        let times: Vec<i64> = chart.notes().iter().map(|n| n.time_us).collect();
        assert_eq!(times, vec![1_000_000, 2_000_000, 3_000_000]);
    }

    #[test]
    fn event_count_counts_holds_twice() {
        let notes = vec![
            Note::tap(0, 1_000_000),
            Note::hold(1, 1_000_000, 2_000_000),
        ];
        let chart = Chart::new(2, notes).unwrap();
        assert_eq!(chart.scheduled_event_count(), 3);
    }

    #[test]
    fn duration_covers_hold_tail() {
        let notes = vec![
            Note::hold(0, 1_000_000, 4_000_000),
            Note::tap(1, 2_000_000),
        ];
        let chart = Chart::new(2, notes).unwrap();
        assert_eq!(chart.duration_us(), 4_000_000);
    }

    #[test]
    fn empty_chart_duration_is_zero() {
        let chart = Chart::new(4, vec![]).unwrap();
        assert!(chart.is_empty());
        assert_eq!(chart.duration_us(), 0);
        assert_eq!(chart.scheduled_event_count(), 0);
    }

    #[test]
    fn notes_in_lane_filters() {
        let notes = vec![
            Note::tap(0, 1_000_000),
            Note::tap(1, 2_000_000),
            Note::tap(0, 3_000_000),
        ];
        let chart = Chart::new(2, notes).unwrap();
        assert_eq!(chart.notes_in_lane(0).count(), 2);
        assert_eq!(chart.notes_in_lane(1).count(), 1);
    }

    #[test]
    fn serde_round_trip() {
        let chart = Chart::new(
            2,
            vec![Note::tap(0, 1_000_000), Note::hold(1, 2_000_000, 3_000_000)],
        )
        .unwrap();
        let json = serde_json::to_string(&chart).unwrap();
        let back: Chart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chart);
    }
}
