use serde::{Deserialize, Serialize};

/// The kind of a chart note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteKind {
    /// Single tap, judged by one press.
    Tap,
    /// Hold span: judged by a press at the start and a release at the end.
    Hold {
        /// End time in microseconds.
        end_time_us: i64,
    },
}

/// A single note in the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Lane index (0-indexed)
    pub lane: usize,
    /// Scheduled judgment time in microseconds
    pub time_us: i64,
    /// Note kind
    pub kind: NoteKind,
}

impl Note {
    pub fn tap(lane: usize, time_us: i64) -> Self {
        Self {
            lane,
            time_us,
            kind: NoteKind::Tap,
        }
    }

    pub fn hold(lane: usize, time_us: i64, end_time_us: i64) -> Self {
        Self {
            lane,
            time_us,
            kind: NoteKind::Hold { end_time_us },
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self.kind, NoteKind::Hold { .. })
    }

    /// End time for holds, None for taps.
    pub fn end_time_us(&self) -> Option<i64> {
        match self.kind {
            NoteKind::Tap => None,
            NoteKind::Hold { end_time_us } => Some(end_time_us),
        }
    }

    /// Number of judgeable events this note schedules.
    ///
    /// Taps are judged by one press; holds by a press at the start and a
    /// release at the end.
    pub fn event_count(&self) -> usize {
        match self.kind {
            NoteKind::Tap => 1,
            NoteKind::Hold { .. } => 2,
        }
    }

    /// The latest time this note occupies the chart.
    pub fn last_time_us(&self) -> i64 {
        self.end_time_us().unwrap_or(self.time_us)
    }
}
