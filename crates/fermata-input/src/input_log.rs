use serde::{Deserialize, Serialize};

/// One accepted input edge, as recorded for replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    pub time_us: i64,
    pub lane: usize,
    pub pressed: bool,
}

/// Append-only log of every accepted edge during a play session.
///
/// Live input and auto-play both feed it, so a recorded session can be
/// replayed through the same provider surface later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputLog {
    records: Vec<InputRecord>,
}

impl InputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time_us: i64, lane: usize, pressed: bool) {
        self.records.push(InputRecord {
            time_us,
            lane,
            pressed,
        });
    }

    pub fn records(&self) -> &[InputRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
