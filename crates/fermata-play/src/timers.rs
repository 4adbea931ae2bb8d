// Per-lane feedback timers: key-on, key-off, and judge-effect start times.
// Timer values are Option<i64> (microseconds, scaled clock); None means the
// timer has not fired yet.

/// Feedback timer bank for all lanes.
///
/// Key-on and key-off are mutually exclusive per lane: setting one resets
/// the other, so a skin can always tell which edge happened last.
#[derive(Debug, Clone)]
pub struct TimerSet {
    keyon: Vec<Option<i64>>,
    keyoff: Vec<Option<i64>>,
    judge: Vec<Option<i64>>,
}

impl TimerSet {
    pub fn new(lane_count: usize) -> Self {
        Self {
            keyon: vec![None; lane_count],
            keyoff: vec![None; lane_count],
            judge: vec![None; lane_count],
        }
    }

    pub fn set_keyon(&mut self, lane: usize, time_us: i64) {
        if let Some(slot) = self.keyon.get_mut(lane) {
            *slot = Some(time_us);
        }
        if let Some(slot) = self.keyoff.get_mut(lane) {
            *slot = None;
        }
    }

    pub fn set_keyoff(&mut self, lane: usize, time_us: i64) {
        if let Some(slot) = self.keyoff.get_mut(lane) {
            *slot = Some(time_us);
        }
        if let Some(slot) = self.keyon.get_mut(lane) {
            *slot = None;
        }
    }

    pub fn set_judge(&mut self, lane: usize, time_us: i64) {
        if let Some(slot) = self.judge.get_mut(lane) {
            *slot = Some(time_us);
        }
    }

    pub fn keyon(&self, lane: usize) -> Option<i64> {
        self.keyon.get(lane).copied().flatten()
    }

    pub fn keyoff(&self, lane: usize) -> Option<i64> {
        self.keyoff.get(lane).copied().flatten()
    }

    pub fn judge(&self, lane: usize) -> Option<i64> {
        self.judge.get(lane).copied().flatten()
    }

    /// Elapsed time since the lane's judge effect started, if any.
    pub fn judge_elapsed(&self, lane: usize, now_us: i64) -> Option<i64> {
        self.judge(lane).map(|start| now_us - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_timers_read_none() {
        let timers = TimerSet::new(4);
        assert_eq!(timers.keyon(0), None);
        assert_eq!(timers.keyoff(3), None);
        assert_eq!(timers.judge(1), None);
    }

    #[test]
    fn keyon_resets_keyoff() {
        let mut timers = TimerSet::new(4);
        timers.set_keyoff(2, 1_000_000);
        timers.set_keyon(2, 2_000_000);
        assert_eq!(timers.keyon(2), Some(2_000_000));
        assert_eq!(timers.keyoff(2), None);
    }

    #[test]
    fn keyoff_resets_keyon() {
        let mut timers = TimerSet::new(4);
        timers.set_keyon(1, 1_000_000);
        timers.set_keyoff(1, 2_000_000);
        assert_eq!(timers.keyoff(1), Some(2_000_000));
        assert_eq!(timers.keyon(1), None);
    }

    #[test]
    fn judge_elapsed_measures_from_start() {
        let mut timers = TimerSet::new(4);
        timers.set_judge(0, 500_000);
        assert_eq!(timers.judge_elapsed(0, 1_500_000), Some(1_000_000));
        assert_eq!(timers.judge_elapsed(1, 1_500_000), None);
    }

    #[test]
    fn out_of_range_lane_is_ignored() {
        let mut timers = TimerSet::new(2);
        timers.set_keyon(9, 1_000_000);
        assert_eq!(timers.keyon(9), None);
    }
}
