use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ease::{Easing, ease};

/// One timed motion span: a value interval mapped onto a time interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSegment {
    pub start_value: f64,
    pub end_value: f64,
    pub start_us: i64,
    pub end_us: i64,
    pub easing: Easing,
}

impl MotionSegment {
    pub fn new(start_value: f64, end_value: f64, start_us: i64, end_us: i64) -> Self {
        Self {
            start_value,
            end_value,
            start_us,
            end_us,
            easing: Easing::Linear,
        }
    }

    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Normalized time fraction, clamped to [0, 1].
    ///
    /// A degenerate segment (zero or negative duration) is always complete.
    pub fn fraction_at(&self, now_us: i64) -> f64 {
        let duration = self.end_us - self.start_us;
        if duration <= 0 {
            return 1.0;
        }
        ((now_us - self.start_us) as f64 / duration as f64).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, now_us: i64) -> f64 {
        ease(
            self.start_value,
            self.end_value,
            self.fraction_at(now_us),
            self.easing,
        )
    }

    pub fn is_expired(&self, now_us: i64) -> bool {
        now_us >= self.end_us
    }
}

/// Result of advancing a [`MotionQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionProgress {
    /// A segment is still driving the value.
    Active,
    /// The queue just ran out of segments; reported exactly once so the
    /// owner can transition its lifecycle state.
    Exhausted,
    /// Empty and exhaustion already reported.
    Idle,
}

/// FIFO queue of motion segments, consumed one at a time and never replayed.
///
/// While a segment is in front its value drives the owner; once the clock
/// passes its end the segment is popped and the next takes over. An empty
/// queue holds the final value of the last consumed segment.
#[derive(Debug, Clone)]
pub struct MotionQueue {
    segments: VecDeque<MotionSegment>,
    last_value: f64,
    exhaustion_reported: bool,
}

impl MotionQueue {
    pub fn new(initial_value: f64) -> Self {
        Self {
            segments: VecDeque::new(),
            last_value: initial_value,
            exhaustion_reported: false,
        }
    }

    pub fn push(&mut self, segment: MotionSegment) {
        self.exhaustion_reported = false;
        self.segments.push_back(segment);
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Front segment without consuming it.
    pub fn front(&self) -> Option<&MotionSegment> {
        self.segments.front()
    }

    /// Current value: the front segment evaluated at `now`, or the held
    /// final value when no segment remains.
    pub fn value_at(&self, now_us: i64) -> f64 {
        match self.segments.front() {
            Some(segment) => segment.value_at(now_us),
            None => self.last_value,
        }
    }

    /// Pop expired segments and report progress.
    ///
    /// Returns [`MotionProgress::Exhausted`] exactly once, on the call that
    /// leaves the queue empty.
    pub fn advance(&mut self, now_us: i64) -> MotionProgress {
        while let Some(front) = self.segments.front() {
            if !front.is_expired(now_us) {
                return MotionProgress::Active;
            }
            self.last_value = front.end_value;
            self.segments.pop_front();
        }
        if self.exhaustion_reported {
            MotionProgress::Idle
        } else {
            self.exhaustion_reported = true;
            MotionProgress::Exhausted
        }
    }
}
