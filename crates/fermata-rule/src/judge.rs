use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Judgment tier for a single press/release, ordered by timing accuracy.
///
/// `NotEntered` is a classifier sentinel for "outside the window in either
/// direction"; it is never scored. Callers disambiguate early from late via
/// [`JudgeProperty::phase`], not from the delta sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JudgeTier {
    CriticalPerfect,
    Perfect,
    Great,
    Miss,
    NotEntered,
}

impl JudgeTier {
    /// Score contribution of this tier.
    pub fn score(self) -> f64 {
        match self {
            JudgeTier::CriticalPerfect => 1.1,
            JudgeTier::Perfect => 1.0,
            JudgeTier::Great => 0.5,
            JudgeTier::Miss | JudgeTier::NotEntered => 0.0,
        }
    }

    /// Whether this tier resets the combo.
    pub fn breaks_combo(self) -> bool {
        matches!(self, JudgeTier::Miss)
    }

    /// Whether this tier is a judgeable outcome (everything but the sentinel).
    pub fn is_judged(self) -> bool {
        !matches!(self, JudgeTier::NotEntered)
    }

    /// Dense index for per-tier counters. None for the sentinel.
    pub fn index(self) -> Option<usize> {
        match self {
            JudgeTier::CriticalPerfect => Some(0),
            JudgeTier::Perfect => Some(1),
            JudgeTier::Great => Some(2),
            JudgeTier::Miss => Some(3),
            JudgeTier::NotEntered => None,
        }
    }
}

/// Where `now` sits relative to a note's judgment window.
///
/// Splits the classifier's single out-of-window case into an explicit
/// before/after answer so state machines never infer it from the delta sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// The window has not opened yet.
    Before,
    /// A press right now would be judged.
    Open,
    /// The window expired; the note can only be a miss.
    Closed,
}

/// Early/late direction of a judged hit, for fast/slow accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingDirection {
    Early,
    Exact,
    Late,
}

impl TimingDirection {
    /// Direction of a judged hit. CriticalPerfect counts as exact; for the
    /// outer tiers the sign of `delta_us = now - scheduled` decides.
    pub fn of(tier: JudgeTier, delta_us: i64) -> Self {
        if tier == JudgeTier::CriticalPerfect || delta_us == 0 {
            TimingDirection::Exact
        } else if delta_us < 0 {
            TimingDirection::Early
        } else {
            TimingDirection::Late
        }
    }
}

/// Judgment window table in microseconds, strictly ascending.
///
/// Every boundary is exclusive: a delta exactly on a window edge falls into
/// the next tier out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeProperty {
    pub critical_us: i64,
    pub perfect_us: i64,
    pub great_us: i64,
    pub miss_us: i64,
}

impl Default for JudgeProperty {
    fn default() -> Self {
        Self {
            critical_us: 16_000,
            perfect_us: 32_000,
            great_us: 64_000,
            miss_us: 128_000,
        }
    }
}

impl JudgeProperty {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            0 < self.critical_us
                && self.critical_us < self.perfect_us
                && self.perfect_us < self.great_us
                && self.great_us < self.miss_us,
            "judge windows must be strictly ascending, got {:?}",
            self
        );
        Ok(())
    }

    /// Proportionally widen (rate > 1) or narrow (rate < 1) every window.
    ///
    /// Scaling everything by one factor preserves the ascending order; each
    /// window keeps a 1us floor so the table stays valid at extreme rates.
    pub fn scaled(&self, rate: f64) -> Result<JudgeProperty> {
        ensure!(
            rate.is_finite() && rate > 0.0,
            "window rate must be positive, got {rate}"
        );
        let scale = |us: i64| ((us as f64 * rate) as i64).max(1);
        let scaled = JudgeProperty {
            critical_us: scale(self.critical_us),
            perfect_us: scale(self.perfect_us),
            great_us: scale(self.great_us),
            miss_us: scale(self.miss_us),
        };
        scaled.validate()?;
        Ok(scaled)
    }

    /// Classify a timing offset against the window table.
    ///
    /// `delta_us` is `now - scheduled`; only its magnitude matters here.
    pub fn classify(&self, delta_us: i64) -> JudgeTier {
        let d = delta_us.abs();
        if d < self.critical_us {
            JudgeTier::CriticalPerfect
        } else if d < self.perfect_us {
            JudgeTier::Perfect
        } else if d < self.great_us {
            JudgeTier::Great
        } else if d < self.miss_us {
            JudgeTier::Miss
        } else {
            JudgeTier::NotEntered
        }
    }

    /// Locate `now` relative to the judgment window around `scheduled_us`.
    pub fn phase(&self, scheduled_us: i64, now_us: i64) -> WindowPhase {
        let delta = now_us - scheduled_us;
        if delta <= -self.miss_us {
            WindowPhase::Before
        } else if delta >= self.miss_us {
            WindowPhase::Closed
        } else {
            WindowPhase::Open
        }
    }
}
