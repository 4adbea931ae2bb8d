use serde::{Deserialize, Serialize};

use crate::TIER_COUNT;
use crate::judge::{JudgeTier, TimingDirection};

/// Running score for a play session.
///
/// Mutated only on a judged press/release or a miss timeout. Both the
/// running score and the max-possible score accumulate monotonically; the
/// max-possible side grows by the CriticalPerfect value exactly once per
/// scheduled event, at the moment the event leaves its judgment window, so
/// accuracy stays comparable at any point of a chart.
#[derive(Debug, Clone, Default)]
pub struct ScoreState {
    score: f64,
    max_score: f64,
    combo: u32,
    max_combo: u32,
    /// Per-tier counts, split by hit direction. Expired notes count as
    /// late misses.
    early_counts: [u32; TIER_COUNT],
    late_counts: [u32; TIER_COUNT],
    fast: u32,
    slow: u32,
}

/// Read-only snapshot for UI and telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub score: f64,
    pub max_score: f64,
    pub accuracy: f64,
    pub combo: u32,
    pub max_combo: u32,
    pub critical_perfect: u32,
    pub perfect: u32,
    pub great: u32,
    pub miss: u32,
    pub fast: u32,
    pub slow: u32,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an explicit press/release judgment.
    ///
    /// `delta_us` is `now - scheduled` at the judged instant, used for the
    /// early/late and fast/slow bookkeeping.
    pub fn record_judged(&mut self, tier: JudgeTier, delta_us: i64) {
        debug_assert!(tier.is_judged(), "sentinel tier cannot be scored");
        let Some(index) = tier.index() else {
            return;
        };

        let direction = TimingDirection::of(tier, delta_us);
        match direction {
            TimingDirection::Early => {
                self.early_counts[index] += 1;
                self.fast += 1;
            }
            TimingDirection::Late => {
                self.late_counts[index] += 1;
                self.slow += 1;
            }
            TimingDirection::Exact => self.early_counts[index] += 1,
        }

        self.score += tier.score();
        self.max_score += JudgeTier::CriticalPerfect.score();

        if tier.breaks_combo() {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        }
        log::trace!(
            "judged {:?} ({}us {:?}), score {:.1}/{:.1}, combo {}",
            tier,
            delta_us,
            direction,
            self.score,
            self.max_score,
            self.combo
        );
    }

    /// Record a note that expired past the miss window without input.
    pub fn record_expired(&mut self) {
        if let Some(index) = JudgeTier::Miss.index() {
            self.late_counts[index] += 1;
        }
        self.max_score += JudgeTier::CriticalPerfect.score();
        self.combo = 0;
        log::trace!(
            "expired, score {:.1}/{:.1}, combo reset",
            self.score,
            self.max_score
        );
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    /// `score / max_score`, defined as 1.0 before anything was judgeable.
    pub fn accuracy(&self) -> f64 {
        if self.max_score == 0.0 {
            1.0
        } else {
            self.score / self.max_score
        }
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    /// Total count for a tier (early + late). Zero for the sentinel.
    pub fn tier_count(&self, tier: JudgeTier) -> u32 {
        tier.index()
            .map(|i| self.early_counts[i] + self.late_counts[i])
            .unwrap_or(0)
    }

    pub fn tier_count_early(&self, tier: JudgeTier) -> u32 {
        tier.index().map(|i| self.early_counts[i]).unwrap_or(0)
    }

    pub fn tier_count_late(&self, tier: JudgeTier) -> u32 {
        tier.index().map(|i| self.late_counts[i]).unwrap_or(0)
    }

    /// Number of events that have left their judgment window.
    pub fn judged_count(&self) -> u32 {
        self.early_counts.iter().sum::<u32>() + self.late_counts.iter().sum::<u32>()
    }

    pub fn fast(&self) -> u32 {
        self.fast
    }

    pub fn slow(&self) -> u32 {
        self.slow
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            score: self.score,
            max_score: self.max_score,
            accuracy: self.accuracy(),
            combo: self.combo,
            max_combo: self.max_combo,
            critical_perfect: self.tier_count(JudgeTier::CriticalPerfect),
            perfect: self.tier_count(JudgeTier::Perfect),
            great: self.tier_count(JudgeTier::Great),
            miss: self.tier_count(JudgeTier::Miss),
            fast: self.fast,
            slow: self.slow,
        }
    }
}
