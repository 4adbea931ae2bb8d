// Judge windows, tier classification, and running score state

mod judge;
mod score;

pub use judge::{JudgeProperty, JudgeTier, TimingDirection, WindowPhase};
pub use score::{ScoreSnapshot, ScoreState};

/// Number of judgeable tiers: CriticalPerfect, Perfect, Great, Miss.
pub const TIER_COUNT: usize = 4;
