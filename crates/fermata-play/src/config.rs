use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use fermata_clock::ClockConfig;
use fermata_motion::Easing;
use fermata_rule::JudgeProperty;

/// How scheduled notes are animated along a lane.
///
/// Positions are lane-relative: 0.0 at the spawn edge, 1.0 at the judgment
/// line. The runtime only needs this minimal interpolation contract; real
/// coordinates are the renderer's business.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteVisualConfig {
    /// How long a note travels down its lane before its scheduled time.
    pub approach_us: i64,
    /// Duration of the pop effect after a judged hit.
    pub hit_effect_us: i64,
    /// Duration of the fade-and-drop after a missed note's run ends.
    /// Zero destroys the note as soon as its motion is exhausted.
    pub miss_fade_us: i64,
    /// Lane-relative position where notes appear.
    pub spawn_position: f64,
    /// Lane-relative position of the judgment line.
    pub target_position: f64,
    /// How far a missed note drops while fading.
    pub miss_drop: f64,
    /// Easing of the approach run.
    pub approach_easing: Easing,
    /// Duration of a lane's own entrance slide.
    pub lane_entrance_us: i64,
}

impl Default for NoteVisualConfig {
    fn default() -> Self {
        Self {
            approach_us: 800_000,
            hit_effect_us: 200_000,
            miss_fade_us: 300_000,
            spawn_position: 0.0,
            target_position: 1.0,
            miss_drop: 0.15,
            approach_easing: Easing::Linear,
            lane_entrance_us: 400_000,
        }
    }
}

impl NoteVisualConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.approach_us > 0,
            "approach duration must be positive, got {}us",
            self.approach_us
        );
        ensure!(
            self.hit_effect_us >= 0 && self.miss_fade_us >= 0 && self.lane_entrance_us >= 0,
            "effect durations cannot be negative"
        );
        Ok(())
    }
}

/// Everything the play orchestrator needs tuned, validated once up front.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayConfig {
    pub clock: ClockConfig,
    pub judge: JudgeProperty,
    pub visual: NoteVisualConfig,
}

impl PlayConfig {
    pub fn validate(&self) -> Result<()> {
        self.clock.validate()?;
        self.judge.validate()?;
        self.visual.validate()?;
        Ok(())
    }
}
