use fermata_motion::{Easing, MotionProgress, MotionQueue, MotionSegment, ease};
use fermata_rule::JudgeTier;
use serde::{Deserialize, Serialize};

use crate::config::NoteVisualConfig;

/// Identity of a scheduled note within a play session.
pub type NoteId = u32;

/// Number of sprite variants notes cycle through across lanes.
pub const SPRITE_VARIANTS: u8 = 4;

/// Which input edge judges this scheduled event.
///
/// A tap schedules one Press event; a hold schedules a Press at its start
/// and a Release at its end, so queue and classifier mechanics are uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteTrigger {
    Press,
    Release,
}

/// Visual lifecycle of a note, independent of judging eligibility.
///
/// The split into two machines is deliberate: a note can leave scoring
/// consideration while still finishing its fade-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Created, not yet visible.
    Init,
    /// Travelling down the lane, draining its motion queue.
    Active,
    /// Fixed-duration pop after a judged hit.
    HitEffect,
    /// Fixed-duration fade-and-drop after the run ended unjudged.
    MissFade,
    /// Gone; unregistered from the lane on the next update. Terminal.
    Destroyed,
}

/// Judging eligibility of a note, independent of the visual lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgePhase {
    /// The judgment window has not opened yet.
    Pending,
    /// In the window and queued for the next matching input edge.
    Open,
    /// Judged, expired, or force-closed. Terminal.
    Closed,
}

/// One judgeable scheduled event and its pair of state machines.
#[derive(Debug, Clone)]
pub struct ScheduledNote {
    id: NoteId,
    lane: usize,
    time_us: i64,
    trigger: NoteTrigger,
    variant: u8,
    lifecycle: LifecyclePhase,
    judge: JudgePhase,
    motion: MotionQueue,
    /// Position and time snapshot taken when a fixed-duration effect starts.
    effect_from: f64,
    effect_started_us: i64,
    judged_tier: Option<JudgeTier>,
}

impl ScheduledNote {
    pub(crate) fn new(id: NoteId, lane: usize, time_us: i64, trigger: NoteTrigger) -> Self {
        Self {
            id,
            lane,
            time_us,
            trigger,
            variant: (lane % SPRITE_VARIANTS as usize) as u8,
            lifecycle: LifecyclePhase::Init,
            judge: JudgePhase::Pending,
            motion: MotionQueue::new(0.0),
            effect_from: 0.0,
            effect_started_us: 0,
            judged_tier: None,
        }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn time_us(&self) -> i64 {
        self.time_us
    }

    pub fn trigger(&self) -> NoteTrigger {
        self.trigger
    }

    /// Sprite variant assigned from the lane index at creation.
    pub fn variant(&self) -> u8 {
        self.variant
    }

    pub fn lifecycle(&self) -> LifecyclePhase {
        self.lifecycle
    }

    pub fn judge_phase(&self) -> JudgePhase {
        self.judge
    }

    /// The tier this note was closed with, if it has been.
    pub fn judged_tier(&self) -> Option<JudgeTier> {
        self.judged_tier
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle == LifecyclePhase::Destroyed
    }

    /// Lane-relative position for rendering.
    pub fn position(&self, now_us: i64, visual: &NoteVisualConfig) -> f64 {
        match self.lifecycle {
            // The pop plays in place at the hit position.
            LifecyclePhase::HitEffect => self.effect_from,
            LifecyclePhase::MissFade => ease(
                self.effect_from,
                self.effect_from + visual.miss_drop,
                self.effect_fraction(now_us, visual.miss_fade_us),
                Easing::Cosine,
            ),
            _ => self.motion.value_at(now_us),
        }
    }

    /// Normalized progress of the current fixed-duration effect.
    fn effect_fraction(&self, now_us: i64, duration_us: i64) -> f64 {
        if duration_us <= 0 {
            return 1.0;
        }
        ((now_us - self.effect_started_us) as f64 / duration_us as f64).clamp(0.0, 1.0)
    }

    /// Make the note visible and start its approach run.
    pub(crate) fn spawn(&mut self, visual: &NoteVisualConfig) {
        if self.lifecycle != LifecyclePhase::Init {
            return;
        }
        self.motion.push(
            MotionSegment::new(
                visual.spawn_position,
                visual.target_position,
                self.time_us - visual.approach_us,
                self.time_us,
            )
            .eased(visual.approach_easing),
        );
        self.lifecycle = LifecyclePhase::Active;
    }

    /// Per-frame lifecycle step. Returns true on the call that destroys
    /// the note.
    pub(crate) fn advance_lifecycle(&mut self, now_us: i64, visual: &NoteVisualConfig) -> bool {
        match self.lifecycle {
            LifecyclePhase::Init | LifecyclePhase::Destroyed => false,
            LifecyclePhase::Active => {
                if self.motion.advance(now_us) == MotionProgress::Exhausted {
                    if visual.miss_fade_us > 0 {
                        self.start_effect(now_us, visual);
                        self.lifecycle = LifecyclePhase::MissFade;
                        false
                    } else {
                        self.destroy();
                        true
                    }
                } else {
                    false
                }
            }
            LifecyclePhase::HitEffect => {
                if self.effect_fraction(now_us, visual.hit_effect_us) >= 1.0 {
                    self.destroy();
                    true
                } else {
                    false
                }
            }
            LifecyclePhase::MissFade => {
                if self.effect_fraction(now_us, visual.miss_fade_us) >= 1.0 {
                    self.destroy();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Open the judgment window for this note.
    pub(crate) fn open(&mut self) {
        debug_assert_eq!(self.judge, JudgePhase::Pending);
        self.judge = JudgePhase::Open;
    }

    /// Close via an explicit press/release judgment.
    pub(crate) fn close_judged(&mut self, tier: JudgeTier, now_us: i64, visual: &NoteVisualConfig) {
        self.judge = JudgePhase::Closed;
        self.judged_tier = Some(tier);
        if self.lifecycle != LifecyclePhase::Destroyed {
            self.start_effect(now_us, visual);
            self.lifecycle = LifecyclePhase::HitEffect;
        }
    }

    /// Close via the expiry timeout. The visual run keeps going; the miss
    /// fade starts only when the motion queue is exhausted.
    pub(crate) fn close_expired(&mut self) {
        self.judge = JudgePhase::Closed;
        self.judged_tier = Some(JudgeTier::Miss);
    }

    /// Forced close, e.g. the owning lane is going away. Skips straight to
    /// the miss fade unless the note is already playing its hit effect.
    pub(crate) fn force_close(&mut self, now_us: i64, visual: &NoteVisualConfig) {
        self.judge = JudgePhase::Closed;
        match self.lifecycle {
            LifecyclePhase::HitEffect | LifecyclePhase::MissFade | LifecyclePhase::Destroyed => {}
            LifecyclePhase::Init | LifecyclePhase::Active => {
                self.start_effect(now_us, visual);
                self.lifecycle = LifecyclePhase::MissFade;
            }
        }
    }

    fn start_effect(&mut self, now_us: i64, visual: &NoteVisualConfig) {
        self.effect_from = self.position(now_us, visual);
        self.effect_started_us = now_us;
    }

    fn destroy(&mut self) {
        self.lifecycle = LifecyclePhase::Destroyed;
        self.motion.clear();
    }
}
