use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

const US_PER_SEC: f64 = 1_000_000.0;

/// Tuning for the pause/resume ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Ramp slope in scale units per second.
    pub ramp_speed: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { ramp_speed: 2.25 }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.ramp_speed.is_finite() && self.ramp_speed > 0.0,
            "ramp speed must be a positive number, got {}",
            self.ramp_speed
        );
        Ok(())
    }
}

/// Ramp state machine.
///
/// One enum, never a pair of pause/resume booleans: the discriminant is the
/// single source of truth for ramp direction, so "both flags set" cannot be
/// represented. A ramp caches the scale and real time at the moment it was
/// requested; re-requesting the opposite direction mid-ramp starts a fresh
/// ramp from the instantaneous scale, not the old endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RampState {
    Running,
    RampingToPause { from_scale: f64, started_real_us: i64 },
    Paused,
    RampingToResume { from_scale: f64, started_real_us: i64 },
}

/// The adjustable game clock.
///
/// Maintains an unscaled real counter and a scaled counter that integrates
/// the instantaneous scale factor. Consumers feed real time once per frame
/// through [`GameClock::advance_to`]; all other operations are synchronous
/// reads or ramp requests. Created once per play session.
#[derive(Debug, Clone)]
pub struct GameClock {
    config: ClockConfig,
    real_us: i64,
    /// Scaled counter accumulated in f64 so sub-microsecond slices from
    /// ramp integration are not truncated frame by frame.
    scaled_us: f64,
    scale: f64,
    ramp: RampState,
}

impl GameClock {
    pub fn new(config: ClockConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            real_us: 0,
            scaled_us: 0.0,
            scale: 1.0,
            ramp: RampState::Running,
        })
    }

    /// Unscaled real counter in microseconds.
    pub fn now_real_us(&self) -> i64 {
        self.real_us
    }

    /// Scaled game counter in microseconds.
    pub fn now_scaled_us(&self) -> i64 {
        self.scaled_us.round() as i64
    }

    /// Instantaneous scale factor in [0, 1].
    pub fn time_scale(&self) -> f64 {
        self.scale
    }

    pub fn ramp_state(&self) -> RampState {
        self.ramp
    }

    /// Whether the scale is pinned at 0 (ramping toward pause is not paused).
    pub fn is_paused(&self) -> bool {
        matches!(self.ramp, RampState::Paused)
    }

    /// Begin ramping the scale down to 0. No-op while already paused or
    /// ramping down; interrupts a resume ramp at its instantaneous scale.
    pub fn request_pause(&mut self) {
        match self.ramp {
            RampState::Paused | RampState::RampingToPause { .. } => {}
            RampState::Running | RampState::RampingToResume { .. } => {
                if self.scale <= 0.0 {
                    self.scale = 0.0;
                    self.ramp = RampState::Paused;
                } else {
                    self.ramp = RampState::RampingToPause {
                        from_scale: self.scale,
                        started_real_us: self.real_us,
                    };
                }
                log::debug!(
                    "pause requested at real {}us, scale {:.3}",
                    self.real_us,
                    self.scale
                );
            }
        }
    }

    /// Begin ramping the scale back up to 1. No-op while already running or
    /// ramping up; interrupts a pause ramp at its instantaneous scale.
    pub fn request_resume(&mut self) {
        match self.ramp {
            RampState::Running | RampState::RampingToResume { .. } => {}
            RampState::Paused | RampState::RampingToPause { .. } => {
                if self.scale >= 1.0 {
                    self.scale = 1.0;
                    self.ramp = RampState::Running;
                } else {
                    self.ramp = RampState::RampingToResume {
                        from_scale: self.scale,
                        started_real_us: self.real_us,
                    };
                }
                log::debug!(
                    "resume requested at real {}us, scale {:.3}",
                    self.real_us,
                    self.scale
                );
            }
        }
    }

    /// Flip the ramp direction based on the current state.
    pub fn toggle_pause(&mut self) {
        match self.ramp {
            RampState::Running | RampState::RampingToResume { .. } => self.request_pause(),
            RampState::Paused | RampState::RampingToPause { .. } => self.request_resume(),
        }
    }

    /// Advance both counters to the given real time.
    ///
    /// The scaled counter integrates the scale factor in closed form, split
    /// at the instant a ramp pins, so the result is independent of how often
    /// this is called. Timestamps at or before the current real time are
    /// ignored.
    pub fn advance_to(&mut self, now_real_us: i64) {
        if now_real_us <= self.real_us {
            return;
        }
        let a = self.real_us as f64;
        let b = now_real_us as f64;
        let speed_per_us = self.config.ramp_speed / US_PER_SEC;

        match self.ramp {
            RampState::Running => {
                self.scaled_us += b - a;
            }
            RampState::Paused => {}
            RampState::RampingToPause {
                from_scale,
                started_real_us,
            } => {
                let started = started_real_us as f64;
                // Real time at which the scale reaches 0.
                let pin = started + from_scale / speed_per_us;
                let ramp_end = pin.min(b);
                if ramp_end > a {
                    let s_a = (from_scale - (a - started) * speed_per_us).clamp(0.0, 1.0);
                    let s_b = (from_scale - (ramp_end - started) * speed_per_us).clamp(0.0, 1.0);
                    self.scaled_us += 0.5 * (s_a + s_b) * (ramp_end - a);
                }
                if b >= pin {
                    self.scale = 0.0;
                    self.ramp = RampState::Paused;
                    log::debug!("clock paused at real {}us", now_real_us);
                } else {
                    self.scale = (from_scale - (b - started) * speed_per_us).clamp(0.0, 1.0);
                }
            }
            RampState::RampingToResume {
                from_scale,
                started_real_us,
            } => {
                let started = started_real_us as f64;
                // Real time at which the scale reaches 1.
                let pin = started + (1.0 - from_scale) / speed_per_us;
                let ramp_end = pin.min(b);
                if ramp_end > a {
                    let s_a = (from_scale + (a - started) * speed_per_us).clamp(0.0, 1.0);
                    let s_b = (from_scale + (ramp_end - started) * speed_per_us).clamp(0.0, 1.0);
                    self.scaled_us += 0.5 * (s_a + s_b) * (ramp_end - a);
                }
                if b >= pin {
                    // Remainder of the interval runs at full scale.
                    self.scaled_us += b - pin.max(a);
                    self.scale = 1.0;
                    self.ramp = RampState::Running;
                    log::debug!("clock running at real {}us", now_real_us);
                } else {
                    self.scale = (from_scale + (b - started) * speed_per_us).clamp(0.0, 1.0);
                }
            }
        }
        self.real_us = now_real_us;
    }
}
