// Game clock with a reversible pause/resume ramp, plus the time sources
// that feed it real time

mod clock;
mod time;

pub use clock::{ClockConfig, GameClock, RampState};
pub use time::{MockTimeProvider, SystemTimeProvider, TimeProvider};
