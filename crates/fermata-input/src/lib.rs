// Input surface for the play runtime: the provider contract, live input,
// the replay input log, and the auto-play scheduler

mod autoplay;
mod input_log;
mod live;
mod provider;

pub use autoplay::{AutoplayConfig, AutoplayEvent, AutoplayScheduler};
pub use input_log::{InputLog, InputRecord};
pub use live::LiveInput;
pub use provider::{InputAction, InputEvent, InputProvider};
