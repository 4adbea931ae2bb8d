// Play runtime: note/lane state machines, the per-lane judgment queue,
// feedback timers, and the frame-loop orchestrator

mod config;
mod lane;
mod note;
mod player;
mod timers;

pub use config::{NoteVisualConfig, PlayConfig};
pub use lane::Lane;
pub use note::{JudgePhase, LifecyclePhase, NoteId, NoteTrigger, ScheduledNote, SPRITE_VARIANTS};
pub use player::{PlayEvent, Player};
pub use timers::TimerSet;
