// Chart data model consumed by the play runtime: lanes, notes, hold spans

mod chart;
mod note;

pub use chart::Chart;
pub use note::{Note, NoteKind};
