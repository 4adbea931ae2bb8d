use serde::{Deserialize, Serialize};

/// Edge direction of an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    Press,
    Release,
}

/// A single press/release edge on a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub lane: usize,
    pub action: InputAction,
    /// Timestamp of the edge in the scaled-clock domain, used as the
    /// judging time so synthetic and live input behave identically.
    pub time_us: i64,
}

/// The input surface the lane/judgment layer depends on.
///
/// Implemented by live input and by the auto-play scheduler; consumers
/// cannot tell which. Lanes register themselves to receive edges; events
/// for unregistered lanes are dropped as a normal outcome. `poll` drains
/// pending edges once per frame in ascending time order.
pub trait InputProvider {
    fn register(&mut self, lane: usize);
    fn unregister(&mut self, lane: usize);
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
    fn is_pressing(&self, lane: usize) -> bool;
    fn poll(&mut self, now_us: i64) -> Vec<InputEvent>;
}

impl<T: InputProvider + ?Sized> InputProvider for Box<T> {
    fn register(&mut self, lane: usize) {
        (**self).register(lane);
    }

    fn unregister(&mut self, lane: usize) {
        (**self).unregister(lane);
    }

    fn set_enabled(&mut self, enabled: bool) {
        (**self).set_enabled(enabled);
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn is_pressing(&self, lane: usize) -> bool {
        (**self).is_pressing(lane)
    }

    fn poll(&mut self, now_us: i64) -> Vec<InputEvent> {
        (**self).poll(now_us)
    }
}
