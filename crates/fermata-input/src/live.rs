use std::collections::VecDeque;

use crate::input_log::InputLog;
use crate::provider::{InputAction, InputEvent, InputProvider};

/// Live input provider fed by the platform layer.
///
/// The embedding layer calls [`LiveInput::key_changed`] with the lane, the
/// new pressed state, and the timestamp of the edge; the play loop drains
/// the resulting events through the provider contract. Duplicate same-state
/// transitions are suppressed so a held key does not re-press.
pub struct LiveInput {
    lane_count: usize,
    registered: Vec<bool>,
    pressing: Vec<bool>,
    enabled: bool,
    pending: VecDeque<InputEvent>,
    log: InputLog,
}

impl LiveInput {
    pub fn new(lane_count: usize) -> Self {
        Self {
            lane_count,
            registered: vec![false; lane_count],
            pressing: vec![false; lane_count],
            enabled: true,
            pending: VecDeque::new(),
            log: InputLog::new(),
        }
    }

    /// Feed one key edge from the platform layer.
    ///
    /// Ignored while disabled; out-of-range lanes and duplicate states are
    /// dropped. Edges on unregistered lanes still update the pressed state
    /// and the log, but produce no event.
    pub fn key_changed(&mut self, lane: usize, pressed: bool, time_us: i64) {
        if !self.enabled {
            return;
        }
        if lane >= self.lane_count {
            log::trace!("key edge for lane {lane} out of range, dropped");
            return;
        }
        if self.pressing[lane] == pressed {
            return;
        }
        self.pressing[lane] = pressed;
        self.log.push(time_us, lane, pressed);
        if self.registered[lane] {
            let action = if pressed {
                InputAction::Press
            } else {
                InputAction::Release
            };
            self.pending.push_back(InputEvent {
                lane,
                action,
                time_us,
            });
        } else {
            log::trace!("key edge for unregistered lane {lane}, dropped");
        }
    }

    pub fn log(&self) -> &InputLog {
        &self.log
    }
}

impl InputProvider for LiveInput {
    fn register(&mut self, lane: usize) {
        if let Some(slot) = self.registered.get_mut(lane) {
            *slot = true;
        }
    }

    fn unregister(&mut self, lane: usize) {
        if let Some(slot) = self.registered.get_mut(lane) {
            *slot = false;
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.pressing.fill(false);
            self.pending.clear();
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_pressing(&self, lane: usize) -> bool {
        self.pressing.get(lane).copied().unwrap_or(false)
    }

    fn poll(&mut self, _now_us: i64) -> Vec<InputEvent> {
        self.pending.drain(..).collect()
    }
}
