use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use chart_model::{Chart, NoteKind};

use crate::input_log::InputLog;
use crate::provider::{InputAction, InputEvent, InputProvider};

/// Auto-play tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoplayConfig {
    /// How long a synthetic tap press is held before its release: long
    /// enough to register a press+release pair, shorter than the fastest
    /// realistic single-finger cadence.
    pub tap_pulse_us: i64,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self { tap_pulse_us: 33_333 }
    }
}

impl AutoplayConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.tap_pulse_us > 0,
            "tap pulse must be positive, got {}us",
            self.tap_pulse_us
        );
        Ok(())
    }
}

/// One synthetic press/release in the prepared schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplayEvent {
    pub time_us: i64,
    pub lane: usize,
    pub action: InputAction,
}

/// Build the full event schedule for a chart.
///
/// Each note becomes a press at `time + anchor` and a release at the hold
/// end or one tap pulse later. Events are grouped per lane and sorted there
/// first — synthetic press/release pairs from different notes can interleave
/// out of note-declaration order — then merged into one globally
/// time-ordered sequence. A release that would land past the next press in
/// its lane is clamped onto that press time (and ordered before it) so the
/// lane state always sees clean alternating edges.
fn build_schedule(chart: &Chart, anchor_us: i64, tap_pulse_us: i64) -> Vec<AutoplayEvent> {
    // (press, release) pairs per lane.
    let mut spans: Vec<Vec<(i64, i64)>> = vec![Vec::new(); chart.lane_count()];
    for note in chart.notes() {
        let press = note.time_us + anchor_us;
        let release = match note.kind {
            NoteKind::Tap => press + tap_pulse_us,
            NoteKind::Hold { end_time_us } => end_time_us + anchor_us,
        };
        spans[note.lane].push((press, release));
    }

    let mut lanes: Vec<Vec<AutoplayEvent>> = Vec::with_capacity(spans.len());
    for (lane, mut pairs) in spans.into_iter().enumerate() {
        pairs.sort_by_key(|&(press, _)| press);
        for i in 0..pairs.len().saturating_sub(1) {
            let next_press = pairs[i + 1].0;
            if pairs[i].1 > next_press {
                pairs[i].1 = next_press;
            }
        }
        let mut events: Vec<AutoplayEvent> = Vec::with_capacity(pairs.len() * 2);
        for (press, release) in pairs {
            events.push(AutoplayEvent {
                time_us: press,
                lane,
                action: InputAction::Press,
            });
            events.push(AutoplayEvent {
                time_us: release,
                lane,
                action: InputAction::Release,
            });
        }
        // Releases sort ahead of presses at the same instant.
        events.sort_by_key(|e| (e.time_us, e.action == InputAction::Press));
        lanes.push(events);
    }

    merge_lanes(lanes)
}

/// Merge per-lane sequences into one globally time-ordered sequence.
fn merge_lanes(lanes: Vec<Vec<AutoplayEvent>>) -> Vec<AutoplayEvent> {
    let total: usize = lanes.iter().map(Vec::len).sum();
    let mut heads = vec![0_usize; lanes.len()];
    let mut merged = Vec::with_capacity(total);
    while merged.len() < total {
        let mut best: Option<usize> = None;
        for (lane, events) in lanes.iter().enumerate() {
            let Some(event) = events.get(heads[lane]) else {
                continue;
            };
            let key = (event.time_us, event.action == InputAction::Press);
            let better = match best {
                None => true,
                Some(current) => {
                    let head = &lanes[current][heads[current]];
                    key < (head.time_us, head.action == InputAction::Press)
                }
            };
            if better {
                best = Some(lane);
            }
        }
        let Some(lane) = best else {
            break;
        };
        merged.push(lanes[lane][heads[lane]]);
        heads[lane] += 1;
    }
    merged
}

/// Auto-play scheduler: replays a chart as synthetic input.
///
/// Implements the same provider contract as live input. `start` prepares
/// the event schedule on a background worker (pure computation over the
/// immutable note list); the replay side is a scan-forward cursor that each
/// poll fires every event whose time has passed. One cancellation token
/// covers both sides: the worker discards its result and the cursor stops
/// at the next poll, so nothing fires after `stop`.
pub struct AutoplayScheduler {
    registered: Vec<bool>,
    pressing: Vec<bool>,
    enabled: bool,
    active: bool,
    events: Vec<AutoplayEvent>,
    loaded: bool,
    cursor: usize,
    prepared: Arc<Mutex<Option<Vec<AutoplayEvent>>>>,
    cancel: Arc<AtomicBool>,
    log: InputLog,
    config: AutoplayConfig,
}

impl AutoplayScheduler {
    pub fn new(lane_count: usize, config: AutoplayConfig) -> Result<Self> {
        ensure!(lane_count > 0, "auto-play needs at least one lane");
        config.validate()?;
        Ok(Self {
            registered: vec![false; lane_count],
            pressing: vec![false; lane_count],
            enabled: true,
            active: false,
            events: Vec::new(),
            loaded: false,
            cursor: 0,
            prepared: Arc::new(Mutex::new(None)),
            cancel: Arc::new(AtomicBool::new(false)),
            log: InputLog::new(),
            config,
        })
    }

    /// Begin replaying `chart`, anchored at the given scaled-clock time.
    ///
    /// Any previous schedule is stopped first. Preparation runs off-thread;
    /// events start flowing from the first poll after it completes.
    pub fn start(&mut self, chart: &Chart, anchor_us: i64) {
        self.stop();
        let cancel = Arc::new(AtomicBool::new(false));
        let prepared = Arc::new(Mutex::new(None));
        self.cancel = Arc::clone(&cancel);
        self.prepared = Arc::clone(&prepared);
        self.active = true;

        let chart = chart.clone();
        let tap_pulse_us = self.config.tap_pulse_us;
        log::debug!(
            "autoplay start: {} notes anchored at {}us",
            chart.notes().len(),
            anchor_us
        );
        std::thread::spawn(move || {
            let schedule = build_schedule(&chart, anchor_us, tap_pulse_us);
            if cancel.load(Ordering::SeqCst) {
                // Stopped while preparing; drop the result.
                return;
            }
            *prepared.lock().unwrap() = Some(schedule);
        });
    }

    /// Stop the replay and clear all scheduled events. Idempotent.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if self.active {
            log::debug!("autoplay stopped at event {}/{}", self.cursor, self.events.len());
        }
        self.active = false;
        self.loaded = false;
        self.events.clear();
        self.cursor = 0;
        self.prepared.lock().unwrap().take();
        self.pressing.fill(false);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the prepared schedule is available to the replay cursor.
    pub fn is_ready(&self) -> bool {
        self.active && (self.loaded || self.prepared.lock().unwrap().is_some())
    }

    pub fn log(&self) -> &InputLog {
        &self.log
    }
}

impl InputProvider for AutoplayScheduler {
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
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_pressing(&self, lane: usize) -> bool {
        self.pressing.get(lane).copied().unwrap_or(false)
    }

    fn poll(&mut self, now_us: i64) -> Vec<InputEvent> {
        let mut out = Vec::new();
        if !self.enabled || !self.active || self.cancel.load(Ordering::SeqCst) {
            return out;
        }
        if !self.loaded {
            match self.prepared.lock().unwrap().take() {
                Some(schedule) => {
                    log::debug!("autoplay schedule ready: {} events", schedule.len());
                    self.events = schedule;
                    self.loaded = true;
                }
                None => return out,
            }
        }
        while self.cursor < self.events.len() && self.events[self.cursor].time_us <= now_us {
            if self.cancel.load(Ordering::SeqCst) {
                break;
            }
            let event = self.events[self.cursor];
            self.cursor += 1;

            let pressed = event.action == InputAction::Press;
            let Some(state) = self.pressing.get_mut(event.lane) else {
                log::trace!("autoplay edge for lane {} out of range, dropped", event.lane);
                continue;
            };
            if *state == pressed {
                continue;
            }
            *state = pressed;
            self.log.push(event.time_us, event.lane, pressed);
            if self.registered.get(event.lane).copied().unwrap_or(false) {
                out.push(InputEvent {
                    lane: event.lane,
                    action: event.action,
                    time_us: event.time_us,
                });
            } else {
                log::trace!("autoplay edge for unregistered lane {}, dropped", event.lane);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_model::Note;

    fn wait_ready(scheduler: &AutoplayScheduler) {
        for _ in 0..1_000 {
            if scheduler.is_ready() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        panic!("autoplay schedule did not become ready");
    }

    fn scheduler_for(chart: &Chart, anchor_us: i64) -> AutoplayScheduler {
        let mut scheduler =
            AutoplayScheduler::new(chart.lane_count(), AutoplayConfig::default()).unwrap();
        for lane in 0..chart.lane_count() {
            scheduler.register(lane);
        }
        scheduler.start(chart, anchor_us);
        wait_ready(&scheduler);
        scheduler
    }

    #[test]
    fn tap_becomes_press_then_pulse_release() {
        let chart = Chart::new(2, vec![Note::tap(1, 2_000_000)]).unwrap();
        let schedule = build_schedule(&chart, 0, 33_333);
        assert_eq!(schedule.len(), 2);
        assert_eq!(
            schedule[0],
            AutoplayEvent {
                time_us: 2_000_000,
                lane: 1,
                action: InputAction::Press
            }
        );
        assert_eq!(
            schedule[1],
            AutoplayEvent {
                time_us: 2_033_333,
                lane: 1,
                action: InputAction::Release
            }
        );
    }

    #[test]
    fn hold_releases_at_its_end() {
        let chart = Chart::new(1, vec![Note::hold(0, 1_000_000, 2_500_000)]).unwrap();
        let schedule = build_schedule(&chart, 0, 33_333);
        assert_eq!(schedule[0].action, InputAction::Press);
        assert_eq!(schedule[0].time_us, 1_000_000);
        assert_eq!(schedule[1].action, InputAction::Release);
        assert_eq!(schedule[1].time_us, 2_500_000);
    }

    #[test]
    fn anchor_offsets_every_event() {
        let chart = Chart::new(1, vec![Note::tap(0, 1_000_000)]).unwrap();
        let schedule = build_schedule(&chart, 500_000, 33_333);
        assert_eq!(schedule[0].time_us, 1_500_000);
        assert_eq!(schedule[1].time_us, 1_533_333);
    }

    #[test]
    fn schedule_is_globally_time_ordered() {
        let chart = Chart::new(
            3,
            vec![
                Note::tap(2, 1_050_000),
                Note::tap(0, 1_000_000),
                Note::hold(1, 900_000, 1_200_000),
                Note::tap(0, 1_060_000),
            ],
        )
        .unwrap();
        let schedule = build_schedule(&chart, 0, 33_333);
        for pair in schedule.windows(2) {
            assert!(pair[0].time_us <= pair[1].time_us, "schedule out of order");
        }
        assert_eq!(schedule.len(), 8);
    }

    #[test]
    fn crowded_lane_clamps_release_onto_next_press() {
        // Two taps 20ms apart: the first pulse release would land past the
        // second press.
        let chart = Chart::new(
            1,
            vec![Note::tap(0, 1_000_000), Note::tap(0, 1_020_000)],
        )
        .unwrap();
        let schedule = build_schedule(&chart, 0, 33_333);
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[0].action, InputAction::Press);
        // Clamped release arrives with, but ahead of, the second press.
        assert_eq!(schedule[1].time_us, 1_020_000);
        assert_eq!(schedule[1].action, InputAction::Release);
        assert_eq!(schedule[2].time_us, 1_020_000);
        assert_eq!(schedule[2].action, InputAction::Press);
    }

    #[test]
    fn poll_fires_due_events_in_order() {
        let chart = Chart::new(2, vec![Note::tap(1, 2_000_000)]).unwrap();
        let mut scheduler = scheduler_for(&chart, 0);

        assert!(scheduler.poll(1_999_999).is_empty());

        let events = scheduler.poll(2_000_000);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, InputAction::Press);
        assert_eq!(events[0].time_us, 2_000_000);
        assert!(scheduler.is_pressing(1));

        let events = scheduler.poll(2_100_000);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, InputAction::Release);
        assert_eq!(events[0].time_us, 2_033_333);
        assert!(!scheduler.is_pressing(1));
    }

    #[test]
    fn one_late_poll_fires_everything_due() {
        let chart = Chart::new(1, vec![Note::tap(0, 1_000_000), Note::tap(0, 2_000_000)]).unwrap();
        let mut scheduler = scheduler_for(&chart, 0);
        let events = scheduler.poll(5_000_000);
        assert_eq!(events.len(), 4);
        let times: Vec<i64> = events.iter().map(|e| e.time_us).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn stop_is_idempotent_and_silences_polls() {
        let chart = Chart::new(1, vec![Note::tap(0, 1_000_000)]).unwrap();
        let mut scheduler = scheduler_for(&chart, 0);
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_active());
        assert!(scheduler.poll(5_000_000).is_empty());
    }

    #[test]
    fn stop_during_preparation_discards_the_schedule() {
        let chart = Chart::new(1, vec![Note::tap(0, 1_000_000)]).unwrap();
        let mut scheduler =
            AutoplayScheduler::new(1, AutoplayConfig::default()).unwrap();
        scheduler.register(0);
        scheduler.start(&chart, 0);
        scheduler.stop();
        // Give the worker time to finish either way.
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(scheduler.poll(5_000_000).is_empty());
    }

    #[test]
    fn restart_replaces_the_previous_schedule() {
        let chart_a = Chart::new(1, vec![Note::tap(0, 1_000_000)]).unwrap();
        let chart_b = Chart::new(1, vec![Note::tap(0, 9_000_000)]).unwrap();
        let mut scheduler = scheduler_for(&chart_a, 0);
        scheduler.start(&chart_b, 0);
        wait_ready(&scheduler);
        let events = scheduler.poll(10_000_000);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].time_us, 9_000_000);
    }

    #[test]
    fn unregistered_lane_edges_are_dropped_but_tracked() {
        let chart = Chart::new(2, vec![Note::tap(0, 1_000_000)]).unwrap();
        let mut scheduler =
            AutoplayScheduler::new(2, AutoplayConfig::default()).unwrap();
        scheduler.register(1);
        scheduler.start(&chart, 0);
        wait_ready(&scheduler);
        assert!(scheduler.poll(2_000_000).is_empty());
        // The lane state and log still observed the edges.
        assert_eq!(scheduler.log().len(), 2);
    }

    #[test]
    fn disabled_scheduler_emits_nothing() {
        let chart = Chart::new(1, vec![Note::tap(0, 1_000_000)]).unwrap();
        let mut scheduler = scheduler_for(&chart, 0);
        scheduler.set_enabled(false);
        assert!(scheduler.poll(2_000_000).is_empty());
    }

    #[test]
    fn rejects_bad_config() {
        assert!(AutoplayScheduler::new(0, AutoplayConfig::default()).is_err());
        assert!(AutoplayScheduler::new(4, AutoplayConfig { tap_pulse_us: 0 }).is_err());
    }
}
