use anyhow::Result;

use chart_model::{Chart, NoteKind};
use fermata_clock::GameClock;
use fermata_input::{InputAction, InputProvider};
use fermata_rule::{JudgeProperty, JudgeTier, ScoreSnapshot, ScoreState};

use crate::config::{NoteVisualConfig, PlayConfig};
use crate::lane::Lane;
use crate::note::{NoteId, NoteTrigger, ScheduledNote};
use crate::timers::TimerSet;

/// Notification emitted by a frame update, for sound/skin/telemetry layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayEvent {
    /// A note was judged by an input edge.
    Judged {
        lane: usize,
        note: NoteId,
        tier: JudgeTier,
        delta_us: i64,
    },
    /// A note timed out past the miss window.
    Expired { lane: usize, note: NoteId },
    /// A note finished its teardown and unregistered from its lane.
    NoteDestroyed { lane: usize, note: NoteId },
    /// Non-judging input feedback (e.g. a keypress sound), fired whether or
    /// not a note was there to judge.
    Feedback { lane: usize, action: InputAction },
}

/// The per-frame play orchestrator.
///
/// Owns the game clock, the lanes, the score, the feedback timers, and the
/// active input provider. Everything runs on the frame thread; the provider
/// is the only seam through which another thread (auto-play preparation)
/// touches the session.
pub struct Player<P: InputProvider> {
    clock: GameClock,
    lanes: Vec<Lane>,
    score: ScoreState,
    timers: TimerSet,
    provider: P,
    judge: JudgeProperty,
    visual: NoteVisualConfig,
    total_events: usize,
    closed: bool,
}

impl<P: InputProvider> Player<P> {
    /// Validate the configuration, expand the chart into per-lane scheduled
    /// notes, and register every lane with the provider.
    pub fn new(chart: &Chart, config: PlayConfig, mut provider: P) -> Result<Self> {
        config.validate()?;

        let mut per_lane: Vec<Vec<ScheduledNote>> = (0..chart.lane_count())
            .map(|_| Vec::new())
            .collect();
        let mut next_id: NoteId = 0;
        for note in chart.notes() {
            per_lane[note.lane].push(ScheduledNote::new(
                next_id,
                note.lane,
                note.time_us,
                NoteTrigger::Press,
            ));
            next_id += 1;
            if let NoteKind::Hold { end_time_us } = note.kind {
                per_lane[note.lane].push(ScheduledNote::new(
                    next_id,
                    note.lane,
                    end_time_us,
                    NoteTrigger::Release,
                ));
                next_id += 1;
            }
        }

        let mut lanes: Vec<Lane> = per_lane
            .into_iter()
            .enumerate()
            .map(|(index, mut notes)| {
                // Hold releases can land past later notes' presses.
                notes.sort_by_key(ScheduledNote::time_us);
                Lane::new(index, notes)
            })
            .collect();

        for lane in &mut lanes {
            lane.activate(0, &config.visual);
            provider.register(lane.index());
        }
        provider.set_enabled(true);

        log::debug!(
            "player ready: {} lanes, {} scheduled events",
            lanes.len(),
            next_id
        );
        Ok(Self {
            clock: GameClock::new(config.clock)?,
            lanes,
            score: ScoreState::new(),
            timers: TimerSet::new(chart.lane_count()),
            provider,
            judge: config.judge,
            visual: config.visual,
            total_events: chart.scheduled_event_count(),
            closed: false,
        })
    }

    /// Advance the session to the given real time.
    ///
    /// Drives the clock, drains the provider, routes edges to lanes (each
    /// judged at its edge timestamp), then steps every lane's machines.
    pub fn update(&mut self, now_real_us: i64) -> Vec<PlayEvent> {
        let mut events = Vec::new();
        if self.closed {
            return events;
        }
        self.clock.advance_to(now_real_us);
        let now_us = self.clock.now_scaled_us();

        for edge in self.provider.poll(now_us) {
            let Some(lane) = self.lanes.get_mut(edge.lane) else {
                log::trace!("input for unknown lane {}, dropped", edge.lane);
                continue;
            };
            // Judge at the edge's own timestamp; never ahead of the frame.
            let at_us = edge.time_us.min(now_us);
            match edge.action {
                InputAction::Press => lane.on_press(
                    at_us,
                    &self.judge,
                    &self.visual,
                    &mut self.score,
                    &mut self.timers,
                    &mut events,
                ),
                InputAction::Release => lane.on_release(
                    at_us,
                    &self.judge,
                    &self.visual,
                    &mut self.score,
                    &mut self.timers,
                    &mut events,
                ),
            }
        }

        for lane in &mut self.lanes {
            lane.update(
                now_us,
                &self.judge,
                &self.visual,
                &mut self.score,
                &mut self.timers,
                &mut events,
            );
        }
        events
    }

    pub fn request_pause(&mut self) {
        self.clock.request_pause();
    }

    pub fn request_resume(&mut self) {
        self.clock.request_resume();
    }

    pub fn toggle_pause(&mut self) {
        self.clock.toggle_pause();
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        self.score.snapshot()
    }

    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn lane(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Every scheduled event has left its window and every note has
    /// finished tearing down.
    pub fn is_finished(&self) -> bool {
        self.score.judged_count() as usize >= self.total_events
            && self.lanes.iter().all(|lane| lane.note_count() == 0)
    }

    /// Shut the session down: fade out every lane, drop input registration,
    /// disable the provider. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let now_us = self.clock.now_scaled_us();
        for lane in &mut self.lanes {
            lane.close(now_us, &self.visual);
        }
        for index in 0..self.lanes.len() {
            self.provider.unregister(index);
        }
        self.provider.set_enabled(false);
        self.closed = true;
        log::debug!("player closed at {}us", now_us);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
