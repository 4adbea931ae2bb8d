use std::collections::VecDeque;

use fermata_input::InputAction;
use fermata_motion::{MotionQueue, MotionSegment};
use fermata_rule::{JudgeProperty, ScoreState, WindowPhase};

use crate::config::NoteVisualConfig;
use crate::note::{JudgePhase, LifecyclePhase, NoteId, NoteTrigger, ScheduledNote};
use crate::player::PlayEvent;
use crate::timers::TimerSet;

/// One scrolling lane: its attached notes, the judgment queue, and the
/// lane's own lifecycle/judgment machine pair.
///
/// The judgment queue holds the ids of currently-judgeable notes in
/// ascending scheduled-time order. That ordering is an invariant kept by
/// construction: notes are appended only as their windows open, and windows
/// open in scheduled order because the note list is time-sorted and every
/// note shares one window table. Input only ever touches the queue front.
pub struct Lane {
    index: usize,
    notes: Vec<ScheduledNote>,
    judge_queue: VecDeque<NoteId>,
    /// First note that has not been spawned yet.
    spawn_cursor: usize,
    /// First note whose judgment window has not opened yet.
    watch_cursor: usize,
    lifecycle: LifecyclePhase,
    judge: JudgePhase,
    motion: MotionQueue,
    exit_started_us: Option<i64>,
}

impl Lane {
    /// `notes` must be sorted by ascending scheduled time; the player
    /// guarantees this when expanding the chart.
    pub(crate) fn new(index: usize, notes: Vec<ScheduledNote>) -> Self {
        debug_assert!(notes.windows(2).all(|w| w[0].time_us() <= w[1].time_us()));
        Self {
            index,
            notes,
            judge_queue: VecDeque::new(),
            spawn_cursor: 0,
            watch_cursor: 0,
            lifecycle: LifecyclePhase::Init,
            judge: JudgePhase::Pending,
            motion: MotionQueue::new(0.0),
            exit_started_us: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn lifecycle(&self) -> LifecyclePhase {
        self.lifecycle
    }

    pub fn judge_phase(&self) -> JudgePhase {
        self.judge
    }

    /// Notes still attached (any lifecycle phase short of reaped).
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn notes(&self) -> &[ScheduledNote] {
        &self.notes
    }

    /// Ids currently eligible for judgment, earliest first.
    pub fn judge_queue(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.judge_queue.iter().copied()
    }

    /// Lane-relative entrance offset for rendering.
    pub fn position(&self, now_us: i64) -> f64 {
        self.motion.value_at(now_us)
    }

    /// Bring the lane in: entrance slide, then accept input.
    pub(crate) fn activate(&mut self, now_us: i64, visual: &NoteVisualConfig) {
        if self.lifecycle != LifecyclePhase::Init {
            return;
        }
        self.motion.push(MotionSegment::new(
            0.0,
            1.0,
            now_us,
            now_us + visual.lane_entrance_us,
        ));
        self.lifecycle = LifecyclePhase::Active;
        self.judge = JudgePhase::Open;
    }

    /// Per-frame step: spawn notes coming into view, open judgment windows,
    /// expire the stale queue front, drive note lifecycles, reap the dead.
    pub(crate) fn update(
        &mut self,
        now_us: i64,
        property: &JudgeProperty,
        visual: &NoteVisualConfig,
        score: &mut ScoreState,
        timers: &mut TimerSet,
        events: &mut Vec<PlayEvent>,
    ) {
        self.motion.advance(now_us);
        if let Some(exit_started) = self.exit_started_us
            && self.lifecycle == LifecyclePhase::MissFade
            && now_us >= exit_started + visual.miss_fade_us
        {
            self.lifecycle = LifecyclePhase::Destroyed;
        }

        // Notes come into view in scheduled order.
        while self.spawn_cursor < self.notes.len() {
            let note = &mut self.notes[self.spawn_cursor];
            if now_us < note.time_us() - visual.approach_us {
                break;
            }
            note.spawn(visual);
            self.spawn_cursor += 1;
        }

        if self.judge == JudgePhase::Open {
            self.open_due_windows(now_us, property);
            self.expire_stale_front(now_us, property, score, timers, events);
        }

        // Drive lifecycles and reap destroyed notes.
        let mut i = 0;
        while i < self.notes.len() {
            let destroyed_now = self.notes[i].advance_lifecycle(now_us, visual);
            if destroyed_now {
                events.push(PlayEvent::NoteDestroyed {
                    lane: self.index,
                    note: self.notes[i].id(),
                });
            }
            if self.notes[i].is_destroyed() {
                let id = self.notes[i].id();
                self.judge_queue.retain(|&queued| queued != id);
                self.notes.remove(i);
                if i < self.spawn_cursor {
                    self.spawn_cursor -= 1;
                }
                if i < self.watch_cursor {
                    self.watch_cursor -= 1;
                }
            } else {
                i += 1;
            }
        }
    }

    /// Append every note whose window has opened to the judgment queue.
    fn open_due_windows(&mut self, now_us: i64, property: &JudgeProperty) {
        while self.watch_cursor < self.notes.len() {
            let id = self.notes[self.watch_cursor].id();
            let time_us = self.notes[self.watch_cursor].time_us();
            if property.phase(time_us, now_us) == WindowPhase::Before {
                break;
            }
            // Append-only: eligibility follows ascending scheduled time, so
            // the queue stays sorted without ever sorting it.
            debug_assert!(
                self.judge_queue
                    .back()
                    .is_none_or(|&back| self.note_time(back) <= time_us),
                "judgment queue ordering violated"
            );
            self.notes[self.watch_cursor].open();
            self.judge_queue.push_back(id);
            self.watch_cursor += 1;
        }
    }

    /// Time out queue-front notes whose window has closed.
    fn expire_stale_front(
        &mut self,
        now_us: i64,
        property: &JudgeProperty,
        score: &mut ScoreState,
        timers: &mut TimerSet,
        events: &mut Vec<PlayEvent>,
    ) {
        while let Some(&front_id) = self.judge_queue.front() {
            let Some(note) = self.notes.iter_mut().find(|n| n.id() == front_id) else {
                self.judge_queue.pop_front();
                continue;
            };
            if property.phase(note.time_us(), now_us) != WindowPhase::Closed {
                break;
            }
            note.close_expired();
            self.judge_queue.pop_front();
            score.record_expired();
            timers.set_judge(self.index, now_us);
            log::debug!("lane {} note {} expired unjudged", self.index, front_id);
            events.push(PlayEvent::Expired {
                lane: self.index,
                note: front_id,
            });
        }
    }

    /// Handle a press edge at `now_us` (the edge's own timestamp).
    pub(crate) fn on_press(
        &mut self,
        now_us: i64,
        property: &JudgeProperty,
        visual: &NoteVisualConfig,
        score: &mut ScoreState,
        timers: &mut TimerSet,
        events: &mut Vec<PlayEvent>,
    ) {
        if self.judge != JudgePhase::Open {
            return;
        }
        timers.set_keyon(self.index, now_us);
        // Feedback fires whether or not anything is judgeable.
        events.push(PlayEvent::Feedback {
            lane: self.index,
            action: InputAction::Press,
        });
        self.judge_front(NoteTrigger::Press, now_us, property, visual, score, timers, events);
    }

    /// Handle a release edge at `now_us`.
    pub(crate) fn on_release(
        &mut self,
        now_us: i64,
        property: &JudgeProperty,
        visual: &NoteVisualConfig,
        score: &mut ScoreState,
        timers: &mut TimerSet,
        events: &mut Vec<PlayEvent>,
    ) {
        if self.judge != JudgePhase::Open {
            return;
        }
        timers.set_keyoff(self.index, now_us);
        events.push(PlayEvent::Feedback {
            lane: self.index,
            action: InputAction::Release,
        });
        self.judge_front(NoteTrigger::Release, now_us, property, visual, score, timers, events);
    }

    /// Judge the queue front, and only it, when its trigger matches.
    #[allow(clippy::too_many_arguments)]
    fn judge_front(
        &mut self,
        trigger: NoteTrigger,
        now_us: i64,
        property: &JudgeProperty,
        visual: &NoteVisualConfig,
        score: &mut ScoreState,
        timers: &mut TimerSet,
        events: &mut Vec<PlayEvent>,
    ) {
        let Some(&front_id) = self.judge_queue.front() else {
            log::trace!("lane {}: input with empty judgment queue", self.index);
            return;
        };
        let Some(note) = self.notes.iter_mut().find(|n| n.id() == front_id) else {
            self.judge_queue.pop_front();
            return;
        };
        if note.trigger() != trigger {
            // The earliest eligible note wants the other edge; nothing to do.
            return;
        }
        self.judge_queue.pop_front();

        let delta_us = now_us - note.time_us();
        let tier = property.classify(delta_us);
        debug_assert!(tier.is_judged(), "queued note judged outside its window");
        note.close_judged(tier, now_us, visual);
        score.record_judged(tier, delta_us);
        timers.set_judge(self.index, now_us);
        log::debug!(
            "lane {} note {} judged {:?} at {}us offset",
            self.index,
            front_id,
            tier,
            delta_us
        );
        events.push(PlayEvent::Judged {
            lane: self.index,
            note: front_id,
            tier,
            delta_us,
        });
    }

    /// Force-close the lane: every note fades out and input is ignored
    /// from here on.
    pub(crate) fn close(&mut self, now_us: i64, visual: &NoteVisualConfig) {
        if self.judge == JudgePhase::Closed {
            return;
        }
        self.judge = JudgePhase::Closed;
        for note in &mut self.notes {
            note.force_close(now_us, visual);
        }
        self.judge_queue.clear();
        self.watch_cursor = self.notes.len();
        if self.lifecycle == LifecyclePhase::Active {
            self.lifecycle = LifecyclePhase::MissFade;
            self.exit_started_us = Some(now_us);
        }
        log::debug!("lane {} closed", self.index);
    }

    fn note_time(&self, id: NoteId) -> i64 {
        self.notes
            .iter()
            .find(|n| n.id() == id)
            .map(|n| n.time_us())
            .unwrap_or(i64::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fermata_rule::JudgeTier;

    fn visual() -> NoteVisualConfig {
        NoteVisualConfig::default()
    }

    fn property() -> JudgeProperty {
        JudgeProperty::default()
    }

    struct Fixture {
        lane: Lane,
        score: ScoreState,
        timers: TimerSet,
        events: Vec<PlayEvent>,
    }

    impl Fixture {
        fn new(times_us: &[i64]) -> Self {
            let notes = times_us
                .iter()
                .enumerate()
                .map(|(i, &t)| ScheduledNote::new(i as NoteId, 0, t, NoteTrigger::Press))
                .collect();
            let mut lane = Lane::new(0, notes);
            lane.activate(0, &visual());
            Self {
                lane,
                score: ScoreState::new(),
                timers: TimerSet::new(1),
                events: Vec::new(),
            }
        }

        fn update(&mut self, now_us: i64) {
            self.lane.update(
                now_us,
                &property(),
                &visual(),
                &mut self.score,
                &mut self.timers,
                &mut self.events,
            );
        }

        fn press(&mut self, now_us: i64) {
            self.lane.on_press(
                now_us,
                &property(),
                &visual(),
                &mut self.score,
                &mut self.timers,
                &mut self.events,
            );
        }

        fn queue_times(&self) -> Vec<i64> {
            self.lane
                .judge_queue()
                .map(|id| self.lane.note_time(id))
                .collect()
        }
    }

    #[test]
    fn windows_open_in_scheduled_order() {
        let mut fx = Fixture::new(&[1_000_000, 1_050_000, 3_000_000]);
        fx.update(950_000);
        assert_eq!(fx.queue_times(), vec![1_000_000, 1_050_000]);

        fx.update(2_900_000);
        // The first two expired; the third is now eligible.
        assert_eq!(fx.queue_times(), vec![3_000_000]);
        let sorted = fx.queue_times().windows(2).all(|w| w[0] <= w[1]);
        assert!(sorted);
    }

    #[test]
    fn press_judges_only_the_queue_front() {
        let mut fx = Fixture::new(&[1_000_000, 1_050_000]);
        fx.update(1_000_000);
        fx.press(1_000_000);

        assert_eq!(fx.score.combo(), 1);
        assert_eq!(fx.score.tier_count(JudgeTier::CriticalPerfect), 1);
        // Second note still queued.
        assert_eq!(fx.queue_times(), vec![1_050_000]);

        fx.press(1_050_000);
        assert_eq!(fx.score.tier_count(JudgeTier::CriticalPerfect), 2);
        assert!(fx.queue_times().is_empty());
    }

    #[test]
    fn press_with_empty_queue_changes_nothing_but_feedback() {
        let mut fx = Fixture::new(&[]);
        fx.update(1_000_000);
        fx.press(1_000_000);

        assert_eq!(fx.score.score(), 0.0);
        assert_eq!(fx.score.combo(), 0);
        assert_eq!(fx.score.max_combo(), 0);
        assert_eq!(fx.score.judged_count(), 0);
        assert!(matches!(fx.events[0], PlayEvent::Feedback { .. }));
        assert_eq!(fx.events.len(), 1);
        // Non-judging feedback still fires.
        assert_eq!(fx.timers.keyon(0), Some(1_000_000));
    }

    #[test]
    fn stale_front_expires_as_a_miss() {
        let mut fx = Fixture::new(&[1_000_000]);
        fx.update(1_000_000);
        fx.update(1_200_000);

        assert!(fx.queue_times().is_empty());
        assert_eq!(fx.score.tier_count(JudgeTier::Miss), 1);
        assert_eq!(fx.score.combo(), 0);
        assert!((fx.score.max_score() - 1.1).abs() < 1e-9);
        assert!(
            fx.events
                .iter()
                .any(|e| matches!(e, PlayEvent::Expired { lane: 0, note: 0 }))
        );
    }

    #[test]
    fn late_press_inside_window_is_a_judged_miss() {
        let mut fx = Fixture::new(&[1_000_000]);
        fx.update(1_000_000);
        fx.press(1_100_000);
        // 100ms late: Miss tier, but judged by the press, not the timeout.
        assert_eq!(fx.score.tier_count(JudgeTier::Miss), 1);
        assert_eq!(fx.score.tier_count_late(JudgeTier::Miss), 1);
        assert_eq!(fx.score.combo(), 0);
    }

    #[test]
    fn release_trigger_front_ignores_presses() {
        let notes = vec![ScheduledNote::new(0, 0, 1_000_000, NoteTrigger::Release)];
        let mut lane = Lane::new(0, notes);
        lane.activate(0, &visual());
        let mut score = ScoreState::new();
        let mut timers = TimerSet::new(1);
        let mut events = Vec::new();

        lane.update(
            1_000_000,
            &property(),
            &visual(),
            &mut score,
            &mut timers,
            &mut events,
        );
        lane.on_press(
            1_000_000,
            &property(),
            &visual(),
            &mut score,
            &mut timers,
            &mut events,
        );
        assert_eq!(score.judged_count(), 0);

        lane.on_release(
            1_000_000,
            &property(),
            &visual(),
            &mut score,
            &mut timers,
            &mut events,
        );
        assert_eq!(score.tier_count(JudgeTier::CriticalPerfect), 1);
    }

    #[test]
    fn judged_and_faded_notes_are_reaped() {
        let mut fx = Fixture::new(&[1_000_000]);
        fx.update(1_000_000);
        fx.press(1_000_000);
        assert_eq!(fx.lane.note_count(), 1);

        // Hit effect runs 200ms, then the note unregisters.
        fx.update(1_300_000);
        assert_eq!(fx.lane.note_count(), 0);
        assert!(
            fx.events
                .iter()
                .any(|e| matches!(e, PlayEvent::NoteDestroyed { lane: 0, note: 0 }))
        );
    }

    #[test]
    fn close_fades_all_notes_and_blocks_input() {
        let mut fx = Fixture::new(&[1_000_000, 2_000_000]);
        fx.update(1_000_000);
        fx.lane.close(1_000_000, &visual());

        assert!(fx.queue_times().is_empty());
        assert_eq!(fx.lane.judge_phase(), JudgePhase::Closed);

        fx.press(1_000_000);
        assert_eq!(fx.score.judged_count(), 0);

        // Everything fades out and unregisters; no misses are scored.
        fx.update(1_400_000);
        assert_eq!(fx.lane.note_count(), 0);
        assert_eq!(fx.score.max_score(), 0.0);
        assert_eq!(fx.lane.lifecycle(), LifecyclePhase::Destroyed);
    }

    #[test]
    fn far_future_notes_stay_pending() {
        let mut fx = Fixture::new(&[10_000_000]);
        fx.update(1_000_000);
        assert!(fx.queue_times().is_empty());
        assert_eq!(fx.lane.notes()[0].judge_phase(), JudgePhase::Pending);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Under any interleaving of frame updates and presses, the
            /// judgment queue stays sorted by scheduled time and every
            /// scheduled event is finalized at most once.
            #[test]
            fn queue_stays_sorted_and_accounting_is_exact(
                mut gaps in proptest::collection::vec(1_000_i64..400_000, 1..12),
                presses in proptest::collection::vec((0_i64..4_000_000, any::<bool>()), 0..24),
            ) {
                let mut t = 500_000_i64;
                let times: Vec<i64> = gaps
                    .drain(..)
                    .map(|gap| {
                        t += gap;
                        t
                    })
                    .collect();
                let total = times.len() as u32;
                let mut fx = Fixture::new(&times);

                let mut presses = presses;
                presses.sort_by_key(|&(at, _)| at);
                for (at, do_press) in presses {
                    fx.update(at);
                    if do_press {
                        fx.press(at);
                    }
                    let queued = fx.queue_times();
                    prop_assert!(queued.windows(2).all(|w| w[0] <= w[1]));
                    prop_assert!(fx.score.judged_count() <= total);
                }

                // Run everything out: each event finalizes exactly once.
                fx.update(t + 1_000_000);
                prop_assert_eq!(fx.score.judged_count(), total);
                let expected_max = f64::from(total) * 1.1;
                prop_assert!((fx.score.max_score() - expected_max).abs() < 1e-6);
            }
        }
    }
}
