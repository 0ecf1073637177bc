//! PEC record and playback
//!
//! The engine follows the worm phase from the primary axis position and
//! the index sensor. While recording it sums the guide corrections the
//! autoguider applied within each slot of the worm rotation; while
//! playing it feeds those corrections back as the PEC rate term.
//!
//! A recording starts on an index edge, so the table is phase-aligned
//! with the worm, and completes on the next edge one rotation later.
//! Mounts without a sensor start when armed and complete after exactly
//! one rotation of travel. Re-recording over a valid table blends the
//! new pass into it as `(2 * old + new) / 3`.

use super::buffer::PecBuffer;
use crate::config::PecConfig;
use crate::state::{PecEvent, PecState};

/// PEC state machine driven by the motion loop
pub struct PecEngine<'a> {
    buffer: &'a PecBuffer,
    state: PecState,
    rotation: u32,
    slots: u16,
    steps_per_slot: u32,
    has_index: bool,
    play_after_record: bool,
    last_index: bool,
    /// Worm phase origin (position at the last index edge)
    worm_origin: i32,
    worm_known: bool,
    /// Position when the current record pass was armed or started
    record_start: i32,
    current_slot: Option<u16>,
    accumulated: f64,
    blend: bool,
}

impl<'a> PecEngine<'a> {
    pub fn new(buffer: &'a PecBuffer, cfg: &PecConfig) -> Self {
        let slots = cfg.slots.max(1);
        Self {
            buffer,
            state: PecState::Ignore,
            rotation: cfg.steps_per_worm_rotation.max(1),
            slots,
            steps_per_slot: cfg.steps_per_slot().max(1),
            has_index: cfg.has_index_sensor,
            play_after_record: cfg.play_after_record,
            last_index: false,
            worm_origin: 0,
            // Without a sensor, position zero is the worm origin
            worm_known: !cfg.has_index_sensor,
            record_start: 0,
            current_slot: None,
            accumulated: 0.0,
            blend: false,
        }
    }

    pub fn state(&self) -> PecState {
        self.state
    }

    pub fn buffer(&self) -> &PecBuffer {
        self.buffer
    }

    /// Worm slot for a primary axis position
    pub fn slot_of(&self, position: i32) -> u16 {
        let phase = (position as i64 - self.worm_origin as i64).rem_euclid(self.rotation as i64);
        ((phase as u32 / self.steps_per_slot) as u16).min(self.slots - 1)
    }

    /// Arm a record pass
    pub fn arm_record(&mut self, position: i32) {
        let next = self.state.transition(PecEvent::ArmRecord);
        if next != self.state {
            self.record_start = position;
            info!("PEC record armed");
        }
        self.state = next;
    }

    /// Arm playback; needs a valid table
    pub fn arm_play(&mut self) -> bool {
        if !self.buffer.is_valid() {
            warn!("PEC play refused, no table");
            return false;
        }
        self.state = self.state.transition(PecEvent::ArmPlay);
        self.state == PecState::ReadyToPlay
    }

    /// Stop recording or playback
    pub fn stop(&mut self) {
        self.state = self.state.transition(PecEvent::Stop);
        self.current_slot = None;
    }

    /// Stop and invalidate the table
    pub fn clear(&mut self) {
        self.stop();
        self.buffer.clear();
    }

    /// Run one motion-loop tick and return the PEC rate term
    ///
    /// `guide_steps` is the guide correction just applied to the primary
    /// axis, in steps. The returned rate is in multiples of sidereal.
    pub fn tick(&mut self, position: i32, index_level: bool, guide_steps: f64, tracking: bool) -> f64 {
        let edge = self.has_index && index_level && !self.last_index;
        self.last_index = index_level;

        match self.state {
            PecState::Ignore => {
                self.note_index(edge, position);
                0.0
            }
            PecState::ReadyToRecord => {
                if tracking && (edge || !self.has_index) {
                    self.begin_recording(position);
                    self.record(position, false, guide_steps);
                } else {
                    let waited = (position as i64 - self.record_start as i64).unsigned_abs();
                    if waited > self.rotation as u64 {
                        self.abandon("index not seen");
                    }
                    self.note_index(edge, position);
                }
                0.0
            }
            PecState::Recording => {
                if !tracking {
                    self.abandon("tracking stopped");
                } else {
                    self.record(position, edge, guide_steps);
                }
                0.0
            }
            PecState::ReadyToPlay => {
                self.note_index(edge, position);
                if tracking && self.worm_known {
                    self.state = self.state.transition(PecEvent::IndexSensed);
                    debug!("PEC playing");
                    self.play(position)
                } else {
                    0.0
                }
            }
            PecState::Playing => {
                self.note_index(edge, position);
                if tracking {
                    self.play(position)
                } else {
                    self.state = self.state.transition(PecEvent::Suspend);
                    0.0
                }
            }
        }
    }

    fn note_index(&mut self, edge: bool, position: i32) {
        if edge {
            self.worm_origin = position;
            self.worm_known = true;
        }
    }

    fn play(&self, position: i32) -> f64 {
        let value = self.buffer.read(self.slot_of(position) as usize);
        value as f64 / self.steps_per_slot as f64
    }

    fn begin_recording(&mut self, position: i32) {
        self.state = self.state.transition(PecEvent::IndexSensed);
        self.worm_origin = position;
        self.worm_known = true;
        self.record_start = position;
        self.current_slot = None;
        self.accumulated = 0.0;
        self.blend = self.buffer.is_valid();
        self.prime_staging();
        info!("PEC recording");
    }

    fn record(&mut self, position: i32, edge: bool, guide_steps: f64) {
        let traveled = (position as i64 - self.record_start as i64).unsigned_abs();
        let rotation = self.rotation as u64;
        let slot_steps = self.steps_per_slot as u64;

        let complete = if self.has_index {
            edge && traveled + slot_steps >= rotation
        } else {
            traveled >= rotation
        };
        if complete {
            self.flush();
            self.buffer.commit();
            self.current_slot = None;
            self.worm_origin = position;
            self.state = self.state.transition(PecEvent::RecordComplete {
                then_play: self.play_after_record,
            });
            info!("PEC table committed");
            return;
        }

        if traveled > rotation + slot_steps {
            self.abandon("second index not seen");
            return;
        }

        let slot = self.slot_of(position);
        if self.current_slot != Some(slot) {
            self.flush();
            self.current_slot = Some(slot);
            self.accumulated = 0.0;
        }
        self.accumulated += guide_steps;
    }

    /// Seed every staging slot with the value an empty pass would give
    ///
    /// An index edge may complete the pass before the last slot is reached;
    /// that slot must not keep a table from an earlier commit.
    fn prime_staging(&self) {
        for slot in 0..self.slots as usize {
            let value = if self.blend {
                libm::round(2.0 * self.buffer.read(slot) as f64 / 3.0) as i8
            } else {
                0
            };
            self.buffer.stage(slot, value);
        }
    }

    /// Write the accumulated correction into the staging table
    fn flush(&mut self) {
        let Some(slot) = self.current_slot else {
            return;
        };
        let slot = slot as usize;
        let mut value = libm::round(self.accumulated);
        if self.blend {
            value = libm::round((2.0 * self.buffer.read(slot) as f64 + value) / 3.0);
        }
        self.buffer.stage(slot, value.clamp(i8::MIN as f64, i8::MAX as f64) as i8);
    }

    fn abandon(&mut self, reason: &'static str) {
        warn!("PEC record abandoned: {}", reason);
        self.state = self.state.transition(PecEvent::RecordAbandoned);
        self.current_slot = None;
        self.accumulated = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(has_index_sensor: bool) -> PecConfig {
        PecConfig {
            steps_per_worm_rotation: 400,
            slots: 40,
            has_index_sensor,
            play_after_record: false,
        }
    }

    /// Track forward one step per tick with the index high at `index_at`
    fn run(
        engine: &mut PecEngine,
        from: i32,
        to: i32,
        index_at: &[i32],
        guide: impl Fn(i32) -> f64,
    ) -> i32 {
        for pos in from..to {
            let index = index_at.contains(&pos);
            engine.tick(pos, index, guide(pos), true);
        }
        to
    }

    #[test]
    fn test_record_full_rotation() {
        let buffer = PecBuffer::new();
        let mut engine = PecEngine::new(&buffer, &config(true));
        engine.arm_record(0);
        assert_eq!(engine.state(), PecState::ReadyToRecord);

        // Index at 50 starts, index at 450 completes
        run(&mut engine, 0, 50, &[50, 450], |_| 0.0);
        assert_eq!(engine.state(), PecState::ReadyToRecord);
        run(&mut engine, 50, 451, &[50, 450], |_| 0.1);

        assert_eq!(engine.state(), PecState::Ignore);
        assert!(buffer.is_valid());
        // Ten steps per slot, 0.1 step of guiding per step
        for slot in 0..40 {
            assert_eq!(buffer.read(slot), 1, "slot {}", slot);
        }
    }

    #[test]
    fn test_missing_second_index_abandons() {
        let buffer = PecBuffer::new();
        let mut engine = PecEngine::new(&buffer, &config(true));
        engine.arm_record(0);
        run(&mut engine, 0, 1_000, &[10], |_| 0.1);
        assert_eq!(engine.state(), PecState::Ignore);
        assert!(!buffer.is_valid());
    }

    #[test]
    fn test_index_never_seen_abandons_armed_record() {
        let buffer = PecBuffer::new();
        let mut engine = PecEngine::new(&buffer, &config(true));
        engine.arm_record(0);
        run(&mut engine, 0, 402, &[], |_| 0.0);
        assert_eq!(engine.state(), PecState::Ignore);
    }

    #[test]
    fn test_no_sensor_records_one_rotation() {
        let buffer = PecBuffer::new();
        let mut cfg = config(false);
        cfg.play_after_record = true;
        let mut engine = PecEngine::new(&buffer, &cfg);
        engine.arm_record(7);
        run(&mut engine, 7, 408, &[], |pos| if pos < 207 { 0.2 } else { -0.2 });
        assert_eq!(engine.state(), PecState::ReadyToPlay);
        assert_eq!(buffer.read(0), 2);
        assert_eq!(buffer.read(39), -2);
    }

    #[test]
    fn test_rerecord_blends() {
        let buffer = PecBuffer::new();
        buffer.load(&[3; 40]);
        let mut engine = PecEngine::new(&buffer, &config(false));
        engine.arm_record(0);
        run(&mut engine, 0, 401, &[], |_| 0.0);
        // (2 * 3 + 0) / 3
        assert_eq!(buffer.read(5), 2);
    }

    #[test]
    fn test_early_index_leaves_no_stale_slot() {
        let buffer = PecBuffer::new();
        buffer.load(&[5; 40]);
        buffer.load(&[9; 40]);
        let mut engine = PecEngine::new(&buffer, &config(true));
        engine.arm_record(0);

        // Second edge one slot short of a full rotation
        run(&mut engine, 0, 441, &[50, 440], |_| 0.0);
        assert_eq!(engine.state(), PecState::Ignore);
        assert!(buffer.is_valid());
        for slot in 0..40 {
            // (2 * 9 + 0) / 3
            assert_eq!(buffer.read(slot), 6, "slot {}", slot);
        }
    }

    #[test]
    fn test_playback_rate() {
        let buffer = PecBuffer::new();
        let mut values = [0i8; 40];
        values[2] = 5;
        buffer.load(&values);
        let mut engine = PecEngine::new(&buffer, &config(true));
        assert!(engine.arm_play());

        // Phase unknown until the index is seen
        assert_eq!(engine.tick(0, false, 0.0, true), 0.0);
        assert_eq!(engine.state(), PecState::ReadyToPlay);
        engine.tick(100, true, 0.0, true);
        assert_eq!(engine.state(), PecState::Playing);
        // Slot 2 covers 20..30 steps past the index
        assert_eq!(engine.tick(125, true, 0.0, true), 0.5);
        assert_eq!(engine.tick(135, false, 0.0, true), 0.0);

        engine.tick(136, false, 0.0, false);
        assert_eq!(engine.state(), PecState::ReadyToPlay);
        // Phase is still known after a suspend
        engine.tick(125, false, 0.0, true);
        assert_eq!(engine.state(), PecState::Playing);
    }

    #[test]
    fn test_play_needs_table() {
        let buffer = PecBuffer::new();
        let mut engine = PecEngine::new(&buffer, &config(true));
        assert!(!engine.arm_play());
        assert_eq!(engine.state(), PecState::Ignore);
    }

    #[test]
    fn test_stop_and_clear() {
        let buffer = PecBuffer::new();
        buffer.load(&[1; 40]);
        let mut engine = PecEngine::new(&buffer, &config(true));
        engine.arm_play();
        engine.stop();
        assert_eq!(engine.state(), PecState::Ignore);
        engine.clear();
        assert!(!buffer.is_valid());
    }
}
