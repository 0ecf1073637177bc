//! Motion-loop telemetry
//!
//! The motion loop is the only writer. It bumps the sequence counter to
//! odd, stores every field, then bumps it to even. Readers retry until
//! they see the same even sequence before and after copying, so a
//! snapshot is never a mix of two ticks.

use portable_atomic::{fence, AtomicBool, AtomicI32, AtomicU32, AtomicU8, Ordering};

use crate::state::PecState;
use crate::Axis;

const FLAG_ENABLED: u8 = 1 << 0;
const FLAG_FAULT: u8 = 1 << 1;
const FLAG_BACKLASH: u8 = 1 << 2;
const FLAG_SLEWING: u8 = 1 << 3;
const FLAG_TRACKING: u8 = 1 << 4;
const FLAG_GUIDING: u8 = 1 << 5;

/// Published state of one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisTelemetry {
    pub position: i32,
    pub target: i32,
    pub enabled: bool,
    pub fault: bool,
    pub in_backlash: bool,
    pub slewing: bool,
    pub tracking: bool,
    pub guiding: bool,
    /// Id of the last slew this axis completed
    pub last_slew_id: u8,
}

impl AxisTelemetry {
    fn flags(&self) -> u8 {
        let mut flags = 0;
        for (set, bit) in [
            (self.enabled, FLAG_ENABLED),
            (self.fault, FLAG_FAULT),
            (self.in_backlash, FLAG_BACKLASH),
            (self.slewing, FLAG_SLEWING),
            (self.tracking, FLAG_TRACKING),
            (self.guiding, FLAG_GUIDING),
        ] {
            if set {
                flags |= bit;
            }
        }
        flags
    }

    fn with_flags(mut self, flags: u8) -> Self {
        self.enabled = flags & FLAG_ENABLED != 0;
        self.fault = flags & FLAG_FAULT != 0;
        self.in_backlash = flags & FLAG_BACKLASH != 0;
        self.slewing = flags & FLAG_SLEWING != 0;
        self.tracking = flags & FLAG_TRACKING != 0;
        self.guiding = flags & FLAG_GUIDING != 0;
        self
    }
}

/// Consistent copy of the motion loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetrySnapshot {
    /// Motion-loop ticks since start (wraps)
    pub ticks: u32,
    /// LST counter in 0.01 sidereal seconds
    pub lst: u32,
    /// Calibrated hardware ticks per sidereal second
    pub interval: u32,
    pub pps_synced: bool,
    pub axes: [AxisTelemetry; 2],
    pub pec_state: PecState,
    /// PEC table commit generation
    pub pec_generation: u32,
}

impl TelemetrySnapshot {
    pub fn axis(&self, axis: Axis) -> &AxisTelemetry {
        &self.axes[axis.index()]
    }

    pub fn any_slewing(&self) -> bool {
        self.axes.iter().any(|a| a.slewing)
    }

    pub fn any_fault(&self) -> bool {
        self.axes.iter().any(|a| a.fault)
    }

    pub fn any_guiding(&self) -> bool {
        self.axes.iter().any(|a| a.guiding)
    }

    pub fn positions(&self) -> [i32; 2] {
        [self.axes[0].position, self.axes[1].position]
    }
}

struct AxisCells {
    position: AtomicI32,
    target: AtomicI32,
    flags: AtomicU8,
    last_slew_id: AtomicU8,
}

impl AxisCells {
    const fn new() -> Self {
        Self {
            position: AtomicI32::new(0),
            target: AtomicI32::new(0),
            flags: AtomicU8::new(0),
            last_slew_id: AtomicU8::new(0),
        }
    }
}

/// Seqlock-protected telemetry block
pub struct MotionTelemetry {
    seq: AtomicU32,
    ticks: AtomicU32,
    lst: AtomicU32,
    interval: AtomicU32,
    pps_synced: AtomicBool,
    axes: [AxisCells; 2],
    pec_state: AtomicU8,
    pec_generation: AtomicU32,
}

impl Default for MotionTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionTelemetry {
    /// Empty telemetry (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            seq: AtomicU32::new(0),
            ticks: AtomicU32::new(0),
            lst: AtomicU32::new(0),
            interval: AtomicU32::new(0),
            pps_synced: AtomicBool::new(false),
            axes: [AxisCells::new(), AxisCells::new()],
            pec_state: AtomicU8::new(0),
            pec_generation: AtomicU32::new(0),
        }
    }

    /// Publish a new snapshot; only the motion loop calls this
    pub fn publish(&self, snapshot: &TelemetrySnapshot) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        self.ticks.store(snapshot.ticks, Ordering::Relaxed);
        self.lst.store(snapshot.lst, Ordering::Relaxed);
        self.interval.store(snapshot.interval, Ordering::Relaxed);
        self.pps_synced.store(snapshot.pps_synced, Ordering::Relaxed);
        for (cells, axis) in self.axes.iter().zip(snapshot.axes.iter()) {
            cells.position.store(axis.position, Ordering::Relaxed);
            cells.target.store(axis.target, Ordering::Relaxed);
            cells.flags.store(axis.flags(), Ordering::Relaxed);
            cells.last_slew_id.store(axis.last_slew_id, Ordering::Relaxed);
        }
        self.pec_state.store(snapshot.pec_state as u8, Ordering::Relaxed);
        self.pec_generation
            .store(snapshot.pec_generation, Ordering::Relaxed);

        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Read a consistent snapshot, retrying while a publish is in flight
    pub fn read(&self) -> TelemetrySnapshot {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                core::hint::spin_loop();
                continue;
            }

            let mut snapshot = TelemetrySnapshot {
                ticks: self.ticks.load(Ordering::Relaxed),
                lst: self.lst.load(Ordering::Relaxed),
                interval: self.interval.load(Ordering::Relaxed),
                pps_synced: self.pps_synced.load(Ordering::Relaxed),
                axes: [AxisTelemetry::default(); 2],
                pec_state: PecState::from_u8(self.pec_state.load(Ordering::Relaxed)),
                pec_generation: self.pec_generation.load(Ordering::Relaxed),
            };
            for (cells, axis) in self.axes.iter().zip(snapshot.axes.iter_mut()) {
                *axis = AxisTelemetry {
                    position: cells.position.load(Ordering::Relaxed),
                    target: cells.target.load(Ordering::Relaxed),
                    last_slew_id: cells.last_slew_id.load(Ordering::Relaxed),
                    ..AxisTelemetry::default()
                }
                .with_flags(cells.flags.load(Ordering::Relaxed));
            }

            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return snapshot;
            }
        }
    }

    /// Sequence counter; even when no publish is in flight
    pub fn sequence(&self) -> u32 {
        self.seq.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_read() {
        let telemetry = MotionTelemetry::new();
        let mut snapshot = TelemetrySnapshot {
            ticks: 42,
            lst: 1_234,
            interval: 15_956_313,
            pps_synced: true,
            pec_state: PecState::Recording,
            pec_generation: 3,
            ..Default::default()
        };
        snapshot.axes[1] = AxisTelemetry {
            position: -500,
            target: -400,
            enabled: true,
            slewing: true,
            in_backlash: true,
            last_slew_id: 9,
            ..Default::default()
        };

        telemetry.publish(&snapshot);
        assert_eq!(telemetry.read(), snapshot);
        assert_eq!(telemetry.sequence(), 2);
    }

    #[test]
    fn test_flags_round_trip_each_bit() {
        let axis = AxisTelemetry {
            fault: true,
            guiding: true,
            ..Default::default()
        };
        let restored = AxisTelemetry::default().with_flags(axis.flags());
        assert_eq!(restored, axis);
    }

    #[test]
    fn test_snapshot_helpers() {
        let mut snapshot = TelemetrySnapshot::default();
        assert!(!snapshot.any_slewing());
        snapshot.axes[0].fault = true;
        snapshot.axes[1].position = 7;
        assert!(snapshot.any_fault());
        assert_eq!(snapshot.positions(), [0, 7]);
    }
}
