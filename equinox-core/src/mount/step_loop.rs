//! High-rate motion loop
//!
//! Runs once per control period (`tick_period` hardware ticks) from the
//! motion task. It owns every [`AxisMotionController`], the sidereal
//! clock, the guide overlay and the PEC engine, and is the only writer
//! of step positions. Nothing in here blocks or allocates: commands
//! arrive through the spsc queue and state leaves through the seqlock
//! telemetry block.

use crate::config::MountConfig;
use crate::guide::GuideOverlay;
use crate::motion::{AxisMode, AxisMotionController, RateKind};
use crate::pec::{PecBuffer, PecEngine};
use crate::shared::{AxisTelemetry, CommandConsumer, MotionCommand, MotionTelemetry, TelemetrySnapshot};
use crate::time::SiderealClock;
use crate::traits::StepperDriver;
use crate::Axis;

/// Inputs sampled by the motion task before each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickInputs {
    /// Worm index sensor level
    pub index_sensor: bool,
}

/// Motion loop state
pub struct MotionLoop<'a, D: StepperDriver> {
    axes: [AxisMotionController<D>; 2],
    clock: SiderealClock,
    guide: GuideOverlay,
    pec: PecEngine<'a>,
    commands: CommandConsumer<'a>,
    telemetry: &'a MotionTelemetry,
    tick_period: u32,
    ticks: u32,
}

impl<'a, D: StepperDriver> MotionLoop<'a, D> {
    pub fn new(
        config: &MountConfig,
        drivers: [D; 2],
        commands: CommandConsumer<'a>,
        telemetry: &'a MotionTelemetry,
        pec_buffer: &'a PecBuffer,
    ) -> Self {
        let tps = config.ticks_per_second();
        let [primary, secondary] = drivers;
        let mut axes = [
            AxisMotionController::new(Axis::Primary, primary, &config.axis1, tps),
            AxisMotionController::new(Axis::Secondary, secondary, &config.axis2, tps),
        ];
        for axis in axes.iter_mut() {
            for kind in RateKind::ALL {
                axis.set_term_enabled(kind, true);
            }
        }

        let motion = Self {
            axes,
            clock: SiderealClock::new(config.steps_per_degree()),
            guide: GuideOverlay::new(),
            pec: PecEngine::new(pec_buffer, &config.pec),
            commands,
            telemetry,
            tick_period: config.tick_period,
            ticks: 0,
        };
        motion.publish();
        motion
    }

    pub fn axis(&self, axis: Axis) -> &AxisMotionController<D> {
        &self.axes[axis.index()]
    }

    pub fn clock(&self) -> &SiderealClock {
        &self.clock
    }

    pub fn pec(&self) -> &PecEngine<'a> {
        &self.pec
    }

    pub fn guide(&self) -> &GuideOverlay {
        &self.guide
    }

    /// Run one control period
    pub fn tick(&mut self, inputs: TickInputs) {
        while let Some(command) = self.commands.dequeue() {
            self.apply(command);
        }

        self.clock.advance(self.tick_period);
        let sidereal_steps = Axis::ALL.map(|axis| self.clock.steps_per_period(axis, self.tick_period));

        let guide = self.guide.tick();
        for (axis, rate) in self.axes.iter_mut().zip(guide) {
            axis.set_guide_rate(rate);
        }

        let primary = &self.axes[0];
        let pec_rate = self.pec.tick(
            primary.position(),
            inputs.index_sensor,
            guide[0] * sidereal_steps[0],
            primary.mode() == AxisMode::Tracking,
        );
        self.axes[0].set_pec_rate(pec_rate);

        for (axis, steps) in self.axes.iter_mut().zip(sidereal_steps) {
            axis.tick(steps);
        }

        self.ticks = self.ticks.wrapping_add(1);
        self.publish();
    }

    fn apply(&mut self, command: MotionCommand) {
        match command {
            MotionCommand::SetTarget {
                axis,
                steps,
                slew_id,
            } => {
                if let Err(e) = self.axes[axis.index()].set_target(steps, slew_id) {
                    warn!("axis {} refused slew {}: {}", axis.index(), slew_id, e);
                }
            }
            MotionCommand::Abort => {
                for axis in self.axes.iter_mut() {
                    axis.abort();
                }
            }
            MotionCommand::SetTracking(on) => {
                for axis in self.axes.iter_mut() {
                    axis.set_tracking(on);
                }
            }
            MotionCommand::SetRate { axis, kind, value } => {
                self.axes[axis.index()].set_rate(kind, value);
            }
            MotionCommand::EnableRate {
                axis,
                kind,
                enabled,
            } => {
                self.axes[axis.index()].set_term_enabled(kind, enabled);
            }
            MotionCommand::EnableAxes(on) => {
                for axis in self.axes.iter_mut() {
                    axis.set_enabled(on);
                }
            }
            MotionCommand::Guide { axis, dir, rate_x } => {
                self.guide.start_guide(axis, dir, rate_x);
            }
            MotionCommand::PulseGuide {
                axis,
                dir,
                rate_x,
                ticks,
            } => {
                self.guide.start_pulse_guide(axis, dir, rate_x, ticks);
            }
            MotionCommand::StopGuide(Some(axis)) => self.guide.stop_guide(axis),
            MotionCommand::StopGuide(None) => self.guide.stop_all(),
            MotionCommand::PecArmRecord => {
                self.pec.arm_record(self.axes[0].position());
                self.axes[0].set_pec_rate(0.0);
            }
            MotionCommand::PecArmPlay => {
                if !self.pec.arm_play() {
                    warn!("PEC play refused, no valid table");
                }
            }
            MotionCommand::PecStop => {
                self.pec.stop();
                self.axes[0].set_pec_rate(0.0);
            }
            MotionCommand::PecClear => {
                self.pec.clear();
                self.axes[0].set_pec_rate(0.0);
            }
            MotionCommand::PpsPulse(micros) => {
                self.clock.calibrate(micros);
            }
            MotionCommand::PpsLost => self.clock.desync(),
            MotionCommand::SetInterval(delta) => self.clock.set_interval(delta),
            MotionCommand::AdjustInterval(by) => self.clock.adjust_interval(by),
            MotionCommand::ClearFault(axis) => {
                if !self.axes[axis.index()].clear_fault() {
                    warn!("axis {} driver still faulted", axis.index());
                }
            }
        }
    }

    /// Current state as a telemetry snapshot
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let axes = Axis::ALL.map(|axis| {
            let controller = &self.axes[axis.index()];
            AxisTelemetry {
                position: controller.position(),
                target: controller.target().floor(),
                enabled: controller.is_enabled(),
                fault: controller.is_faulted(),
                in_backlash: controller.in_backlash(),
                slewing: controller.is_slewing(),
                tracking: controller.is_tracking(),
                guiding: self.guide.is_guiding(axis),
                last_slew_id: controller.last_slew_id(),
            }
        });
        TelemetrySnapshot {
            ticks: self.ticks,
            lst: self.clock.lst().value(),
            interval: self.clock.interval(),
            pps_synced: self.clock.is_disciplined(),
            axes,
            pec_state: self.pec.state(),
            pec_generation: self.pec.buffer().generation(),
        }
    }

    fn publish(&self) {
        self.telemetry.publish(&self.snapshot());
    }
}
