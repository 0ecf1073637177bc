//! Control-context façade
//!
//! [`Mount`] is the surface the command layer drives. It owns the goto
//! coordinator, the safety monitor and the runtime settings, converts
//! between sky coordinates and axis steps, and forwards everything that
//! touches the axes to the motion loop as [`MotionCommand`]s. It reads
//! axis state back only through the telemetry block and never writes a
//! position.
//!
//! Every operation either succeeds or returns an error with no side
//! effect. Operations that send several commands check for queue room
//! before changing any state.

use crate::config::{MountConfig, MountSettings, ParkPosition, PecRecord, SiteConfig, MAX_PEC_SLOTS};
use crate::goto::kinematics::{equatorial_to_horizon, wrap_180};
use crate::goto::{
    GotoContext, GotoCoordinator, GotoTarget, MountKind, SlewLeg, SlewPlan, SlewProgress,
    SlewPurpose,
};
use crate::guide::{GuideDirection, GuideRate};
use crate::motion::{compensation_rates, RateCompensationMode, RateKind, TrackingRate};
use crate::pec::PecBuffer;
use crate::safety::{Pointing, SafetyMonitor, SafetyStatus};
use crate::shared::{CommandProducer, MotionCommand, MotionTelemetry, TelemetrySnapshot};
use crate::state::{
    CommandError, ErrorCode, GotoError, MeridianFlipPolicy, ParkState, PecState, PierSide,
    PreferredPierSide, TrackingState,
};
use crate::status::StatusSnapshot;
use crate::time::{
    SiderealTick, HW_TICKS_PER_SECOND, LST_TICKS_PER_SIDEREAL_SECOND, NOMINAL_SIDEREAL_INTERVAL,
};
use crate::Axis;

/// Queue slots a control cycle needs before it advances a slew
const SLEW_RESERVE: usize = 3;

/// Rate change below which no update is sent (multiples of sidereal)
const RATE_EPSILON: f64 = 1e-7;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Degrees of hour angle per sidereal second
const DEG_PER_SIDEREAL_SECOND: f64 = 1.0 / 240.0;

/// Control-context mount state
pub struct Mount<'a> {
    config: MountConfig,
    commands: CommandProducer<'a>,
    telemetry: &'a MotionTelemetry,
    pec_buffer: &'a PecBuffer,
    coordinator: GotoCoordinator,
    safety: SafetyMonitor,
    settings: MountSettings,
    settings_dirty: bool,
    pec_generation: u32,
    pec_dirty: bool,
    last_error: ErrorCode,
    last_goto_error: Option<GotoError>,
    snapshot: TelemetrySnapshot,
    pointing: Pointing,
    /// LST counter value and sidereal time in hours at that value
    lst_epoch: (SiderealTick, f64),
    /// LST counter when the active goto was planned
    goto_epoch: SiderealTick,
    guide_rate: GuideRate,
    pulse_rate: GuideRate,
    /// Last tracking and compensation rates sent, per axis
    sent_rates: [[Option<f64>; 2]; 2],
}

impl<'a> Mount<'a> {
    /// Create the control state from the static configuration and the
    /// persisted settings (or their compiled defaults)
    ///
    /// Motor positions start at zero, which is taken to be the park
    /// position when the settings say the mount was parked and the home
    /// position otherwise.
    pub fn new(
        mut config: MountConfig,
        mut settings: MountSettings,
        commands: CommandProducer<'a>,
        telemetry: &'a MotionTelemetry,
        pec_buffer: &'a PecBuffer,
    ) -> Self {
        config.site = settings.site;
        config.meridian_flip = settings.meridian_flip;
        config.preferred_pier_side = settings.preferred_pier_side;
        config.rate_compensation = settings.rate_compensation;
        config.pause_at_home = settings.pause_at_home;
        config.auto_meridian_flip = settings.auto_meridian_flip;

        // Step zero is wherever the mount sat at power-up
        settings.index_deg = match settings.park {
            Some(park) if settings.parked => park.axis_deg,
            _ => config.home_deg,
        };

        let mut coordinator = GotoCoordinator::new(&config);
        coordinator.restore_parked(settings.parked);

        let snapshot = telemetry.read();
        let mut mount = Self {
            safety: SafetyMonitor::new(&config),
            guide_rate: config.guide.rate,
            pulse_rate: config.guide.pulse_rate,
            config,
            commands,
            telemetry,
            pec_buffer,
            coordinator,
            settings,
            settings_dirty: false,
            pec_generation: pec_buffer.generation(),
            pec_dirty: false,
            last_error: ErrorCode::None,
            last_goto_error: None,
            snapshot,
            pointing: Pointing::default(),
            lst_epoch: (SiderealTick::new(snapshot.lst), 0.0),
            goto_epoch: SiderealTick::default(),
            sent_rates: [[None; 2]; 2],
        };
        mount.pointing = mount.pointing_of(&snapshot);
        mount
    }

    /// Push the persisted clock calibration and the power state to the
    /// motion loop
    pub fn start(&mut self) -> Result<(), CommandError> {
        self.ensure_room(2)?;
        self.send(MotionCommand::SetInterval(self.settings.sidereal_interval_delta))?;
        let parked = self.coordinator.park_state().blocks_motion();
        self.send(MotionCommand::EnableAxes(!parked))?;
        info!(
            "mount started, interval delta {}, parked {}",
            self.settings.sidereal_interval_delta,
            parked
        );
        Ok(())
    }

    pub fn config(&self) -> &MountConfig {
        &self.config
    }

    pub fn tracking(&self) -> TrackingState {
        self.coordinator.tracking()
    }

    pub fn park_state(&self) -> ParkState {
        self.coordinator.park_state()
    }

    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    /// Where the mount pointed at the last poll
    pub fn pointing(&self) -> Pointing {
        self.pointing
    }

    /// Run one control cycle
    ///
    /// Reads the telemetry, advances any slew, evaluates the safety
    /// limits and refreshes the tracking and compensation rates.
    pub fn poll(&mut self) {
        let snapshot = self.refresh();

        if snapshot.pec_generation != self.pec_generation {
            self.pec_generation = snapshot.pec_generation;
            self.pec_dirty = true;
            info!("PEC table generation {}", snapshot.pec_generation);
        }

        if let Err(e) = self.advance_slew(&snapshot) {
            debug!("slew update deferred: {}", e);
        }
        if let Err(e) = self.check_safety(&snapshot) {
            debug!("safety action deferred: {}", e);
        }
        if let Err(e) = self.update_rates() {
            debug!("rate update deferred: {}", e);
        }
    }

    fn advance_slew(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), CommandError> {
        if !self.coordinator.is_slewing() {
            return Ok(());
        }
        self.ensure_room(SLEW_RESERVE)?;

        match self.coordinator.poll(snapshot) {
            SlewProgress::Idle | SlewProgress::Moving | SlewProgress::PausedAtHome => Ok(()),
            SlewProgress::Issue(leg, slew_id) => self.issue(leg, slew_id),
            SlewProgress::Completed(purpose) => {
                info!("slew complete: {}", purpose);
                let tracking = self.coordinator.tracking() == TrackingState::Sidereal;
                self.send(MotionCommand::SetTracking(tracking))?;
                if purpose == SlewPurpose::Park {
                    self.settings.parked = true;
                    self.settings_dirty = true;
                    self.send(MotionCommand::EnableAxes(false))?;
                }
                Ok(())
            }
            SlewProgress::Failed(code) => {
                self.raise(code);
                self.send(MotionCommand::Abort)?;
                self.send(MotionCommand::SetTracking(false))
            }
        }
    }

    fn check_safety(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), CommandError> {
        self.safety.update_motor_fault(snapshot.any_fault());
        self.safety.update_pointing(self.pointing);

        let tracking = self.coordinator.tracking() == TrackingState::Sidereal;
        let check_pointing = tracking || self.coordinator.purpose() == Some(SlewPurpose::Goto);
        let SafetyStatus::Fault(code) = self.safety.check(check_pointing) else {
            return Ok(());
        };

        if code == ErrorCode::Meridian {
            // Meridian limits bind tracking only
            if !tracking || self.auto_flip() {
                return Ok(());
            }
        }

        if self.coordinator.is_slewing() {
            self.ensure_room(2)?;
            let code = self.coordinator.fail(code);
            self.raise(code);
            self.send(MotionCommand::Abort)?;
            self.send(MotionCommand::SetTracking(false))
        } else if tracking {
            self.ensure_room(1)?;
            self.raise(code);
            self.coordinator.set_tracking(false)?;
            self.send(MotionCommand::SetTracking(false))
        } else {
            self.raise(code);
            Ok(())
        }
    }

    /// Flip to the other pier side at the current sky position
    fn auto_flip(&mut self) -> bool {
        if !self.config.auto_meridian_flip || self.config.kind != MountKind::GermanEquatorial {
            return false;
        }
        let target = GotoTarget {
            ha_deg: self.pointing.ha_deg,
            dec_deg: self.pointing.dec_deg,
        };
        match self.goto_on_side(target, Some(self.pointing.side.opposite())) {
            Ok(()) => {
                info!("automatic meridian flip");
                true
            }
            Err(e) => {
                warn!("automatic meridian flip refused: {}", e);
                false
            }
        }
    }

    fn update_rates(&mut self) -> Result<(), CommandError> {
        let p = self.pointing;
        let latitude = self.config.site.latitude_deg;

        let multiplier = self.config.tracking_rate.multiplier();
        let tracking = self
            .config
            .kind
            .tracking_rates(p.ha_deg, p.dec_deg, p.side, latitude)
            .map(|rate| rate * multiplier);
        let correction = compensation_rates(
            self.config.rate_compensation,
            p.ha_deg,
            p.dec_deg,
            latitude,
            &self.config.pointing,
        );
        let compensation = self.config.kind.axis_rate_correction(
            correction,
            p.ha_deg,
            p.dec_deg,
            p.side,
            latitude,
        );

        for axis in Axis::ALL {
            let i = axis.index();
            let terms = [
                (RateKind::Tracking, tracking[i]),
                (RateKind::Compensation, compensation[i]),
            ];
            for (slot, (kind, value)) in terms.into_iter().enumerate() {
                let stale = match self.sent_rates[i][slot] {
                    Some(sent) => libm::fabs(sent - value) > RATE_EPSILON,
                    None => true,
                };
                if stale {
                    self.send(MotionCommand::SetRate { axis, kind, value })?;
                    self.sent_rates[i][slot] = Some(value);
                }
            }
        }
        Ok(())
    }

    fn raise(&mut self, code: ErrorCode) {
        if self.last_error != code {
            error!("mount error {}", code);
        }
        self.last_error = code;
    }

    // Goto, park and home

    /// Slew to an hour angle and declination
    pub fn goto(&mut self, target: GotoTarget) -> Result<(), CommandError> {
        self.goto_on_side(target, None)
    }

    /// Slew to a right ascension (hours) and declination
    pub fn goto_ra_dec(&mut self, ra_hours: f64, dec_deg: f64) -> Result<(), CommandError> {
        self.refresh();
        let target = GotoTarget {
            ha_deg: self.hour_angle_of(ra_hours),
            dec_deg,
        };
        self.goto(target)
    }

    fn goto_on_side(
        &mut self,
        target: GotoTarget,
        side: Option<PierSide>,
    ) -> Result<(), CommandError> {
        let snapshot = self.refresh();
        let ctx = GotoContext {
            config: &self.config,
            telemetry: &snapshot,
            axes_deg: self.pointing.axes_deg,
        };
        let plan = match self.coordinator.plan_goto(target, side, &ctx) {
            Ok(plan) => plan,
            Err(e) => return Err(self.reject(e)),
        };
        self.goto_epoch = SiderealTick::new(snapshot.lst);
        self.begin(plan)?;
        self.last_goto_error = None;
        Ok(())
    }

    fn reject(&mut self, e: GotoError) -> CommandError {
        warn!("slew rejected: {}", e);
        self.last_goto_error = Some(e);
        e.into()
    }

    fn begin(&mut self, plan: SlewPlan) -> Result<(), CommandError> {
        self.ensure_room(SLEW_RESERVE)?;
        let purpose = plan.purpose();
        let Some((leg, slew_id)) = self.coordinator.begin(plan) else {
            return Err(CommandError::InvalidState);
        };
        if purpose != SlewPurpose::Goto {
            self.send(MotionCommand::SetTracking(false))?;
        }
        self.issue(leg, slew_id)
    }

    /// Send the axis targets of one leg
    fn issue(&mut self, leg: SlewLeg, slew_id: u8) -> Result<(), CommandError> {
        let axes_deg = match leg.sky {
            Some(target) => {
                // The sky has turned since the goto was planned
                let elapsed = SiderealTick::new(self.snapshot.lst).since(self.goto_epoch) as f64
                    / LST_TICKS_PER_SIDEREAL_SECOND as f64;
                self.config.kind.to_axes(
                    target.ha_deg + elapsed * DEG_PER_SIDEREAL_SECOND,
                    target.dec_deg,
                    leg.side,
                    self.config.site.latitude_deg,
                )
            }
            None => leg.axes_deg,
        };
        let steps = self.steps_of(axes_deg);
        for axis in Axis::ALL {
            self.send(MotionCommand::SetTarget {
                axis,
                steps: steps[axis.index()],
                slew_id,
            })?;
        }
        Ok(())
    }

    /// Abort the active goto, park or home slew
    pub fn abort_slew(&mut self) -> Result<(), CommandError> {
        self.ensure_room(2)?;
        self.coordinator.abort()?;
        self.send(MotionCommand::Abort)?;
        let tracking = self.coordinator.tracking() == TrackingState::Sidereal;
        self.send(MotionCommand::SetTracking(tracking))
    }

    /// Slew to the saved park position (home if none) and power down
    pub fn park(&mut self) -> Result<(), CommandError> {
        let snapshot = self.refresh();
        let (axes_deg, side) = match self.settings.park {
            Some(park) => (park.axis_deg, park.pier_side),
            None => (
                self.config.home_deg,
                self.config.kind.side_of_axes(self.config.home_deg),
            ),
        };
        let ctx = GotoContext {
            config: &self.config,
            telemetry: &snapshot,
            axes_deg: self.pointing.axes_deg,
        };
        let plan = match self.coordinator.plan_park(axes_deg, side, &ctx) {
            Ok(plan) => plan,
            Err(e) => return Err(self.reject(e)),
        };
        self.begin(plan)
    }

    pub fn unpark(&mut self) -> Result<(), CommandError> {
        self.ensure_room(1)?;
        self.coordinator.unpark()?;
        self.settings.parked = false;
        self.settings_dirty = true;
        self.send(MotionCommand::EnableAxes(true))
    }

    /// Store the current position as the park position
    pub fn set_park(&mut self) -> Result<(), CommandError> {
        self.refresh();
        if self.coordinator.is_slewing()
            || self.snapshot.any_slewing()
            || self.coordinator.park_state() != ParkState::NotParked
        {
            return Err(CommandError::InvalidState);
        }
        self.settings.park = Some(ParkPosition {
            axis_deg: self.pointing.axes_deg,
            pier_side: self.pointing.side,
        });
        self.settings_dirty = true;
        Ok(())
    }

    /// Clear a failed park back to NotParked
    pub fn reset_park(&mut self) -> Result<(), CommandError> {
        if self.coordinator.reset_park() {
            Ok(())
        } else {
            Err(CommandError::InvalidState)
        }
    }

    /// Slew to the home position
    pub fn request_home(&mut self) -> Result<(), CommandError> {
        let snapshot = self.refresh();
        let ctx = GotoContext {
            config: &self.config,
            telemetry: &snapshot,
            axes_deg: self.pointing.axes_deg,
        };
        let plan = match self.coordinator.plan_home(&ctx) {
            Ok(plan) => plan,
            Err(e) => return Err(self.reject(e)),
        };
        self.begin(plan)
    }

    /// Continue a meridian flip held at home; the next poll issues the
    /// remaining leg
    pub fn release_home_pause(&mut self) -> Result<(), CommandError> {
        if self.coordinator.release_home_pause() {
            Ok(())
        } else {
            Err(CommandError::InvalidState)
        }
    }

    // Sync

    /// Re-index the axes so the current position reads as `target`
    ///
    /// The pier side is kept.
    pub fn sync(&mut self, target: GotoTarget) -> Result<(), CommandError> {
        let snapshot = self.refresh();
        if self.coordinator.is_slewing()
            || snapshot.any_slewing()
            || self.coordinator.park_state().blocks_motion()
        {
            return Err(ErrorCode::Sync.into());
        }

        let kind = self.config.kind;
        let side = self.pointing.side;
        if !kind.reachable(target.ha_deg, side, &self.config.limits) {
            return Err(ErrorCode::Sync.into());
        }
        let axes_deg = kind.to_axes(
            target.ha_deg,
            target.dec_deg,
            side,
            self.config.site.latitude_deg,
        );
        if !self.config.within_travel(axes_deg) {
            return Err(ErrorCode::Sync.into());
        }

        let spd = self.config.steps_per_degree();
        let positions = snapshot.positions();
        for i in 0..2 {
            self.settings.index_deg[i] = axes_deg[i] - positions[i] as f64 / spd[i];
        }
        self.settings_dirty = true;
        self.pointing = self.pointing_of(&snapshot);
        info!("synced to ha {} dec {}", target.ha_deg, target.dec_deg);
        Ok(())
    }

    pub fn sync_ra_dec(&mut self, ra_hours: f64, dec_deg: f64) -> Result<(), CommandError> {
        self.refresh();
        let target = GotoTarget {
            ha_deg: self.hour_angle_of(ra_hours),
            dec_deg,
        };
        self.sync(target)
    }

    // Tracking

    pub fn start_tracking(&mut self) -> Result<(), CommandError> {
        self.ensure_room(1)?;
        self.coordinator.set_tracking(true)?;
        self.send(MotionCommand::SetTracking(true))
    }

    pub fn stop_tracking(&mut self) -> Result<(), CommandError> {
        self.ensure_room(1)?;
        self.coordinator.set_tracking(false)?;
        self.send(MotionCommand::SetTracking(false))
    }

    pub fn set_tracking_rate(&mut self, rate: TrackingRate) {
        self.config.tracking_rate = rate;
    }

    pub fn set_rate_compensation(&mut self, mode: RateCompensationMode) {
        self.config.rate_compensation = mode;
        self.settings.rate_compensation = mode;
        self.settings_dirty = true;
    }

    /// Power the axis drivers on or off
    pub fn enable_axes(&mut self, enabled: bool) -> Result<(), CommandError> {
        if self.coordinator.is_slewing() || self.coordinator.park_state().blocks_motion() {
            return Err(CommandError::InvalidState);
        }
        self.send(MotionCommand::EnableAxes(enabled))
    }

    // Guiding

    pub fn guide_rate(&self) -> GuideRate {
        self.guide_rate
    }

    pub fn set_guide_rate(&mut self, rate: GuideRate) {
        self.guide_rate = rate;
    }

    pub fn set_pulse_guide_rate(&mut self, rate: GuideRate) {
        self.pulse_rate = rate;
    }

    /// Guide at the manual guide rate until stopped
    pub fn guide(&mut self, dir: GuideDirection) -> Result<(), CommandError> {
        self.guide_until_stopped(dir, self.guide_rate)
    }

    /// Guide at the pulse-guide rate while an ST4 line is held
    pub fn st4_guide(&mut self, dir: GuideDirection) -> Result<(), CommandError> {
        self.guide_until_stopped(dir, self.pulse_rate)
    }

    fn guide_until_stopped(&mut self, dir: GuideDirection, rate: GuideRate) -> Result<(), CommandError> {
        self.guide_ready()?;
        let (axis, direction) = dir.resolve(self.pointing.side);
        let rate_x = rate.multiplier(self.max_rate_x(axis));
        self.send(MotionCommand::Guide {
            axis,
            dir: direction,
            rate_x,
        })
    }

    /// Guide at the pulse-guide rate for `duration_ms` milliseconds
    pub fn pulse_guide(&mut self, dir: GuideDirection, duration_ms: u32) -> Result<(), CommandError> {
        self.guide_ready()?;
        let (axis, direction) = dir.resolve(self.pointing.side);
        let rate_x = self.pulse_rate.multiplier(self.max_rate_x(axis));
        let ticks = libm::round(duration_ms as f64 * self.config.ticks_per_second() / 1000.0) as u32;
        self.send(MotionCommand::PulseGuide {
            axis,
            dir: direction,
            rate_x,
            ticks,
        })
    }

    /// Stop guiding on the axis of `dir`, or on both axes
    pub fn stop_guide(&mut self, dir: Option<GuideDirection>) -> Result<(), CommandError> {
        let axis = dir.map(|d| d.resolve(self.pointing.side).0);
        self.send(MotionCommand::StopGuide(axis))
    }

    fn guide_ready(&self) -> Result<(), CommandError> {
        if self.coordinator.park_state().blocks_motion() {
            return Err(GotoError::Parked.into());
        }
        if self.coordinator.is_slewing() {
            return Err(GotoError::AlreadyInMotion.into());
        }
        Ok(())
    }

    /// Fastest slew of an axis in multiples of sidereal
    fn max_rate_x(&self, axis: Axis) -> f64 {
        let sidereal_second = NOMINAL_SIDEREAL_INTERVAL as f64 / HW_TICKS_PER_SECOND as f64;
        self.config.axis(axis).max_slew_deg_per_s / DEG_PER_SIDEREAL_SECOND * sidereal_second
    }

    // Periodic error correction

    pub fn pec_state(&self) -> PecState {
        self.snapshot.pec_state
    }

    pub fn pec_arm_record(&mut self) -> Result<(), CommandError> {
        match self.snapshot.pec_state {
            PecState::Ignore | PecState::ReadyToPlay => self.send(MotionCommand::PecArmRecord),
            _ => Err(CommandError::InvalidState),
        }
    }

    pub fn pec_arm_play(&mut self) -> Result<(), CommandError> {
        if self.snapshot.pec_state != PecState::Ignore || !self.pec_buffer.is_valid() {
            return Err(CommandError::InvalidState);
        }
        self.send(MotionCommand::PecArmPlay)
    }

    pub fn pec_stop(&mut self) -> Result<(), CommandError> {
        self.send(MotionCommand::PecStop)
    }

    /// Stop PEC and invalidate the table
    pub fn pec_clear(&mut self) -> Result<(), CommandError> {
        self.send(MotionCommand::PecClear)
    }

    /// Copy of the current table, empty when no valid table exists
    pub fn pec_record(&self) -> PecRecord {
        let slots = (self.config.pec.slots as usize).min(MAX_PEC_SLOTS);
        let mut values = [0i8; MAX_PEC_SLOTS];
        if self.pec_buffer.snapshot(&mut values[..slots]) {
            PecRecord::from_slots(&values[..slots])
        } else {
            PecRecord::from_slots(&[])
        }
    }

    /// The table changed since it was last taken for saving
    pub fn take_dirty_pec(&mut self) -> Option<PecRecord> {
        if !self.pec_dirty {
            return None;
        }
        self.pec_dirty = false;
        Some(self.pec_record())
    }

    /// Install a saved table; only while PEC is idle
    pub fn load_pec_table(&mut self, record: &PecRecord) -> Result<(), CommandError> {
        if self.snapshot.pec_state != PecState::Ignore
            || record.slots.len() != self.config.pec.slots as usize
        {
            return Err(CommandError::InvalidState);
        }
        self.pec_buffer.load(&record.slots);
        self.pec_generation = self.pec_buffer.generation();
        info!("PEC table loaded, {} slots", record.slots.len());
        Ok(())
    }

    // Sidereal clock

    /// Forward one PPS interval measured in local microseconds
    pub fn pps_pulse(&mut self, micros: u32) -> Result<(), CommandError> {
        self.send(MotionCommand::PpsPulse(micros))
    }

    pub fn pps_lost(&mut self) -> Result<(), CommandError> {
        self.send(MotionCommand::PpsLost)
    }

    /// Set the sidereal interval as an offset from nominal
    pub fn set_interval(&mut self, delta: i32) -> Result<(), CommandError> {
        self.send(MotionCommand::SetInterval(delta))?;
        self.settings.sidereal_interval_delta = delta;
        self.settings_dirty = true;
        Ok(())
    }

    /// Nudge the sidereal interval (speed up or slow down tracking)
    pub fn adjust_interval(&mut self, by: i32) -> Result<(), CommandError> {
        self.send(MotionCommand::AdjustInterval(by))?;
        self.settings.sidereal_interval_delta =
            self.settings.sidereal_interval_delta.saturating_add(by);
        self.settings_dirty = true;
        Ok(())
    }

    pub fn interval_delta(&self) -> i32 {
        self.settings.sidereal_interval_delta
    }

    /// Interval in use by the motion loop at the last poll
    pub fn interval(&self) -> u32 {
        self.snapshot.interval
    }

    /// Set local sidereal time in hours
    pub fn set_sidereal_time(&mut self, hours: f64) {
        let snapshot = self.refresh();
        self.lst_epoch = (SiderealTick::new(snapshot.lst), wrap_hours(hours));
    }

    /// Local sidereal time in hours at the last poll
    pub fn lst_hours(&self) -> f64 {
        let (epoch, hours) = self.lst_epoch;
        let seconds = SiderealTick::new(self.snapshot.lst).since(epoch) as f64
            / LST_TICKS_PER_SIDEREAL_SECOND as f64;
        wrap_hours(hours + seconds / SECONDS_PER_HOUR)
    }

    fn hour_angle_of(&self, ra_hours: f64) -> f64 {
        wrap_180((self.lst_hours() - ra_hours) * 15.0)
    }

    // Policies and site

    pub fn set_meridian_flip(&mut self, policy: MeridianFlipPolicy) {
        self.config.meridian_flip = policy;
        self.settings.meridian_flip = policy;
        self.settings_dirty = true;
    }

    pub fn set_preferred_pier_side(&mut self, side: PreferredPierSide) {
        self.config.preferred_pier_side = side;
        self.settings.preferred_pier_side = side;
        self.settings_dirty = true;
    }

    pub fn set_pause_at_home(&mut self, pause: bool) {
        self.config.pause_at_home = pause;
        self.settings.pause_at_home = pause;
        self.coordinator.set_pause_at_home(pause);
        self.settings_dirty = true;
    }

    pub fn set_auto_meridian_flip(&mut self, enabled: bool) {
        self.config.auto_meridian_flip = enabled;
        self.settings.auto_meridian_flip = enabled;
        self.settings_dirty = true;
    }

    /// Mark an alignment in progress (permits flips under IfAligned)
    pub fn set_aligning(&mut self, aligning: bool) {
        self.coordinator.set_aligning(aligning);
    }

    pub fn set_site(&mut self, site: SiteConfig) -> Result<(), CommandError> {
        if !(-90.0..=90.0).contains(&site.latitude_deg)
            || !(-180.0..=180.0).contains(&site.longitude_deg)
        {
            return Err(CommandError::InvalidState);
        }
        self.config.site = site;
        self.settings.site = site;
        self.settings_dirty = true;
        Ok(())
    }

    /// Feed the limit switch input
    pub fn set_limit_sense(&mut self, tripped: bool) {
        self.safety.update_limit_sense(tripped);
    }

    // Errors

    pub fn clear_error(&mut self) {
        self.last_error = ErrorCode::None;
    }

    /// Ask the motion loop to clear an axis fault
    ///
    /// A driver that still reports a fault stays latched and the error
    /// returns on the next poll.
    pub fn clear_fault(&mut self, axis: Axis) -> Result<(), CommandError> {
        self.send(MotionCommand::ClearFault(axis))?;
        if self.last_error == ErrorCode::MotorFault {
            self.last_error = ErrorCode::None;
        }
        Ok(())
    }

    // Settings

    pub fn settings(&self) -> &MountSettings {
        &self.settings
    }

    /// Settings changed since they were last taken for saving
    pub fn take_dirty_settings(&mut self) -> Option<MountSettings> {
        if !self.settings_dirty {
            return None;
        }
        self.settings_dirty = false;
        let mut settings = self.settings.clone();
        settings.update_crc();
        Some(settings)
    }

    // Status

    pub fn status(&self) -> StatusSnapshot {
        let s = &self.snapshot;
        let p = &self.pointing;
        StatusSnapshot {
            kind: self.config.kind,
            tracking: self.coordinator.tracking(),
            park: self.coordinator.park_state(),
            pec: s.pec_state,
            last_error: self.last_error,
            last_goto_error: self.last_goto_error,
            axis_fault: [s.axes[0].fault, s.axes[1].fault],
            pier_side: p.side,
            aligning: self.coordinator.is_aligning(),
            guiding: s.any_guiding(),
            at_home: self.coordinator.at_home(),
            waiting_home: self.coordinator.waiting_home(),
            slewing: self.coordinator.is_slewing() || s.any_slewing(),
            in_backlash: [s.axes[0].in_backlash, s.axes[1].in_backlash],
            enabled: s.axes.iter().all(|a| a.enabled),
            pps_synced: s.pps_synced,
            lst: s.lst,
            positions: s.positions(),
            axes_deg: p.axes_deg,
            ha_deg: p.ha_deg,
            dec_deg: p.dec_deg,
            alt_deg: p.alt_deg,
            meridian_flip: self.config.meridian_flip,
            preferred_pier_side: self.config.preferred_pier_side,
            rate_compensation: self.config.rate_compensation,
            tracking_rate: self.config.tracking_rate,
            pec_table_valid: self.pec_buffer.is_valid(),
        }
    }

    // Plumbing

    fn refresh(&mut self) -> TelemetrySnapshot {
        let snapshot = self.telemetry.read();
        self.snapshot = snapshot;
        self.pointing = self.pointing_of(&snapshot);
        snapshot
    }

    fn pointing_of(&self, snapshot: &TelemetrySnapshot) -> Pointing {
        let spd = self.config.steps_per_degree();
        let positions = snapshot.positions();
        let axes_deg = [0, 1].map(|i| self.settings.index_deg[i] + positions[i] as f64 / spd[i]);

        let kind = self.config.kind;
        let latitude = self.config.site.latitude_deg;
        let side = kind.side_of_axes(axes_deg);
        let (ha_deg, dec_deg) = kind.from_axes(axes_deg, side, latitude);
        let (alt_deg, _) = equatorial_to_horizon(ha_deg, dec_deg, latitude);
        Pointing {
            ha_deg,
            dec_deg,
            alt_deg,
            axes_deg,
            side,
        }
    }

    fn steps_of(&self, axes_deg: [f64; 2]) -> [i32; 2] {
        let spd = self.config.steps_per_degree();
        [0, 1].map(|i| libm::round((axes_deg[i] - self.settings.index_deg[i]) * spd[i]) as i32)
    }

    fn send(&mut self, command: MotionCommand) -> Result<(), CommandError> {
        self.commands
            .enqueue(command)
            .map_err(|_| CommandError::QueueFull)
    }

    fn ensure_room(&self, count: usize) -> Result<(), CommandError> {
        if self.commands.capacity() - self.commands.len() < count {
            return Err(CommandError::QueueFull);
        }
        Ok(())
    }
}

fn wrap_hours(hours: f64) -> f64 {
    hours - 24.0 * libm::floor(hours / 24.0)
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::mount::{MotionLoop, TickInputs};
    use crate::shared::CommandQueue;
    use crate::traits::mock::MockStepper;
    use crate::traits::{Direction, StepperDriver};

    struct Bench {
        telemetry: MotionTelemetry,
        buffer: PecBuffer,
        queue: CommandQueue,
    }

    impl Bench {
        fn new() -> Self {
            Self {
                telemetry: MotionTelemetry::new(),
                buffer: PecBuffer::new(),
                queue: CommandQueue::new(),
            }
        }

        fn build<D: StepperDriver>(
            &mut self,
            config: &MountConfig,
            settings: MountSettings,
            drivers: [D; 2],
        ) -> (Mount<'_>, MotionLoop<'_, D>) {
            let (producer, consumer) = self.queue.split();
            let motion = MotionLoop::new(config, drivers, consumer, &self.telemetry, &self.buffer);
            let mut mount = Mount::new(
                config.clone(),
                settings,
                producer,
                &self.telemetry,
                &self.buffer,
            );
            mount.start().unwrap();
            (mount, motion)
        }
    }

    fn mocks() -> [MockStepper; 2] {
        [MockStepper::new(), MockStepper::new()]
    }

    /// Coarse axes so slews finish in a few thousand ticks
    fn fast_config() -> MountConfig {
        let mut config = MountConfig::default();
        for axis in [&mut config.axis1, &mut config.axis2] {
            axis.steps_per_degree = 1_000.0;
            axis.max_slew_deg_per_s = 20.0;
            axis.accel_distance_deg = 1.0;
            axis.backlash_steps = 10;
        }
        config.pec.steps_per_worm_rotation = 2_500;
        config.pec.slots = 250;
        config
    }

    /// Motion ticks with a control poll every 100
    fn run<D: StepperDriver>(mount: &mut Mount<'_>, motion: &mut MotionLoop<'_, D>, ticks: u32) {
        for i in 0..ticks {
            motion.tick(TickInputs::default());
            if i % 100 == 99 {
                mount.poll();
            }
        }
        mount.poll();
    }

    fn target(ha: f64, dec: f64) -> GotoTarget {
        GotoTarget {
            ha_deg: ha,
            dec_deg: dec,
        }
    }

    #[test]
    fn test_goto_below_horizon_changes_nothing() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);

        assert_eq!(
            mount.goto(target(0.0, -60.0)),
            Err(CommandError::Goto(GotoError::BelowHorizon))
        );
        run(&mut mount, &mut motion, 200);

        let status = mount.status();
        assert_eq!(status.positions, [0, 0]);
        assert_eq!(status.tracking, TrackingState::None);
        assert!(!status.slewing);
        assert_eq!(status.last_goto_error, Some(GotoError::BelowHorizon));
    }

    #[test]
    fn test_goto_completes_and_resumes_tracking() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);
        mount.start_tracking().unwrap();

        mount.goto(target(60.0, 60.0)).unwrap();
        assert_eq!(mount.tracking(), TrackingState::Slewing);
        run(&mut mount, &mut motion, 25_000);

        let status = mount.status();
        assert!(!status.slewing);
        assert_eq!(status.tracking, TrackingState::Sidereal);
        assert_eq!(status.pier_side, PierSide::East);
        assert!((status.ha_deg - 60.0).abs() < 0.1, "ha {}", status.ha_deg);
        assert!((status.dec_deg - 60.0).abs() < 0.01, "dec {}", status.dec_deg);
        assert_eq!(status.last_goto_error, None);
    }

    #[test]
    fn test_abort_restores_tracking() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);
        assert_eq!(mount.abort_slew(), Err(CommandError::InvalidState));

        mount.start_tracking().unwrap();
        mount.goto(target(60.0, 60.0)).unwrap();
        run(&mut mount, &mut motion, 2_000);
        assert!(mount.status().slewing);

        mount.abort_slew().unwrap();
        assert_eq!(mount.tracking(), TrackingState::Sidereal);
        run(&mut mount, &mut motion, 1);
        assert!(!mount.status().slewing);
    }

    #[test]
    fn test_park_and_unpark() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);

        // No saved park position: parks at home, where the mount starts
        mount.park().unwrap();
        assert_eq!(mount.park_state(), ParkState::Parking);
        run(&mut mount, &mut motion, 300);

        let status = mount.status();
        assert_eq!(status.park, ParkState::Parked);
        assert!(!status.enabled);
        assert_eq!(
            mount.start_tracking(),
            Err(CommandError::Goto(GotoError::Parked))
        );
        assert_eq!(
            mount.goto(target(30.0, 40.0)),
            Err(CommandError::Goto(GotoError::Parked))
        );
        assert!(mount.take_dirty_settings().unwrap().parked);

        mount.unpark().unwrap();
        run(&mut mount, &mut motion, 10);
        let status = mount.status();
        assert_eq!(status.park, ParkState::NotParked);
        assert!(status.enabled);
        assert!(!mount.take_dirty_settings().unwrap().parked);
    }

    #[test]
    fn test_set_park_is_used_by_park() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);

        mount.sync(target(30.0, 40.0)).unwrap();
        mount.set_park().unwrap();
        let park = mount.settings().park.unwrap();
        assert_eq!(park.pier_side, PierSide::East);
        assert!((park.axis_deg[0] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_sync_reindexes_axes() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);

        mount.sync(target(30.0, 40.0)).unwrap();
        let status = mount.status();
        assert!((status.ha_deg - 30.0).abs() < 1e-9);
        assert!((status.dec_deg - 40.0).abs() < 1e-9);
        assert_eq!(status.positions, [0, 0]);
        let settings = mount.take_dirty_settings().unwrap();
        assert!(settings.verify_crc());
        assert!((settings.index_deg[0] - 30.0).abs() < 1e-9);

        // Past the east meridian limit on the current side
        assert_eq!(
            mount.sync(target(-40.0, 40.0)),
            Err(CommandError::Status(ErrorCode::Sync))
        );
    }

    #[test]
    fn test_altaz_compensation_is_mapped_to_axes() {
        let mut config = fast_config();
        config.kind = MountKind::AltAzimuth;
        config.rate_compensation = RateCompensationMode::RefractionBoth;
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);
        mount.sync(target(30.0, 40.0)).unwrap();
        run(&mut mount, &mut motion, 1);
        run(&mut mount, &mut motion, 1);

        let p = mount.pointing();
        let latitude = config.site.latitude_deg;
        let correction = compensation_rates(
            config.rate_compensation,
            p.ha_deg,
            p.dec_deg,
            latitude,
            &config.pointing,
        );
        assert!(correction[0] != 0.0);
        let expected = MountKind::AltAzimuth.axis_rate_correction(
            correction,
            p.ha_deg,
            p.dec_deg,
            p.side,
            latitude,
        );
        for axis in Axis::ALL {
            let applied = motion.axis(axis).rates().get(RateKind::Compensation).value;
            assert!(
                (applied - expected[axis.index()]).abs() <= RATE_EPSILON,
                "axis {} applied {} expected {}",
                axis.index(),
                applied,
                expected[axis.index()]
            );
        }
    }

    #[test]
    fn test_guide_moves_declination() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);

        mount.guide(GuideDirection::North).unwrap();
        run(&mut mount, &mut motion, 1_000);
        assert!(mount.status().guiding);

        mount.stop_guide(None).unwrap();
        run(&mut mount, &mut motion, 1);
        let status = mount.status();
        assert!(!status.guiding);
        // 20x sidereal for 0.1 s at 1000 steps per degree
        assert!((7..=9).contains(&status.positions[1]), "{:?}", status.positions);
        assert_eq!(status.positions[0], 0);
    }

    #[test]
    fn test_st4_guide_uses_pulse_rate() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);

        mount.set_guide_rate(GuideRate::X1);
        mount.set_pulse_guide_rate(GuideRate::X20);
        mount.st4_guide(GuideDirection::North).unwrap();
        run(&mut mount, &mut motion, 1_000);
        assert!(mount.status().guiding);

        mount.stop_guide(Some(GuideDirection::South)).unwrap();
        run(&mut mount, &mut motion, 1);
        let status = mount.status();
        assert!(!status.guiding);
        assert!((7..=9).contains(&status.positions[1]), "{:?}", status.positions);
    }

    #[test]
    fn test_pulse_guide_duration() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);

        mount.set_pulse_guide_rate(GuideRate::X48);
        mount.pulse_guide(GuideDirection::West, 500).unwrap();
        run(&mut mount, &mut motion, 4_000);
        assert!(mount.status().guiding);
        run(&mut mount, &mut motion, 2_000);
        assert!(!mount.status().guiding);
        // 48x sidereal for 0.5 s at 1000 steps per degree
        let moved = mount.status().positions[0];
        assert!((95..=105).contains(&moved), "moved {}", moved);
    }

    #[test]
    fn test_sidereal_time_follows_lst() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());

        mount.set_sidereal_time(29.0);
        assert!((mount.lst_hours() - 5.0).abs() < 1e-9);
        run(&mut mount, &mut motion, 10_000);
        let expected = 5.0 + 1.0 / 3600.0;
        assert!((mount.lst_hours() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_goto_ra_dec_uses_sidereal_time() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);
        mount.set_sidereal_time(6.0);

        // RA 6h is on the meridian; dec -60 never rises at 45N
        assert_eq!(
            mount.goto_ra_dec(6.0, -60.0),
            Err(CommandError::Goto(GotoError::BelowHorizon))
        );
        mount.goto_ra_dec(5.0, 60.0).unwrap();
        assert!(mount.status().slewing);
        assert_eq!(mount.status().last_goto_error, None);
    }

    #[test]
    fn test_interval_calibration_is_persisted() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());

        mount.set_interval(120).unwrap();
        mount.adjust_interval(-20).unwrap();
        run(&mut mount, &mut motion, 1);
        assert_eq!(mount.interval(), NOMINAL_SIDEREAL_INTERVAL + 100);
        assert_eq!(mount.interval_delta(), 100);
        assert_eq!(
            mount.take_dirty_settings().unwrap().sidereal_interval_delta,
            100
        );
        assert!(mount.take_dirty_settings().is_none());
    }

    #[test]
    fn test_pec_table_load_and_play() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);

        assert_eq!(mount.pec_arm_play(), Err(CommandError::InvalidState));
        assert_eq!(
            mount.load_pec_table(&PecRecord::from_slots(&[1; 10])),
            Err(CommandError::InvalidState)
        );

        mount.load_pec_table(&PecRecord::from_slots(&[1; 250])).unwrap();
        run(&mut mount, &mut motion, 10);
        assert!(mount.status().pec_table_valid);
        assert!(mount.take_dirty_pec().is_none());
        let record = mount.pec_record();
        assert_eq!(record.slots.len(), 250);
        assert!(record.slots.iter().all(|&v| v == 1));

        mount.pec_arm_play().unwrap();
        run(&mut mount, &mut motion, 10);
        assert_eq!(mount.pec_state(), PecState::ReadyToPlay);

        mount.pec_clear().unwrap();
        run(&mut mount, &mut motion, 10);
        assert_eq!(mount.pec_state(), PecState::Ignore);
        assert!(mount.take_dirty_pec().unwrap().slots.is_empty());
    }

    /// Powered up parked on the west side, 20 degrees past the meridian
    fn parked_past_meridian(config: &MountConfig) -> MountSettings {
        let mut settings = MountSettings::from_config(config);
        settings.parked = true;
        settings.park = Some(ParkPosition {
            axis_deg: [200.0, 150.0],
            pier_side: PierSide::West,
        });
        settings
    }

    #[test]
    fn test_meridian_limit_stops_tracking() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) = bench.build(&config, parked_past_meridian(&config), mocks());
        mount.unpark().unwrap();
        run(&mut mount, &mut motion, 10);
        assert_eq!(mount.status().pier_side, PierSide::West);

        mount.start_tracking().unwrap();
        run(&mut mount, &mut motion, 100);
        let status = mount.status();
        assert_eq!(status.last_error, ErrorCode::Meridian);
        assert_eq!(status.tracking, TrackingState::None);
    }

    #[test]
    fn test_auto_meridian_flip() {
        let config = fast_config();
        let mut settings = parked_past_meridian(&config);
        settings.auto_meridian_flip = true;
        let mut bench = Bench::new();
        let (mut mount, mut motion) = bench.build(&config, settings, mocks());
        mount.unpark().unwrap();
        run(&mut mount, &mut motion, 10);

        mount.start_tracking().unwrap();
        run(&mut mount, &mut motion, 100);
        let status = mount.status();
        assert_eq!(status.last_error, ErrorCode::None);
        assert_eq!(status.tracking, TrackingState::Slewing);
        assert!(status.slewing);
    }

    struct FlagStepper<'a> {
        fault: &'a AtomicBool,
        inner: MockStepper,
    }

    impl StepperDriver for FlagStepper<'_> {
        fn set_direction(&mut self, dir: Direction) {
            self.inner.set_direction(dir);
        }

        fn step(&mut self) {
            self.inner.step();
        }

        fn enable(&mut self, enabled: bool) {
            self.inner.enable(enabled);
        }

        fn is_enabled(&self) -> bool {
            self.inner.is_enabled()
        }

        fn set_microstep_code(&mut self, code: u8) {
            self.inner.set_microstep_code(code);
        }

        fn is_faulted(&self) -> bool {
            self.fault.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn test_motor_fault_needs_explicit_clear() {
        let config = fast_config();
        let fault = AtomicBool::new(false);
        let healthy = AtomicBool::new(false);
        let drivers = [
            FlagStepper {
                fault: &fault,
                inner: MockStepper::new(),
            },
            FlagStepper {
                fault: &healthy,
                inner: MockStepper::new(),
            },
        ];
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), drivers);
        run(&mut mount, &mut motion, 10);
        mount.start_tracking().unwrap();
        run(&mut mount, &mut motion, 100);

        fault.store(true, Ordering::Relaxed);
        run(&mut mount, &mut motion, 100);
        let status = mount.status();
        assert_eq!(status.last_error, ErrorCode::MotorFault);
        assert_eq!(status.tracking, TrackingState::None);
        assert!(status.axis_fault[0]);

        // Refused while the driver still reports the fault
        mount.clear_fault(Axis::Primary).unwrap();
        run(&mut mount, &mut motion, 100);
        assert_eq!(mount.last_error(), ErrorCode::MotorFault);

        fault.store(false, Ordering::Relaxed);
        mount.clear_fault(Axis::Primary).unwrap();
        run(&mut mount, &mut motion, 100);
        assert_eq!(mount.last_error(), ErrorCode::None);
        assert!(!mount.status().axis_fault[0]);
    }

    #[test]
    fn test_home_after_goto() {
        let config = fast_config();
        let mut bench = Bench::new();
        let (mut mount, mut motion) =
            bench.build(&config, MountSettings::from_config(&config), mocks());
        run(&mut mount, &mut motion, 10);
        assert!(mount.status().at_home);

        mount.goto(target(80.0, 80.0)).unwrap();
        run(&mut mount, &mut motion, 10_000);
        assert!(!mount.status().slewing);
        assert!(!mount.status().at_home);

        mount.request_home().unwrap();
        run(&mut mount, &mut motion, 10_000);
        let status = mount.status();
        assert!(status.at_home);
        assert_eq!(status.positions, [0, 0]);
    }
}
