//! Goto coordinator
//!
//! Validates goto, park and home requests, chooses the pier side, and
//! sequences the slew legs. A slew that changes pier side on a German
//! equatorial mount goes through the home position, where it can pause
//! until released. The coordinator owns the tracking and park state
//! machines but never touches the axes: it hands legs to the caller and
//! watches the motion telemetry for their completion.

use heapless::Vec;

use crate::config::MountConfig;
use crate::shared::TelemetrySnapshot;
use crate::state::{
    CommandError, ErrorCode, GotoError, ParkEvent, ParkState, PierSide, PreferredPierSide,
    TrackingState,
};

/// Sky position to slew to
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GotoTarget {
    pub ha_deg: f64,
    pub dec_deg: f64,
}

/// Why a slew is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlewPurpose {
    Goto,
    Park,
    Home,
}

/// One straight slew of both axes
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlewLeg {
    /// Axis angles to reach
    pub axes_deg: [f64; 2],
    pub side: PierSide,
    /// Sky target of the leg, when the axes must follow it
    ///
    /// The caller recomputes `axes_deg` from this when the leg is issued
    /// late, such as after a pause at home.
    pub sky: Option<GotoTarget>,
}

/// A validated request, ready to start
#[derive(Debug, Clone, PartialEq)]
pub struct SlewPlan {
    purpose: SlewPurpose,
    legs: Vec<SlewLeg, 2>,
}

impl SlewPlan {
    fn direct(purpose: SlewPurpose, leg: SlewLeg) -> Self {
        Self {
            purpose,
            legs: Vec::from_iter([leg]),
        }
    }

    /// Two legs: a waypoint, then the destination
    fn via(purpose: SlewPurpose, waypoint: SlewLeg, leg: SlewLeg) -> Self {
        Self {
            purpose,
            legs: Vec::from_iter([waypoint, leg]),
        }
    }

    pub fn purpose(&self) -> SlewPurpose {
        self.purpose
    }

    pub fn legs(&self) -> &[SlewLeg] {
        &self.legs
    }

    /// True if the plan changes pier side
    pub fn is_flip(&self) -> bool {
        self.legs.len() > 1
    }
}

/// State the coordinator reads to validate a request
#[derive(Debug, Clone, Copy)]
pub struct GotoContext<'a> {
    pub config: &'a MountConfig,
    pub telemetry: &'a TelemetrySnapshot,
    /// Current axis angles
    pub axes_deg: [f64; 2],
}

impl GotoContext<'_> {
    fn current_side(&self) -> PierSide {
        self.config.kind.side_of_axes(self.axes_deg)
    }
}

/// Outcome of polling an active slew
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlewProgress {
    /// No slew is active
    Idle,
    /// The current leg is still moving
    Moving,
    /// The caller must issue this leg with this slew id
    Issue(SlewLeg, u8),
    /// Holding at home until released
    PausedAtHome,
    /// The slew finished; tracking and park state are already restored
    Completed(SlewPurpose),
    /// An axis faulted; the caller must abort the axes
    Failed(ErrorCode),
}

#[derive(Debug, Clone)]
struct ActiveSlew {
    plan: SlewPlan,
    leg: usize,
    slew_id: u8,
    issued: bool,
}

/// Tracking, park and slew sequencing
#[derive(Debug, Clone)]
pub struct GotoCoordinator {
    tracking: TrackingState,
    resume_tracking: TrackingState,
    park: ParkState,
    aligning: bool,
    at_home: bool,
    waiting_home: bool,
    pause_at_home: bool,
    active: Option<ActiveSlew>,
    next_slew_id: u8,
    tolerance: i32,
}

impl GotoCoordinator {
    pub fn new(config: &MountConfig) -> Self {
        Self {
            tracking: TrackingState::None,
            resume_tracking: TrackingState::None,
            park: ParkState::NotParked,
            aligning: false,
            // Power-up assumes the mount sits at home
            at_home: true,
            waiting_home: false,
            pause_at_home: config.pause_at_home,
            active: None,
            next_slew_id: 1,
            tolerance: config.slew_tolerance_steps as i32,
        }
    }

    pub fn tracking(&self) -> TrackingState {
        self.tracking
    }

    pub fn park_state(&self) -> ParkState {
        self.park
    }

    pub fn is_aligning(&self) -> bool {
        self.aligning
    }

    pub fn set_aligning(&mut self, aligning: bool) {
        self.aligning = aligning;
    }

    pub fn at_home(&self) -> bool {
        self.at_home
    }

    pub fn waiting_home(&self) -> bool {
        self.waiting_home
    }

    pub fn set_pause_at_home(&mut self, pause: bool) {
        self.pause_at_home = pause;
    }

    pub fn is_slewing(&self) -> bool {
        self.active.is_some()
    }

    /// Purpose of the active slew
    pub fn purpose(&self) -> Option<SlewPurpose> {
        self.active.as_ref().map(|a| a.plan.purpose)
    }

    /// Restore the park state saved at power-down
    pub fn restore_parked(&mut self, parked: bool) {
        if parked {
            self.park = ParkState::Parked;
            self.at_home = false;
        }
    }

    /// Start or stop tracking outside of a slew
    pub fn set_tracking(&mut self, on: bool) -> Result<(), GotoError> {
        if self.active.is_some() {
            return Err(GotoError::AlreadyInMotion);
        }
        if on && self.park.blocks_motion() {
            return Err(GotoError::Parked);
        }
        self.tracking = if on {
            TrackingState::Sidereal
        } else {
            TrackingState::None
        };
        if on {
            self.at_home = false;
        }
        Ok(())
    }

    /// Validate a goto to a sky position
    ///
    /// Checks run in a fixed order and the first failure is returned; a
    /// rejected request changes nothing. `force_side` requests a specific
    /// pier side, as for a meridian flip.
    pub fn plan_goto(
        &self,
        target: GotoTarget,
        force_side: Option<PierSide>,
        ctx: &GotoContext,
    ) -> Result<SlewPlan, GotoError> {
        self.check_ready(ctx)?;

        let limits = &ctx.config.limits;
        let (alt, _) = super::kinematics::equatorial_to_horizon(
            target.ha_deg,
            target.dec_deg,
            ctx.config.site.latitude_deg,
        );
        if alt < limits.min_altitude_deg {
            return Err(GotoError::BelowHorizon);
        }
        if alt > limits.max_altitude_deg {
            return Err(GotoError::AboveOverhead);
        }

        let side = self.choose_side(target.ha_deg, force_side, ctx)?;
        let kind = ctx.config.kind;
        let axes_deg = kind.to_axes(
            target.ha_deg,
            target.dec_deg,
            side,
            ctx.config.site.latitude_deg,
        );
        if !ctx.config.within_travel(axes_deg) {
            return Err(GotoError::OutsideLimits);
        }

        let leg = SlewLeg {
            axes_deg,
            side,
            sky: Some(target),
        };
        Ok(self.route(SlewPurpose::Goto, leg, ctx))
    }

    /// Validate a park slew to stored axis angles
    pub fn plan_park(
        &self,
        axes_deg: [f64; 2],
        side: PierSide,
        ctx: &GotoContext,
    ) -> Result<SlewPlan, GotoError> {
        if self.park == ParkState::ParkFailed {
            return Err(GotoError::Unspecified);
        }
        self.check_ready(ctx)?;
        if !ctx.config.within_travel(axes_deg) {
            return Err(GotoError::OutsideLimits);
        }
        let leg = SlewLeg {
            axes_deg,
            side,
            sky: None,
        };
        Ok(self.route(SlewPurpose::Park, leg, ctx))
    }

    /// Validate a slew to the home position
    pub fn plan_home(&self, ctx: &GotoContext) -> Result<SlewPlan, GotoError> {
        self.check_ready(ctx)?;
        let axes_deg = ctx.config.home_deg;
        let leg = SlewLeg {
            axes_deg,
            side: ctx.config.kind.side_of_axes(axes_deg),
            sky: None,
        };
        Ok(SlewPlan::direct(SlewPurpose::Home, leg))
    }

    fn check_ready(&self, ctx: &GotoContext) -> Result<(), GotoError> {
        if self.park.blocks_motion() {
            return Err(GotoError::Parked);
        }
        if self.active.is_some()
            || self.park == ParkState::Parking
            || self.waiting_home
            || ctx.telemetry.any_slewing()
        {
            return Err(GotoError::AlreadyInMotion);
        }
        if ctx.telemetry.any_guiding() {
            return Err(GotoError::InMotion);
        }
        if ctx.telemetry.axes.iter().any(|a| !a.enabled) {
            return Err(GotoError::Standby);
        }
        if ctx.telemetry.any_fault() {
            return Err(GotoError::HardwareFault);
        }
        Ok(())
    }

    fn choose_side(
        &self,
        ha_deg: f64,
        force_side: Option<PierSide>,
        ctx: &GotoContext,
    ) -> Result<PierSide, GotoError> {
        let kind = ctx.config.kind;
        let limits = &ctx.config.limits;

        if !kind.has_pier_sides() {
            return if kind.reachable(ha_deg, PierSide::None, limits) {
                Ok(PierSide::None)
            } else {
                Err(GotoError::OutsideLimits)
            };
        }

        let current = match ctx.current_side() {
            PierSide::None => kind.natural_side(ha_deg),
            side => side,
        };
        let candidates = match (force_side, ctx.config.preferred_pier_side) {
            (Some(side), _) => [side, side],
            (None, PreferredPierSide::Best) => [current, current.opposite()],
            (None, PreferredPierSide::East) => [PierSide::East, PierSide::West],
            (None, PreferredPierSide::West) => [PierSide::West, PierSide::East],
        };

        let flip_ok = ctx.config.meridian_flip.permits_flip(self.aligning);
        candidates
            .into_iter()
            .find(|&side| kind.reachable(ha_deg, side, limits) && (side == current || flip_ok))
            .ok_or(GotoError::OutsideLimits)
    }

    /// Route through home when the pier side changes
    fn route(&self, purpose: SlewPurpose, leg: SlewLeg, ctx: &GotoContext) -> SlewPlan {
        let current = ctx.current_side();
        if ctx.config.kind.has_pier_sides() && current != PierSide::None && leg.side != current {
            let home = ctx.config.home_deg;
            let waypoint = SlewLeg {
                axes_deg: home,
                side: ctx.config.kind.side_of_axes(home),
                sky: None,
            };
            SlewPlan::via(purpose, waypoint, leg)
        } else {
            SlewPlan::direct(purpose, leg)
        }
    }

    /// Start a validated plan and return the first leg to issue
    pub fn begin(&mut self, plan: SlewPlan) -> Option<(SlewLeg, u8)> {
        let first = *plan.legs.first()?;

        if self.tracking != TrackingState::Slewing {
            self.resume_tracking = self.tracking;
        }
        if plan.purpose == SlewPurpose::Park {
            self.park = self.park.transition(ParkEvent::Begin);
            self.resume_tracking = TrackingState::None;
        }
        if plan.purpose == SlewPurpose::Home {
            self.resume_tracking = TrackingState::None;
        }
        self.tracking = TrackingState::Slewing;
        self.at_home = false;

        let slew_id = next_id(&mut self.next_slew_id);
        info!("slew {} started, {} legs", slew_id, plan.legs.len());
        self.active = Some(ActiveSlew {
            plan,
            leg: 0,
            slew_id,
            issued: true,
        });
        Some((first, slew_id))
    }

    /// Tracking state the active slew returns to
    pub fn resume_tracking(&self) -> TrackingState {
        self.resume_tracking
    }

    /// Advance the active slew from fresh telemetry
    ///
    /// A leg is complete once both axes report it finished (by slew id)
    /// and sit within tolerance of their published targets.
    pub fn poll(&mut self, telemetry: &TelemetrySnapshot) -> SlewProgress {
        if self.active.is_some() && telemetry.any_fault() {
            return SlewProgress::Failed(self.fail(ErrorCode::MotorFault));
        }
        let Some(active) = self.active.as_mut() else {
            return SlewProgress::Idle;
        };

        if !active.issued {
            if self.waiting_home {
                return SlewProgress::PausedAtHome;
            }
            active.issued = true;
            active.slew_id = next_id(&mut self.next_slew_id);
            return SlewProgress::Issue(active.plan.legs[active.leg], active.slew_id);
        }

        let tolerance = self.tolerance;
        let arrived = telemetry.axes.iter().all(|axis| {
            !axis.slewing
                && axis.last_slew_id == active.slew_id
                && (axis.position as i64 - axis.target as i64).abs() <= tolerance as i64
        });
        if !arrived {
            return SlewProgress::Moving;
        }

        if active.leg + 1 < active.plan.legs.len() {
            active.leg += 1;
            active.issued = false;
            if self.pause_at_home {
                info!("paused at home");
                self.waiting_home = true;
                self.at_home = true;
                return SlewProgress::PausedAtHome;
            }
            return self.poll(telemetry);
        }

        let purpose = active.plan.purpose;
        self.active = None;
        match purpose {
            SlewPurpose::Goto => {
                self.tracking = self.resume_tracking;
            }
            SlewPurpose::Park => {
                self.park = self.park.transition(ParkEvent::Arrived);
                self.tracking = TrackingState::None;
                info!("parked");
            }
            SlewPurpose::Home => {
                self.tracking = TrackingState::None;
                self.at_home = true;
            }
        }
        SlewProgress::Completed(purpose)
    }

    /// Continue a flip held at home
    pub fn release_home_pause(&mut self) -> bool {
        if !self.waiting_home {
            return false;
        }
        self.waiting_home = false;
        self.at_home = false;
        true
    }

    /// Abort the active slew or park
    ///
    /// Restores the tracking state from before the slew. An aborted park
    /// returns to NotParked.
    pub fn abort(&mut self) -> Result<(), CommandError> {
        if self.tracking != TrackingState::Slewing && self.park != ParkState::Parking {
            return Err(CommandError::InvalidState);
        }
        self.active = None;
        self.waiting_home = false;
        self.tracking = self.resume_tracking;
        self.park = self.park.transition(ParkEvent::Aborted);
        warn!("slew aborted");
        Ok(())
    }

    /// End the active slew on a fault or limit
    ///
    /// Tracking stops. A park in progress becomes ParkFailed and reports
    /// [`ErrorCode::Park`]; otherwise `cause` is returned unchanged.
    pub fn fail(&mut self, cause: ErrorCode) -> ErrorCode {
        let purpose = self.purpose();
        self.active = None;
        self.waiting_home = false;
        self.tracking = TrackingState::None;
        if purpose == Some(SlewPurpose::Park) || self.park == ParkState::Parking {
            self.park = self.park.transition(ParkEvent::Fault);
            error!("park failed: {}", cause);
            return ErrorCode::Park;
        }
        cause
    }

    pub fn unpark(&mut self) -> Result<(), CommandError> {
        match self.park {
            ParkState::Parked | ParkState::Unknown => {
                self.park = self.park.transition(ParkEvent::Unpark);
                self.tracking = TrackingState::None;
                Ok(())
            }
            _ => Err(CommandError::InvalidState),
        }
    }

    /// Clear ParkFailed back to NotParked
    pub fn reset_park(&mut self) -> bool {
        let next = self.park.transition(ParkEvent::Reset);
        let changed = next != self.park;
        self.park = next;
        changed
    }
}

fn next_id(counter: &mut u8) -> u8 {
    let id = *counter;
    // Zero is the power-up value reported by idle axes
    *counter = match id.wrapping_add(1) {
        0 => 1,
        next => next,
    };
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::AxisTelemetry;
    use crate::state::MeridianFlipPolicy;

    fn ready_telemetry() -> TelemetrySnapshot {
        let mut telemetry = TelemetrySnapshot::default();
        for axis in telemetry.axes.iter_mut() {
            axis.enabled = true;
        }
        telemetry
    }

    fn east_side() -> [f64; 2] {
        // Pointing at ha 30, dec 40 from the east side
        [30.0, 40.0]
    }

    fn target(ha: f64, dec: f64) -> GotoTarget {
        GotoTarget {
            ha_deg: ha,
            dec_deg: dec,
        }
    }

    fn arrive(telemetry: &mut TelemetrySnapshot, steps: [i32; 2], id: u8) {
        for (axis, pos) in telemetry.axes.iter_mut().zip(steps) {
            *axis = AxisTelemetry {
                position: pos,
                target: pos,
                enabled: true,
                last_slew_id: id,
                ..Default::default()
            };
        }
    }

    #[test]
    fn test_goto_rejected_below_horizon() {
        let config = MountConfig::default();
        let telemetry = ready_telemetry();
        let coordinator = GotoCoordinator::new(&config);
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        // Dec -60 never rises at latitude 45
        assert_eq!(
            coordinator.plan_goto(target(0.0, -60.0), None, &ctx),
            Err(GotoError::BelowHorizon)
        );
        assert_eq!(coordinator.tracking(), TrackingState::None);
    }

    #[test]
    fn test_validation_order() {
        let config = MountConfig::default();
        let mut telemetry = ready_telemetry();
        telemetry.axes[0].slewing = true;
        telemetry.axes[1].fault = true;
        let mut coordinator = GotoCoordinator::new(&config);
        coordinator.restore_parked(true);
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        let below = target(0.0, -60.0);
        assert_eq!(coordinator.plan_goto(below, None, &ctx), Err(GotoError::Parked));

        coordinator.unpark().unwrap();
        assert_eq!(
            coordinator.plan_goto(below, None, &ctx),
            Err(GotoError::AlreadyInMotion)
        );

        let mut settled = telemetry;
        settled.axes[0].slewing = false;
        let ctx = GotoContext {
            config: &config,
            telemetry: &settled,
            axes_deg: east_side(),
        };
        assert_eq!(
            coordinator.plan_goto(below, None, &ctx),
            Err(GotoError::HardwareFault)
        );
    }

    #[test]
    fn test_standby_and_guiding() {
        let config = MountConfig::default();
        let mut telemetry = ready_telemetry();
        telemetry.axes[0].guiding = true;
        telemetry.axes[1].enabled = false;
        let coordinator = GotoCoordinator::new(&config);
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        assert_eq!(
            coordinator.plan_goto(target(10.0, 30.0), None, &ctx),
            Err(GotoError::InMotion)
        );
    }

    #[test]
    fn test_same_side_goto_is_direct() {
        let config = MountConfig::default();
        let telemetry = ready_telemetry();
        let coordinator = GotoCoordinator::new(&config);
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        let plan = coordinator.plan_goto(target(10.0, 30.0), None, &ctx).unwrap();
        assert!(!plan.is_flip());
        assert_eq!(plan.legs()[0].side, PierSide::East);
        assert_eq!(plan.legs()[0].axes_deg, [10.0, 30.0]);
    }

    #[test]
    fn test_flip_goes_through_home() {
        let config = MountConfig::default();
        let telemetry = ready_telemetry();
        let coordinator = GotoCoordinator::new(&config);
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        // Far east: only reachable from the west side
        let plan = coordinator.plan_goto(target(-60.0, 30.0), None, &ctx).unwrap();
        assert!(plan.is_flip());
        assert_eq!(plan.legs()[0].axes_deg, config.home_deg);
        assert_eq!(plan.legs()[1].side, PierSide::West);
    }

    #[test]
    fn test_flip_refused_by_policy() {
        let mut config = MountConfig::default();
        config.meridian_flip = MeridianFlipPolicy::Never;
        let telemetry = ready_telemetry();
        let mut coordinator = GotoCoordinator::new(&config);
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        assert_eq!(
            coordinator.plan_goto(target(-60.0, 30.0), None, &ctx),
            Err(GotoError::OutsideLimits)
        );

        let aligned = MountConfig {
            meridian_flip: MeridianFlipPolicy::IfAligned,
            ..config.clone()
        };
        coordinator.set_aligning(true);
        let ctx = GotoContext {
            config: &aligned,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        assert!(coordinator.plan_goto(target(-60.0, 30.0), None, &ctx).is_ok());
    }

    #[test]
    fn test_preferred_side() {
        let mut config = MountConfig::default();
        config.preferred_pier_side = PreferredPierSide::West;
        let telemetry = ready_telemetry();
        let coordinator = GotoCoordinator::new(&config);
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        // 5 degrees west is reachable from both sides
        let plan = coordinator.plan_goto(target(5.0, 30.0), None, &ctx).unwrap();
        assert_eq!(plan.legs().last().unwrap().side, PierSide::West);
    }

    #[test]
    fn test_goto_completes_and_restores_tracking() {
        let config = MountConfig::default();
        let mut telemetry = ready_telemetry();
        let mut coordinator = GotoCoordinator::new(&config);
        coordinator.set_tracking(true).unwrap();
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        let plan = coordinator.plan_goto(target(10.0, 30.0), None, &ctx).unwrap();
        let (_, id) = coordinator.begin(plan).unwrap();
        assert_eq!(coordinator.tracking(), TrackingState::Slewing);

        let steps = [1_000, 2_000];
        telemetry.axes[0].slewing = true;
        assert_eq!(coordinator.poll(&telemetry), SlewProgress::Moving);

        arrive(&mut telemetry, steps, id);
        assert_eq!(
            coordinator.poll(&telemetry),
            SlewProgress::Completed(SlewPurpose::Goto)
        );
        assert_eq!(coordinator.tracking(), TrackingState::Sidereal);
    }

    #[test]
    fn test_stale_telemetry_does_not_complete() {
        let config = MountConfig::default();
        let mut telemetry = ready_telemetry();
        let mut coordinator = GotoCoordinator::new(&config);
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        let plan = coordinator.plan_goto(target(10.0, 30.0), None, &ctx).unwrap();
        let (_, id) = coordinator.begin(plan).unwrap();
        // Axes at target but have not acknowledged this slew yet
        arrive(&mut telemetry, [0, 0], id.wrapping_sub(1));
        assert_eq!(coordinator.poll(&telemetry), SlewProgress::Moving);
    }

    #[test]
    fn test_pause_at_home_during_flip() {
        let mut config = MountConfig::default();
        config.pause_at_home = true;
        let mut telemetry = ready_telemetry();
        let mut coordinator = GotoCoordinator::new(&config);
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        let plan = coordinator.plan_goto(target(-60.0, 30.0), None, &ctx).unwrap();
        let (_, id) = coordinator.begin(plan).unwrap();

        arrive(&mut telemetry, [0, 0], id);
        assert_eq!(coordinator.poll(&telemetry), SlewProgress::PausedAtHome);
        assert!(coordinator.waiting_home());
        assert_eq!(coordinator.poll(&telemetry), SlewProgress::PausedAtHome);

        assert!(coordinator.release_home_pause());
        match coordinator.poll(&telemetry) {
            SlewProgress::Issue(leg, second) => {
                assert_eq!(leg.side, PierSide::West);
                assert_ne!(second, id);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_park_fault_sets_park_failed() {
        let config = MountConfig::default();
        let mut telemetry = ready_telemetry();
        let mut coordinator = GotoCoordinator::new(&config);
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        let plan = coordinator.plan_park([90.0, 90.0], PierSide::East, &ctx).unwrap();
        coordinator.begin(plan);
        assert_eq!(coordinator.park_state(), ParkState::Parking);

        telemetry.axes[0].fault = true;
        assert_eq!(
            coordinator.poll(&telemetry),
            SlewProgress::Failed(ErrorCode::Park)
        );
        assert_eq!(coordinator.park_state(), ParkState::ParkFailed);

        // Stays failed until reset
        telemetry.axes[0].fault = false;
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        assert!(coordinator.plan_park([90.0, 90.0], PierSide::East, &ctx).is_err());
        assert!(coordinator.reset_park());
        assert_eq!(coordinator.park_state(), ParkState::NotParked);
    }

    #[test]
    fn test_park_completes() {
        let config = MountConfig::default();
        let mut telemetry = ready_telemetry();
        let mut coordinator = GotoCoordinator::new(&config);
        coordinator.set_tracking(true).unwrap();
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        let plan = coordinator.plan_park([90.0, 90.0], PierSide::East, &ctx).unwrap();
        let (_, id) = coordinator.begin(plan).unwrap();
        arrive(&mut telemetry, [5, 5], id);
        telemetry.axes[1].target = 6;
        assert_eq!(
            coordinator.poll(&telemetry),
            SlewProgress::Completed(SlewPurpose::Park)
        );
        assert_eq!(coordinator.park_state(), ParkState::Parked);
        assert_eq!(coordinator.tracking(), TrackingState::None);
        assert_eq!(coordinator.set_tracking(true), Err(GotoError::Parked));
    }

    #[test]
    fn test_abort_restores_prior_state() {
        let config = MountConfig::default();
        let telemetry = ready_telemetry();
        let mut coordinator = GotoCoordinator::new(&config);
        assert!(coordinator.abort().is_err());

        coordinator.set_tracking(true).unwrap();
        let ctx = GotoContext {
            config: &config,
            telemetry: &telemetry,
            axes_deg: east_side(),
        };
        let plan = coordinator.plan_goto(target(10.0, 30.0), None, &ctx).unwrap();
        coordinator.begin(plan);
        coordinator.abort().unwrap();
        assert_eq!(coordinator.tracking(), TrackingState::Sidereal);
        assert!(!coordinator.is_slewing());

        let plan = coordinator.plan_park([90.0, 90.0], PierSide::East, &ctx).unwrap();
        coordinator.begin(plan);
        coordinator.abort().unwrap();
        assert_eq!(coordinator.park_state(), ParkState::NotParked);
        assert_eq!(coordinator.tracking(), TrackingState::None);
    }
}
