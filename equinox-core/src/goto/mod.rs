//! Goto, park and meridian-flip coordination

pub mod coordinator;
pub mod kinematics;

pub use coordinator::{
    GotoContext, GotoCoordinator, GotoTarget, SlewLeg, SlewPlan, SlewProgress, SlewPurpose,
};
pub use kinematics::MountKind;
