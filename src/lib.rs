//! # scurve_wpnav
//!
//! Snap limited S-curve trajectories for straight line waypoint navigation.
//!
//! This library provides the following modules:
//! - `path_timing` for solving the segment times of a half leg.
//! - `scurve` for building and stepping a single 23 segment leg.
//! - `wpnav` for sequencing legs through waypoints with corner blending.
//! - `mission` for flying a waypoint list at a fixed tick rate.
//! - `limits` for the attitude and position controller limits the legs obey.
//! - `params` for loading tuning parameters from TOML.
//! - `observer` for recording per-leg samples.
//!
//! Author: Anton Khrustalev, creapunk

pub mod error;
pub mod kinematic_limit;
pub mod limits;
pub mod math;
pub mod mission;
pub mod observer;
pub mod params;
pub mod path_timing;
pub mod scurve;
pub mod segment;
pub mod vector3;
pub mod wpnav;

// Re-export main structs for convenience:
pub use error::SCurveError;
pub use kinematic_limit::kinematic_limit;
pub use limits::{AccelFilterLimits, AttitudeLimits, PosControl, PositionLimits};
pub use mission::{MissionSample, WaypointMission};
pub use observer::{KinematicLog, KinematicObserver, LegLog};
pub use params::{AttitudeParams, Params, ParamsError, PosControlParams, WpNavParams};
pub use path_timing::{calculate_path, PathTiming};
pub use scurve::{SCurve, TargetSample, TrackLimits};
pub use segment::{KinematicSample, Segment, SegmentKind};
pub use vector3::Vector3;
pub use wpnav::WPNav;
