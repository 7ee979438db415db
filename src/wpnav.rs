use std::f64::consts::PI;

use log::{debug, info};

use crate::error::SCurveError;
use crate::limits::{AttitudeLimits, PositionLimits};
use crate::math::{angle_to_accel, is_positive, is_zero, GRAVITY_MSS};
use crate::observer::KinematicObserver;
use crate::params::WpNavParams;
use crate::scurve::{SCurve, TargetSample, TrackLimits};
use crate::vector3::Vector3;

/// Fallback horizontal acceleration, cm/s/s.
const WPNAV_ACCELERATION: f64 = 250.0;
const WPNAV_WP_RADIUS_MIN: f64 = 5.0;
const WPNAV_WP_SPEED_MIN: f64 = 20.0;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
struct WpNavFlags {
    reached_destination: bool,
    fast_waypoint: bool,
}

/// Straight line waypoint navigator.
///
/// Keeps three legs in flight: the previous leg finishing its corner blend,
/// the current leg, and an optional pre-built next leg that lets the vehicle
/// pass the destination without stopping. Legs move forward through the
/// three slots as destinations are set.
#[derive(Clone, Debug)]
pub struct WPNav<A, P> {
    attitude: A,
    pos_control: P,

    /// Jerk parameter, m/s/s/s.
    wp_jerk: f64,
    accel_corner_param: f64,
    wp_accel_cmss: f64,
    wp_accel_z_cmss: f64,
    wp_speed_cms: f64,
    wp_speed_up_cms: f64,
    wp_speed_down_cms: f64,
    wp_desired_speed_xy_cms: f64,
    wp_radius_cm: f64,

    scurve_accel_corner: f64,
    /// Leg jerk limit, m/s/s/s.
    scurve_jerk: f64,
    /// Leg snap limit, m/s/s/s/s.
    scurve_snap: f64,

    origin: Vector3,
    destination: Vector3,

    scurve_prev_leg: SCurve,
    scurve_this_leg: SCurve,
    scurve_next_leg: SCurve,

    wp_number: u32,
    track_scalar_dt: f64,
    flags: WpNavFlags,
}

impl<A, P> WPNav<A, P>
where
    A: AttitudeLimits,
    P: PositionLimits,
{
    pub fn new(params: &WpNavParams, attitude: A, pos_control: P) -> Self {
        Self {
            attitude,
            pos_control,
            wp_jerk: params.jerk_msss,
            accel_corner_param: params.accel_corner_cmss,
            wp_accel_cmss: params.accel_cmss,
            wp_accel_z_cmss: params.accel_z_cmss,
            wp_speed_cms: params.speed_cms,
            wp_speed_up_cms: params.speed_up_cms,
            wp_speed_down_cms: params.speed_down_cms,
            wp_desired_speed_xy_cms: 0.0,
            wp_radius_cm: params.radius_cm,
            scurve_accel_corner: 0.0,
            scurve_jerk: 0.0,
            scurve_snap: 0.0,
            origin: Vector3::zero(),
            destination: Vector3::zero(),
            scurve_prev_leg: SCurve::new(0),
            scurve_this_leg: SCurve::new(0),
            scurve_next_leg: SCurve::new(0),
            wp_number: 0,
            track_scalar_dt: 1.0,
            flags: WpNavFlags::default(),
        }
    }

    /// Sanitises the limits and parks the navigator at `stopping_point`.
    ///
    /// `speed_cms` overrides the configured cruise speed when positive.
    pub fn wp_and_spline_init(&mut self, speed_cms: f64, stopping_point: Vector3) {
        self.scurve_accel_corner = if is_positive(self.accel_corner_param) {
            self.accel_corner_param
        } else {
            angle_to_accel(self.pos_control.lean_angle_max_cd() * 0.01) * 100.0
        };

        let wp_accel = self.wp_accel_cmss.min(self.scurve_accel_corner);
        let wp_accel = if wp_accel <= 0.0 { WPNAV_ACCELERATION } else { wp_accel };
        if wp_accel != self.wp_accel_cmss {
            debug!(
                "Waypoint accel clamped from {:.1} to {:.1} cm/s/s",
                self.wp_accel_cmss, wp_accel
            );
        }
        self.wp_accel_cmss = wp_accel;

        if self.wp_radius_cm < WPNAV_WP_RADIUS_MIN {
            debug!(
                "Waypoint radius raised from {:.1} to {:.1} cm",
                self.wp_radius_cm, WPNAV_WP_RADIUS_MIN
            );
            self.wp_radius_cm = WPNAV_WP_RADIUS_MIN;
        }
        if self.wp_speed_cms < WPNAV_WP_SPEED_MIN {
            debug!(
                "Waypoint speed raised from {:.1} to {:.1} cm/s",
                self.wp_speed_cms, WPNAV_WP_SPEED_MIN
            );
            self.wp_speed_cms = WPNAV_WP_SPEED_MIN;
        }

        self.wp_desired_speed_xy_cms = if is_positive(speed_cms) {
            speed_cms
        } else {
            self.wp_speed_cms
        };
        self.wp_desired_speed_xy_cms = self.wp_desired_speed_xy_cms.max(WPNAV_WP_SPEED_MIN);

        self.pos_control.set_max_speed_accel_xy(self.wp_desired_speed_xy_cms, self.wp_accel_cmss);
        self.pos_control.set_max_speed_accel_z(
            -self.default_speed_down(),
            self.wp_speed_up_cms,
            self.wp_accel_z_cmss,
        );

        if !is_positive(self.wp_jerk) {
            self.wp_jerk = self.wp_accel_cmss;
        }
        self.calc_scurve_jerk_and_snap();

        self.scurve_prev_leg = SCurve::new(self.wp_number);
        self.scurve_this_leg = SCurve::new(self.wp_number + 1);
        self.scurve_next_leg = SCurve::new(self.wp_number + 2);
        self.track_scalar_dt = 1.0;

        self.flags.reached_destination = true;
        self.flags.fast_waypoint = false;

        self.origin = stopping_point;
        self.destination = stopping_point;

        self.wp_number += 1;
    }

    /// Derives the leg jerk and snap limits from the attitude controller.
    pub fn calc_scurve_jerk_and_snap(&mut self) {
        let attitude = &self.attitude;

        // jerk the angular rate limit allows
        let jerk =
            attitude.ang_vel_roll_max_rads().min(attitude.ang_vel_pitch_max_rads()) * GRAVITY_MSS;
        let jerk = if is_zero(jerk) { self.wp_jerk } else { jerk.min(self.wp_jerk) };

        // multicopters lean to accelerate, so the attitude time constant
        // bounds how quickly acceleration can change
        let mut snap = (jerk * PI) / (2.0 * attitude.input_tc().max(0.1));
        let snap_max =
            attitude.accel_roll_max_radss().min(attitude.accel_pitch_max_radss()) * GRAVITY_MSS;
        if is_positive(snap_max) {
            snap = snap.min(snap_max);
        }
        // keep half the available snap in reserve
        snap *= 0.5;

        if jerk != self.scurve_jerk || snap != self.scurve_snap {
            debug!("S-curve jerk {:.3} m/s/s/s, snap {:.3} m/s/s/s/s", jerk, snap);
        }
        self.scurve_jerk = jerk;
        self.scurve_snap = snap;
    }

    /// Sets the next destination, starting from rest.
    pub fn set_wp_destination(&mut self, destination: Vector3) -> Result<(), SCurveError> {
        self.set_wp_destination_with_speed(destination, 0.0)
    }

    /// Sets the next destination. The current leg becomes the previous leg.
    ///
    /// A pre-built next leg is used when a fast waypoint is pending,
    /// otherwise a new leg is built from the current destination, starting
    /// at `origin_speed` when that is non-zero. On error nothing changes.
    pub fn set_wp_destination_with_speed(
        &mut self,
        destination: Vector3,
        origin_speed: f64,
    ) -> Result<(), SCurveError> {
        let wp_number = self.wp_number + 1;

        let this_leg = if self.flags.fast_waypoint && !self.scurve_next_leg.finished() {
            std::mem::take(&mut self.scurve_next_leg)
        } else {
            let mut leg = SCurve::new(wp_number);
            leg.calculate_track(self.destination, destination, &self.track_limits())?;
            if !is_zero(origin_speed) {
                leg.set_origin_speed_max(origin_speed)?;
            }
            leg
        };

        self.wp_number = wp_number;
        self.origin = self.destination;
        self.destination = destination;
        self.scurve_prev_leg = std::mem::replace(&mut self.scurve_this_leg, this_leg);
        self.scurve_next_leg = SCurve::new(wp_number + 1);

        self.flags.fast_waypoint = false;
        self.flags.reached_destination = false;
        Ok(())
    }

    /// Pre-builds the leg after the current destination so the vehicle can
    /// blend through it.
    pub fn set_wp_destination_next(&mut self, destination: Vector3) -> Result<(), SCurveError> {
        let mut leg = SCurve::new(self.wp_number + 1);
        leg.calculate_track(self.destination, destination, &self.track_limits())?;
        self.scurve_next_leg = leg;
        self.flags.fast_waypoint = true;
        Ok(())
    }

    /// Moves the target along the track and returns it.
    pub fn advance_wp_target_along_track_observed(
        &mut self,
        dt: f64,
        observer: &mut dyn KinematicObserver,
    ) -> TargetSample {
        let mut target = TargetSample::at(self.origin);

        let s_finished = self.scurve_this_leg.advance_target_along_track_observed(
            &mut self.scurve_prev_leg,
            &mut self.scurve_next_leg,
            self.wp_radius_cm,
            self.scurve_accel_corner,
            self.flags.fast_waypoint,
            self.track_scalar_dt * dt,
            &mut target,
            observer,
        );

        // the target stands in for the vehicle position
        if !self.flags.reached_destination && s_finished {
            if self.flags.fast_waypoint {
                // fast waypoints only need the leg to finish
                self.flags.reached_destination = true;
            } else {
                let dist_to_dest = target.pos - self.destination;
                if dist_to_dest.length_squared() <= self.wp_radius_cm * self.wp_radius_cm {
                    self.flags.reached_destination = true;
                }
            }

            if self.flags.reached_destination {
                info!("Reached waypoint {} at {:?}", self.wp_number, self.destination);
            }
        }

        target
    }

    pub fn advance_wp_target_along_track(&mut self, dt: f64) -> TargetSample {
        self.advance_wp_target_along_track_observed(dt, &mut ())
    }

    fn track_limits(&self) -> TrackLimits {
        TrackLimits {
            speed_xy: self.pos_control.max_speed_xy_cms(),
            speed_up: self.pos_control.max_speed_up_cms(),
            speed_down: self.pos_control.max_speed_down_cms(),
            accel_xy: self.wp_accel_cmss,
            accel_z: self.wp_accel_z_cmss,
            snap_max: self.scurve_snap * 100.0,
            jerk_max: self.scurve_jerk * 100.0,
        }
    }

    fn default_speed_down(&self) -> f64 {
        self.wp_speed_down_cms.abs()
    }

    pub fn reached_wp_destination(&self) -> bool {
        self.flags.reached_destination
    }

    pub fn fast_waypoint(&self) -> bool {
        self.flags.fast_waypoint
    }

    pub fn origin(&self) -> Vector3 {
        self.origin
    }

    pub fn destination(&self) -> Vector3 {
        self.destination
    }

    pub fn wp_radius_cm(&self) -> f64 {
        self.wp_radius_cm
    }

    pub fn accel_corner_cmss(&self) -> f64 {
        self.scurve_accel_corner
    }

    pub fn wp_accel_cmss(&self) -> f64 {
        self.wp_accel_cmss
    }

    pub fn wp_desired_speed_xy_cms(&self) -> f64 {
        self.wp_desired_speed_xy_cms
    }

    /// Leg jerk limit in m/s/s/s.
    pub fn scurve_jerk(&self) -> f64 {
        self.scurve_jerk
    }

    /// Leg snap limit in m/s/s/s/s.
    pub fn scurve_snap(&self) -> f64 {
        self.scurve_snap
    }

    pub fn wp_number(&self) -> u32 {
        self.wp_number
    }

    pub fn prev_leg(&self) -> &SCurve {
        &self.scurve_prev_leg
    }

    pub fn this_leg(&self) -> &SCurve {
        &self.scurve_this_leg
    }

    pub fn next_leg(&self) -> &SCurve {
        &self.scurve_next_leg
    }

    pub fn pos_control(&self) -> &P {
        &self.pos_control
    }
}
