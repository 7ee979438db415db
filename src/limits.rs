//! Interfaces to the attitude and position controllers that bound the
//! navigator's kinematics, and a position controller limiter built on them.

use std::f64::consts::PI;

use log::debug;

use crate::math::{is_negative, is_positive, radians, GRAVITY_MSS};
use crate::params::{AttitudeParams, PosControlParams};

/// Limits of the attitude controller.
pub trait AttitudeLimits {
    fn ang_vel_roll_max_rads(&self) -> f64;
    fn ang_vel_pitch_max_rads(&self) -> f64;
    fn accel_roll_max_radss(&self) -> f64;
    fn accel_pitch_max_radss(&self) -> f64;
    /// Input shaping time constant in seconds.
    fn input_tc(&self) -> f64;
    fn lean_angle_max_cd(&self) -> f64;
    /// True when body frame rate feed-forward is enabled.
    fn bf_feedforward(&self) -> bool;
}

/// Corner frequencies of the vertical acceleration controller filters.
pub trait AccelFilterLimits {
    fn filt_t_hz(&self) -> f64;
    fn filt_e_hz(&self) -> f64;
}

/// Speed, acceleration and jerk limits held by a position controller.
pub trait PositionLimits {
    fn lean_angle_max_cd(&self) -> f64;
    fn max_speed_xy_cms(&self) -> f64;
    fn max_speed_up_cms(&self) -> f64;
    /// Always zero or negative.
    fn max_speed_down_cms(&self) -> f64;
    fn set_max_speed_accel_xy(&mut self, speed_cms: f64, accel_cmss: f64);
    /// `speed_down` is read as a descent speed whatever its sign.
    fn set_max_speed_accel_z(&mut self, speed_down: f64, speed_up: f64, accel_cmss: f64);
    fn jerk_max_xy_cmsss(&self) -> f64;
    fn jerk_max_z_cmsss(&self) -> f64;
}

impl AttitudeLimits for AttitudeParams {
    fn ang_vel_roll_max_rads(&self) -> f64 {
        radians(self.rate_roll_max_degs)
    }

    fn ang_vel_pitch_max_rads(&self) -> f64 {
        radians(self.rate_pitch_max_degs)
    }

    fn accel_roll_max_radss(&self) -> f64 {
        radians(self.accel_roll_max_cdss * 0.01)
    }

    fn accel_pitch_max_radss(&self) -> f64 {
        radians(self.accel_pitch_max_cdss * 0.01)
    }

    fn input_tc(&self) -> f64 {
        self.input_tc
    }

    fn lean_angle_max_cd(&self) -> f64 {
        self.angle_max_cd
    }

    fn bf_feedforward(&self) -> bool {
        self.rate_ff_enabled
    }
}

impl AccelFilterLimits for PosControlParams {
    fn filt_t_hz(&self) -> f64 {
        self.accel_z_filt_t_hz
    }

    fn filt_e_hz(&self) -> f64 {
        self.accel_z_filt_e_hz
    }
}

/// Position controller limiter.
///
/// Stores the speed and acceleration limits pushed by the navigator and
/// derives jerk limits the attitude controller and the vertical acceleration
/// filters can follow.
#[derive(Clone, Debug)]
pub struct PosControl<A, F> {
    attitude: A,
    accel_z_filter: F,

    shaping_jerk_xy_msss: f64,
    shaping_jerk_z_msss: f64,
    lean_angle_max_deg: f64,

    jerk_max_xy_cmsss: f64,
    jerk_max_z_cmsss: f64,
    accel_max_xy_cmss: f64,
    accel_max_z_cmss: f64,
    vel_max_xy_cms: f64,
    vel_max_up_cms: f64,
    vel_max_down_cms: f64,
}

impl<A, F> PosControl<A, F>
where
    A: AttitudeLimits,
    F: AccelFilterLimits,
{
    /// Creates a limiter with no speed or acceleration limits set yet.
    pub fn new(params: &PosControlParams, attitude: A, accel_z_filter: F) -> Self {
        Self {
            attitude,
            accel_z_filter,
            shaping_jerk_xy_msss: params.jerk_xy_msss,
            shaping_jerk_z_msss: params.jerk_z_msss,
            lean_angle_max_deg: params.angle_max_deg,
            jerk_max_xy_cmsss: 0.0,
            jerk_max_z_cmsss: 0.0,
            accel_max_xy_cmss: 0.0,
            accel_max_z_cmss: 0.0,
            vel_max_xy_cms: 0.0,
            vel_max_up_cms: 0.0,
            vel_max_down_cms: 0.0,
        }
    }

    pub fn max_accel_xy_cmss(&self) -> f64 {
        self.accel_max_xy_cmss
    }

    pub fn max_accel_z_cmss(&self) -> f64 {
        self.accel_max_z_cmss
    }
}

impl PosControl<AttitudeParams, PosControlParams> {
    /// Limiter built directly from the parameter groups.
    pub fn from_params(params: &PosControlParams, attitude: &AttitudeParams) -> Self {
        Self::new(params, attitude.clone(), params.clone())
    }
}

impl<A, F> PositionLimits for PosControl<A, F>
where
    A: AttitudeLimits,
    F: AccelFilterLimits,
{
    fn lean_angle_max_cd(&self) -> f64 {
        if !is_positive(self.lean_angle_max_deg) {
            return self.attitude.lean_angle_max_cd();
        }
        self.lean_angle_max_deg * 100.0
    }

    fn max_speed_xy_cms(&self) -> f64 {
        self.vel_max_xy_cms
    }

    fn max_speed_up_cms(&self) -> f64 {
        self.vel_max_up_cms
    }

    fn max_speed_down_cms(&self) -> f64 {
        self.vel_max_down_cms
    }

    fn set_max_speed_accel_xy(&mut self, speed_cms: f64, accel_cmss: f64) {
        self.vel_max_xy_cms = speed_cms;
        self.accel_max_xy_cmss = accel_cmss;

        let attitude = &self.attitude;
        let ang_vel_max = attitude.ang_vel_roll_max_rads().min(attitude.ang_vel_pitch_max_rads());
        let ang_accel_max = attitude.accel_roll_max_radss().min(attitude.accel_pitch_max_radss());
        let jerk_max_cmsss = ang_vel_max * GRAVITY_MSS * 100.0;
        let snap_max_cmssss = ang_accel_max * GRAVITY_MSS * 100.0;

        self.jerk_max_xy_cmsss = self.shaping_jerk_xy_msss * 100.0;

        // angular rate bound
        if is_positive(jerk_max_cmsss) && attitude.bf_feedforward() {
            self.jerk_max_xy_cmsss = self.jerk_max_xy_cmsss.min(jerk_max_cmsss);
        }

        // average jerk reachable with the angular acceleration limit
        if is_positive(snap_max_cmssss) && attitude.bf_feedforward() {
            let average_jerk = 0.5 * (self.accel_max_xy_cmss * snap_max_cmssss).sqrt();
            self.jerk_max_xy_cmsss = average_jerk.min(self.jerk_max_xy_cmsss);
        }

        debug!(
            "XY limits: speed {:.1} cm/s, accel {:.1} cm/s/s, jerk {:.1} cm/s/s/s",
            self.vel_max_xy_cms, self.accel_max_xy_cmss, self.jerk_max_xy_cmsss
        );
    }

    fn set_max_speed_accel_z(&mut self, speed_down: f64, speed_up: f64, accel_cmss: f64) {
        let speed_down = -speed_down.abs();

        if is_negative(speed_down) {
            self.vel_max_down_cms = speed_down;
        }
        if is_positive(speed_up) {
            self.vel_max_up_cms = speed_up;
        }
        if is_positive(accel_cmss) {
            self.accel_max_z_cmss = accel_cmss;
        }

        // keep vertical jerk within what the accel filters pass
        let accel_bound = (GRAVITY_MSS * 100.0).min(self.accel_max_z_cmss);
        self.jerk_max_z_cmsss = self.shaping_jerk_z_msss * 100.0;
        for filt_hz in [self.accel_z_filter.filt_t_hz(), self.accel_z_filter.filt_e_hz()] {
            if is_positive(filt_hz) {
                self.jerk_max_z_cmsss =
                    self.jerk_max_z_cmsss.min(accel_bound * (2.0 * PI * filt_hz) / 5.0);
            }
        }

        debug!(
            "Z limits: down {:.1} cm/s, up {:.1} cm/s, accel {:.1} cm/s/s, jerk {:.1} cm/s/s/s",
            self.vel_max_down_cms, self.vel_max_up_cms, self.accel_max_z_cmss, self.jerk_max_z_cmsss
        );
    }

    fn jerk_max_xy_cmsss(&self) -> f64 {
        self.jerk_max_xy_cmsss
    }

    fn jerk_max_z_cmsss(&self) -> f64 {
        self.jerk_max_z_cmsss
    }
}
