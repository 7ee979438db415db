use std::f64::consts::PI;

use crate::error::SCurveError;
use crate::math::{is_negative, is_positive, is_zero};

/// Segment durations for one half of a symmetric S-curve, together with the
/// (possibly reduced) peak jerk they were solved for.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct PathTiming {
    /// Peak jerk of the raised cosine ramps.
    pub jerk_max: f64,
    /// Duration of each raised cosine jerk ramp.
    pub tj: f64,
    /// Constant jerk dwell while acceleration rises.
    pub t2: f64,
    /// Constant acceleration dwell.
    pub t4: f64,
    /// Constant jerk dwell while acceleration falls.
    pub t6: f64,
}

impl PathTiming {
    fn is_valid(&self) -> bool {
        [self.jerk_max, self.tj, self.t2, self.t4, self.t6]
            .iter()
            .all(|t| t.is_finite() && !is_negative(*t))
    }
}

/// Solve the segment times of a trigonometric S-curve half path.
///
/// * `sm` - maximum snap
/// * `jm` - maximum jerk
/// * `v0` - initial speed
/// * `am` - maximum acceleration
/// * `vm` - maximum speed
/// * `l` - length of the half path
///
/// The result is the closed form minimum time solution selected by which of
/// the acceleration, velocity and length constraints are active.
pub fn calculate_path(
    sm: f64,
    jm: f64,
    v0: f64,
    am: f64,
    vm: f64,
    l: f64,
) -> Result<PathTiming, SCurveError> {
    if !is_positive(sm)
        || !is_positive(jm)
        || !is_positive(am)
        || !is_positive(vm)
        || !is_positive(l)
    {
        return Err(SCurveError::InvalidKinematicParameters);
    }

    if v0 >= vm {
        return Ok(PathTiming::default());
    }

    let mut jm = jm;
    let mut am = am;

    // Peak snap of the raised cosine occurs at tj/2, which fixes tj.
    let mut tj = jm * PI / (2.0 * sm);

    let accel_1 = (vm - v0) / (2.0 * tj);
    let accel_2 = (l + 4.0 * v0 * tj) / (4.0 * tj * tj);
    let at = am.min(accel_1).min(accel_2);

    let (t2, t4, t6);
    if at.abs() < jm * tj {
        if is_zero(v0) {
            // shrink the jerk ramp so the snap limit still holds
            tj = tj
                .min((l * PI / (8.0 * sm)).powf(1.0 / 4.0))
                .min((vm * PI / (4.0 * sm)).powf(1.0 / 3.0))
                .min((am * PI / (2.0 * sm)).sqrt());
            jm = 2.0 * sm * tj / PI;
            am = jm * tj;
        } else {
            // speed change keeps tj and reduces jerk instead
            am = at;
            jm = am / tj;
        }

        let exceed_amax = vm <= v0 + 2.0 * am * tj;
        let exceed_vmax = l <= 4.0 * v0 * tj + 4.0 * am * tj * tj;
        if exceed_amax || exceed_vmax {
            t2 = 0.0;
            t4 = 0.0;
            t6 = 0.0;
        } else {
            t2 = 0.0;
            t4 = const_accel_time(jm, v0, am, vm, l, tj).max(0.0);
            t6 = 0.0;
        }
    } else if (vm < v0 + am * tj + (am * am) / jm)
        || (l < 1.0 / (jm * jm) * (am * am * am + am * jm * (v0 * 2.0 + am * tj * 2.0))
            + v0 * tj * 2.0
            + am * (tj * tj))
    {
        // constant jerk dwell but no constant acceleration
        am = am
            .min(velocity_limited_accel(jm, v0, vm, tj))
            .min(length_limited_accel(jm, v0, l, tj));
        t2 = am / jm - tj;
        t4 = 0.0;
        t6 = t2;
    } else {
        t2 = am / jm - tj;
        t4 = const_accel_time(jm, v0, am, vm, l, tj).max(0.0);
        t6 = t2;
    }

    let timing = PathTiming {
        jerk_max: jm,
        tj,
        t2,
        t4,
        t6,
    };

    if !timing.is_valid() {
        return Err(SCurveError::InvalidPathOutputs);
    }
    Ok(timing)
}

/// Constant acceleration dwell limited by either the speed limit or the path
/// length, whichever is reached first.
fn const_accel_time(jm: f64, v0: f64, am: f64, vm: f64, l: f64, tj: f64) -> f64 {
    let vel_limited = -(v0 - vm + am * tj + (am * am) / jm) / am;

    let discriminant = (am * am * am * am) * (1.0 / 4.0)
        + (jm * jm) * (v0 * v0)
        + (am * am) * (jm * jm) * (tj * tj) * (1.0 / 4.0)
        + am * (jm * jm) * l * 2.0
        - (am * am) * jm * v0
        + (am * am * am) * jm * tj * (1.0 / 2.0)
        - am * (jm * jm) * v0 * tj;
    let root = discriminant.sqrt();
    let base = (am * am) * (-3.0 / 2.0) - jm * v0 - am * jm * tj * (3.0 / 2.0);
    let length_limited = ((base + root) / (am * jm)).max((base - root) / (am * jm));

    vel_limited.min(length_limited)
}

/// Largest acceleration whose jerk-limited ramp does not overshoot `vm`.
fn velocity_limited_accel(jm: f64, v0: f64, vm: f64, tj: f64) -> f64 {
    let root = ((v0 * -4.0 + vm * 4.0 + jm * (tj * tj)) / jm).sqrt();
    (jm * (tj + root) * (-1.0 / 2.0)).max(jm * (tj - root) * (-1.0 / 2.0))
}

/// Largest acceleration whose ramp fits within the half length `l`, the real
/// root of the cubic in acceleration.
fn length_limited_accel(jm: f64, v0: f64, l: f64, tj: f64) -> f64 {
    let p = (jm * jm) * (tj * tj) * (1.0 / 9.0) - jm * v0 * (2.0 / 3.0);
    let q = -(jm * jm) * l * (1.0 / 2.0) + (jm * jm * jm) * (tj * tj * tj) * (8.0 / 27.0)
        - jm * tj * ((jm * jm) * (tj * tj) + jm * v0 * 2.0) * (1.0 / 3.0)
        + (jm * jm) * v0 * tj;
    let w = ((q * q) - (p * p * p)).sqrt() - q;
    let w_cbrt = w.powf(1.0 / 3.0);
    jm * tj * (-2.0 / 3.0) + p / w_cbrt + w_cbrt
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Distance and end speed of a half path built from `timing`, integrated
    /// from the closed form segment increments.
    fn integrate(timing: &PathTiming, v0: f64) -> (f64, f64) {
        let PathTiming { jerk_max: jm, tj, t2, t4, t6 } = *timing;
        let dt = 1e-5;
        let total = 4.0 * tj + t2 + t4 + t6;
        let phases = [
            (tj, 1),
            (t2, 0),
            (tj, 2),
            (t4, 3),
            (tj, 4),
            (t6, 5),
            (tj, 6),
        ];
        let (mut a, mut v, mut p) = (0.0, v0, 0.0);
        let mut t = 0.0;
        while t < total {
            // locate phase and its local time
            let mut start = 0.0;
            let mut jerk = 0.0;
            for &(duration, kind) in phases.iter() {
                if t < start + duration {
                    let tau = t - start;
                    let beta = PI / tj;
                    jerk = match kind {
                        0 => jm,
                        1 => 0.5 * jm * (1.0 - (beta * tau).cos()),
                        2 => 0.5 * jm * (1.0 + (beta * tau).cos()),
                        3 => 0.0,
                        4 => -0.5 * jm * (1.0 - (beta * tau).cos()),
                        5 => -jm,
                        _ => -0.5 * jm * (1.0 + (beta * tau).cos()),
                    };
                    break;
                }
                start += duration;
            }
            p += v * dt + 0.5 * a * dt * dt;
            v += a * dt + 0.5 * jerk * dt * dt;
            a += jerk * dt;
            t += dt;
        }
        (p, v)
    }

    #[test]
    fn rejects_non_positive_limits() {
        assert_eq!(
            calculate_path(0.0, 500.0, 0.0, 250.0, 500.0, 500.0),
            Err(SCurveError::InvalidKinematicParameters)
        );
        assert_eq!(
            calculate_path(1000.0, 500.0, 0.0, -1.0, 500.0, 500.0),
            Err(SCurveError::InvalidKinematicParameters)
        );
        assert_eq!(
            calculate_path(1000.0, 500.0, 0.0, 250.0, 500.0, 0.0),
            Err(SCurveError::InvalidKinematicParameters)
        );
    }

    #[test]
    fn no_speed_change_is_empty() {
        let timing = calculate_path(1000.0, 500.0, 500.0, 250.0, 500.0, 500.0).unwrap();
        assert_eq!(timing, PathTiming::default());
    }

    #[test]
    fn short_path_shrinks_jerk_ramp() {
        let (sm, jm, am, vm, l) = (1000.0, 500.0, 250.0, 500.0, 500.0);
        let timing = calculate_path(sm, jm, 0.0, am, vm, l).unwrap();
        assert!(timing.tj < jm * PI / (2.0 * sm));
        assert!(timing.jerk_max <= jm + 1e-9);
        assert_eq!(timing.t2, 0.0);
        assert_eq!(timing.t6, 0.0);
        assert!(timing.t4 > 0.0);

        let (p, v) = integrate(&timing, 0.0);
        assert!(p <= l * 1.001, "half path overshoots: {}", p);
        assert!(v <= vm);
    }

    #[test]
    fn long_path_reaches_speed_limit() {
        let (sm, jm, am, vm, l) = (5000.0, 500.0, 250.0, 500.0, 5000.0);
        let timing = calculate_path(sm, jm, 0.0, am, vm, l).unwrap();
        assert!(timing.t2 > 0.0);
        assert_eq!(timing.t2, timing.t6);
        assert!(timing.t4 > 0.0);

        let (p, v) = integrate(&timing, 0.0);
        assert!((v - vm).abs() < 0.5, "end speed {}", v);
        assert!(p < l);
    }

    #[test]
    fn speed_change_from_moving_start() {
        let timing = calculate_path(1000.0, 500.0, 200.0, 250.0, 500.0, 2000.0).unwrap();
        let (_, v) = integrate(&timing, 200.0);
        assert!(v <= 500.0 + 0.5);
        assert!(v > 200.0);
    }
}
