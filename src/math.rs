//! Float comparison helpers and unit conversions shared by the shaper.

/// Single precision machine epsilon, used as the comparison tolerance.
pub const FLT_EPSILON: f64 = 1.192_092_895_507_812_5e-7;

/// Standard gravity in m/s/s.
pub const GRAVITY_MSS: f64 = 9.80665;

pub fn is_zero(value: f64) -> bool {
    value.abs() < FLT_EPSILON
}

pub fn is_positive(value: f64) -> bool {
    value >= FLT_EPSILON
}

pub fn is_negative(value: f64) -> bool {
    value <= -FLT_EPSILON
}

pub fn is_equal(v1: f64, v2: f64) -> bool {
    is_zero(v1 - v2)
}

pub fn radians(deg: f64) -> f64 {
    deg.to_radians()
}

/// Convert a maximum lean angle in degrees to an acceleration limit in m/s/s.
pub fn angle_to_accel(angle_deg: f64) -> f64 {
    GRAVITY_MSS * radians(angle_deg).tan()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_helpers() {
        assert!(is_zero(1e-9));
        assert!(!is_zero(1e-6));
        assert!(is_positive(1e-6));
        assert!(!is_positive(1e-9));
        assert!(is_negative(-1e-6));
        assert!(!is_negative(-1e-9));
        assert!(is_equal(1.0, 1.0 + 1e-9));
    }

    #[test]
    fn lean_angle_to_accel() {
        assert!(angle_to_accel(0.0).abs() < 1e-12);
        assert!((angle_to_accel(45.0) - GRAVITY_MSS).abs() < 1e-9);
    }
}
