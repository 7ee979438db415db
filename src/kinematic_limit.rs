use crate::math::{is_positive, is_zero};
use crate::vector3::Vector3;

/// Maximum speed or acceleration achievable along `direction` given a
/// horizontal limit and separate climb/descent limits.
///
/// All limits are treated as magnitudes. A zero direction or any zero limit
/// yields 0.
pub fn kinematic_limit(direction: Vector3, max_xy: f64, max_z_pos: f64, max_z_neg: f64) -> f64 {
    if is_zero(direction.length_squared())
        || is_zero(max_xy)
        || is_zero(max_z_pos)
        || is_zero(max_z_neg)
    {
        return 0.0;
    }

    let max_xy = max_xy.abs();
    let max_z_pos = max_z_pos.abs();
    let max_z_neg = max_z_neg.abs();

    let unit_direction = direction.normalized();
    let xy_length = unit_direction.xy().length();

    // vertical only
    if is_zero(xy_length) {
        return if is_positive(unit_direction.z) {
            max_z_pos
        } else {
            max_z_neg
        };
    }

    // horizontal only
    if is_zero(unit_direction.z) {
        return max_xy;
    }

    let slope = unit_direction.z / xy_length;
    if is_positive(slope) {
        if slope.abs() < max_z_pos / max_xy {
            return max_xy / xy_length;
        }
        return (max_z_pos / unit_direction.z).abs();
    }

    // descending
    if slope.abs() < max_z_neg / max_xy {
        return max_xy / xy_length;
    }
    (max_z_neg / unit_direction.z).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn degenerate_inputs_give_zero() {
        assert_eq!(kinematic_limit(Vector3::zero(), 500.0, 250.0, 150.0), 0.0);
        let dir = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(kinematic_limit(dir, 0.0, 250.0, 150.0), 0.0);
        assert_eq!(kinematic_limit(dir, 500.0, 0.0, 150.0), 0.0);
        assert_eq!(kinematic_limit(dir, 500.0, 250.0, 0.0), 0.0);
    }

    #[test]
    fn axis_aligned_directions() {
        assert_eq!(kinematic_limit(Vector3::new(3.0, 4.0, 0.0), 500.0, 250.0, 150.0), 500.0);
        assert_eq!(kinematic_limit(Vector3::new(0.0, 0.0, 10.0), 500.0, 250.0, 150.0), 250.0);
        assert_eq!(kinematic_limit(Vector3::new(0.0, 0.0, -10.0), 500.0, 250.0, 150.0), 150.0);
    }

    #[test]
    fn negative_limits_are_magnitudes() {
        let limit = kinematic_limit(Vector3::new(0.0, 0.0, -1.0), -500.0, -250.0, -150.0);
        assert_eq!(limit, 150.0);
    }

    #[test]
    fn shallow_climb_is_horizontally_limited() {
        // slope 0.1 is below the 250/500 climb ratio
        let dir = Vector3::new(1.0, 0.0, 0.1);
        let unit = dir.normalized();
        let limit = kinematic_limit(dir, 500.0, 250.0, 150.0);
        assert!((limit - 500.0 / unit.xy().length()).abs() < EPS);
        // projection onto xy never exceeds the horizontal limit
        assert!(limit * unit.xy().length() <= 500.0 + EPS);
    }

    #[test]
    fn steep_descent_is_vertically_limited() {
        let dir = Vector3::new(1.0, 0.0, -1.0);
        let unit = dir.normalized();
        let limit = kinematic_limit(dir, 500.0, 250.0, 150.0);
        assert!((limit - 150.0 / unit.z.abs()).abs() < EPS);
        assert!(limit * unit.z.abs() <= 150.0 + EPS);
        assert!(limit * unit.xy().length() <= 500.0 + EPS);
    }
}
