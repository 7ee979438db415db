/// Shape of the jerk profile inside a segment.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    /// Jerk is held at `jerk_ref`.
    #[default]
    ConstantJerk,
    /// Raised cosine jerk rising from zero to `jerk_ref`.
    RisingJerk,
    /// Raised cosine jerk falling from `jerk_ref` to zero.
    FallingJerk,
}

/// One entry of a leg's timing table. Every field describes the state at the
/// end of the segment; the start state is the previous entry's end state.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub jerk_ref: f64,
    pub kind: SegmentKind,
    pub end_time: f64,
    pub end_accel: f64,
    pub end_vel: f64,
    pub end_pos: f64,
}

impl Segment {
    pub fn new(
        end_time: f64,
        kind: SegmentKind,
        jerk_ref: f64,
        end_accel: f64,
        end_vel: f64,
        end_pos: f64,
    ) -> Self {
        Self {
            jerk_ref,
            kind,
            end_time,
            end_accel,
            end_vel,
            end_pos,
        }
    }

    fn is_finite(&self) -> bool {
        self.jerk_ref.is_finite()
            && self.end_time.is_finite()
            && self.end_accel.is_finite()
            && self.end_vel.is_finite()
            && self.end_pos.is_finite()
    }
}

/// Number of segments in a fully built leg.
pub const SEGMENTS_MAX: usize = 23;

// Named checkpoints in the segment table.
pub const SEG_INIT: usize = 0;
pub const SEG_TURN_IN: usize = 4;
pub const SEG_ACCEL_END: usize = 7;
pub const SEG_SPEED_CHANGE_END: usize = 14;
pub const SEG_CONST: usize = 15;
pub const SEG_TURN_OUT: usize = 15;
pub const SEG_DECEL_END: usize = 22;

/// Checks a table against the leg invariants: finite entries, non-negative
/// velocity, non-decreasing time and position, zero final acceleration.
pub fn segments_valid(segments: &[Segment]) -> bool {
    use crate::math::{is_negative, is_zero};

    if segments.len() != SEGMENTS_MAX {
        return false;
    }

    for (i, seg) in segments.iter().enumerate() {
        if !seg.is_finite() || is_negative(seg.end_vel) {
            return false;
        }
        if i >= 1 {
            let prev = &segments[i - 1];
            if is_negative(seg.end_time - prev.end_time)
                || is_negative(seg.end_pos - prev.end_pos)
            {
                return false;
            }
        }
    }

    is_zero(segments[SEGMENTS_MAX - 1].end_accel)
}

/// Kinematic state of a leg at one instant, measured along its track.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct KinematicSample {
    pub time: f64,
    pub pos: f64,
    pub vel: f64,
    pub accel: f64,
    pub jerk: f64,
    pub snap: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_table() -> [Segment; SEGMENTS_MAX] {
        let mut table = [Segment::default(); SEGMENTS_MAX];
        for (i, seg) in table.iter_mut().enumerate() {
            *seg = Segment::new(i as f64, SegmentKind::ConstantJerk, 0.0, 0.0, 1.0, i as f64);
        }
        table
    }

    #[test]
    fn accepts_monotonic_table() {
        assert!(segments_valid(&ramp_table()));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!segments_valid(&ramp_table()[..SEGMENTS_MAX - 1]));
    }

    #[test]
    fn rejects_broken_invariants() {
        let mut table = ramp_table();
        table[10].end_time = 2.0;
        assert!(!segments_valid(&table));

        let mut table = ramp_table();
        table[3].end_pos = 0.5;
        assert!(!segments_valid(&table));

        let mut table = ramp_table();
        table[5].end_vel = -1.0;
        assert!(!segments_valid(&table));

        let mut table = ramp_table();
        table[SEG_DECEL_END].end_accel = 1.0;
        assert!(!segments_valid(&table));

        let mut table = ramp_table();
        table[8].jerk_ref = f64::NAN;
        assert!(!segments_valid(&table));
    }
}
