use std::f64::consts::PI;

use log::{debug, trace, warn};

use crate::error::SCurveError;
use crate::kinematic_limit::kinematic_limit;
use crate::math::{is_equal, is_positive, is_zero};
use crate::observer::KinematicObserver;
use crate::path_timing::{calculate_path, PathTiming};
use crate::segment::*;
use crate::vector3::Vector3;

/// Speed, acceleration, snap and jerk limits used to build a leg.
///
/// Horizontal and vertical limits are combined along the track direction with
/// [`kinematic_limit`]. All values are treated as magnitudes.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct TrackLimits {
    pub speed_xy: f64,
    pub speed_up: f64,
    pub speed_down: f64,
    pub accel_xy: f64,
    pub accel_z: f64,
    pub snap_max: f64,
    pub jerk_max: f64,
}

/// Position, velocity, acceleration and jerk targets accumulated while
/// stepping one or more legs.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct TargetSample {
    pub pos: Vector3,
    pub vel: Vector3,
    pub accel: Vector3,
    pub jerk: Vector3,
}

impl TargetSample {
    /// Accumulators starting at `pos` with zero derivatives.
    pub fn at(pos: Vector3) -> Self {
        Self {
            pos,
            ..Default::default()
        }
    }

    fn add_along(&mut self, direction: Vector3, sample: &KinematicSample) {
        self.pos += direction * sample.pos;
        self.vel += direction * sample.vel;
        self.accel += direction * sample.accel;
        self.jerk += direction * sample.jerk;
    }
}

/// A single straight leg of a snap limited S-curve trajectory.
///
/// The leg is described by a fixed table of 23 segments:
///
/// * 1 initial segment holding the start state
/// * 7 segments accelerating to the cruise speed
/// * 7 speed change segments, empty unless the origin speed was changed
/// * 1 constant velocity segment
/// * 7 segments decelerating to rest
///
/// A leg with zero length keeps only its initial segment and is finished
/// from the start.
#[derive(Clone, Debug, PartialEq)]
pub struct SCurve {
    id: u32,
    segment: [Segment; SEGMENTS_MAX],
    num_segs: usize,

    /// Destination relative to origin.
    track: Vector3,
    /// Unit vector along `track`.
    delta_unit: Vector3,
    /// Squared distance travelled at the last step, for corner gating.
    position_sq: f64,
    /// Time cursor that defines the position on the leg.
    time: f64,

    snap_max: f64,
    jerk_max: f64,
    accel_max: f64,
    vel_max: f64,
}

impl Default for SCurve {
    fn default() -> Self {
        SCurve::new(0)
    }
}

impl SCurve {
    // Depth of the binary search on cruise speed after an origin speed change
    const ORIGIN_SPEED_SEARCH_DEPTH: usize = 40;

    /// Creates an empty leg. `id` tags the samples handed to observers.
    pub fn new(id: u32) -> Self {
        let mut scurve = SCurve {
            id,
            segment: [Segment::default(); SEGMENTS_MAX],
            num_segs: 0,
            track: Vector3::zero(),
            delta_unit: Vector3::zero(),
            position_sq: 0.0,
            time: 0.0,
            snap_max: 0.0,
            jerk_max: 0.0,
            accel_max: 0.0,
            vel_max: 0.0,
        };
        scurve.init();
        scurve
    }

    /// Clears the leg back to its unbuilt state, keeping its id.
    pub fn init(&mut self) {
        self.snap_max = 0.0;
        self.jerk_max = 0.0;
        self.accel_max = 0.0;
        self.vel_max = 0.0;
        self.time = 0.0;
        self.segment = [Segment::default(); SEGMENTS_MAX];
        self.num_segs = self.add_hold_start(0.0);
        self.track = Vector3::zero();
        self.delta_unit = Vector3::zero();
        self.position_sq = 0.0;
    }

    /// Builds the motion profile from `origin` to `destination`.
    ///
    /// A zero length track is not an error: the leg stays empty and reports
    /// itself finished. On any error the leg is reset so it is never advanced
    /// half built.
    pub fn calculate_track(
        &mut self,
        origin: Vector3,
        destination: Vector3,
        limits: &TrackLimits,
    ) -> Result<(), SCurveError> {
        self.init();

        let track = destination - origin;
        if track.is_zero() || is_zero(track.length_squared()) {
            return Ok(());
        }

        if let Err(e) = self.build_track(track, limits) {
            warn!("Leg {}: failed to build track {:?}: {}", self.id, track, e);
            self.init();
            return Err(e);
        }

        debug!(
            "Leg {}: length {:.1}, vel {:.1}, accel {:.1}, jerk {:.1}, snap {:.1}, \
             duration {:.3} s",
            self.id,
            self.track.length(),
            self.vel_max,
            self.accel_max,
            self.jerk_max,
            self.snap_max,
            self.time_end()
        );
        Ok(())
    }

    fn build_track(&mut self, track: Vector3, limits: &TrackLimits) -> Result<(), SCurveError> {
        self.snap_max = limits.snap_max;
        self.jerk_max = limits.jerk_max;
        self.set_kinematic_limits(track, limits);

        if !is_positive(self.snap_max)
            || !is_positive(self.jerk_max)
            || !is_positive(self.accel_max)
            || !is_positive(self.vel_max)
        {
            return Err(SCurveError::InvalidKinematicParameters);
        }

        self.track = track;
        self.delta_unit = track.normalized();
        self.add_segments(track.length())?;

        if !self.is_valid() {
            return Err(SCurveError::InvalidPath);
        }
        Ok(())
    }

    fn set_kinematic_limits(&mut self, direction: Vector3, limits: &TrackLimits) {
        self.vel_max = kinematic_limit(
            direction,
            limits.speed_xy.abs(),
            limits.speed_up.abs(),
            limits.speed_down.abs(),
        );
        self.accel_max = kinematic_limit(
            direction,
            limits.accel_xy.abs(),
            limits.accel_z.abs(),
            limits.accel_z.abs(),
        );
    }

    /// Re-shapes the start of the leg so it begins at `speed` instead of
    /// rest. The leg length is preserved by adjusting the constant velocity
    /// phase. When the ramp up to cruise does not fit in the first half of
    /// the leg, the leg cruises at the highest speed whose ramp does.
    ///
    /// Returns the speed the leg now starts at, which is `speed` limited to
    /// the leg's cruise speed, or 0 for an empty leg.
    pub fn set_origin_speed_max(&mut self, speed: f64) -> Result<f64, SCurveError> {
        if self.num_segs != SEGMENTS_MAX {
            return Ok(0.0);
        }

        if is_equal(self.segment[SEG_INIT].end_vel, speed) {
            return Ok(speed);
        }

        let vm = self.segment[SEG_ACCEL_END].end_vel;
        let track_length = self.track.length();
        let speed = speed.max(0.0).min(vm);

        if let Err(e) = self.rebuild_from_speed(speed, vm, track_length) {
            warn!("Leg {}: failed to set origin speed {:.1}: {}", self.id, speed, e);
            self.init();
            return Err(e);
        }

        debug!(
            "Leg {}: origin speed {:.1}, duration {:.3} s",
            self.id,
            speed,
            self.time_end()
        );
        Ok(speed)
    }

    fn rebuild_from_speed(
        &mut self,
        speed: f64,
        vm: f64,
        track_length: f64,
    ) -> Result<(), SCurveError> {
        let half = track_length * 0.5;

        // acceleration from the origin speed, lowering the target cruise
        // speed until the ramp fits in the first half of the leg
        if !self.accel_phase_fits(speed, vm, half) {
            let (mut lo, mut hi) = (speed, vm);
            for _ in 0..Self::ORIGIN_SPEED_SEARCH_DEPTH {
                let mid = 0.5 * (lo + hi);
                if self.accel_phase_fits(speed, mid, half) {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            if !self.accel_phase_fits(speed, lo, half) {
                return Err(SCurveError::InvalidPath);
            }
        }

        // empty speed change segments and a zero length constant velocity
        // segment, stretched once the deceleration is known
        let mut seg = SEG_ACCEL_END + 1;
        while seg <= SEG_CONST {
            seg = self.add_segment_const_jerk(seg, 0.0, 0.0);
        }

        let decel = calculate_path(
            self.snap_max,
            self.jerk_max,
            0.0,
            self.accel_max,
            self.segment[SEG_CONST].end_vel,
            half,
        )?;
        seg = self.add_decel_phase(seg, &decel);
        self.num_segs = seg;

        self.segment[SEG_DECEL_END].end_accel = 0.0;
        self.segment[SEG_DECEL_END].end_vel = self.segment[SEG_DECEL_END].end_vel.max(0.0);

        // stretch the constant velocity phase to end exactly on the destination
        let dp = (track_length - self.segment[SEG_DECEL_END].end_pos).max(0.0);
        if is_positive(self.segment[SEG_CONST].end_vel) {
            let t15 = dp / self.segment[SEG_CONST].end_vel;
            for seg in &mut self.segment[SEG_CONST..=SEG_DECEL_END] {
                seg.end_time += t15;
                seg.end_pos += dp;
            }
        }

        if !self.is_valid() {
            return Err(SCurveError::InvalidPath);
        }
        Ok(())
    }

    /// Builds segments 0..=7 accelerating from `speed` towards `target`.
    /// Returns false when the ramp is longer than `half` or has no solution.
    fn accel_phase_fits(&mut self, speed: f64, target: f64, half: f64) -> bool {
        let timing =
            calculate_path(self.snap_max, self.jerk_max, speed, self.accel_max, target, half);
        let accel = match timing {
            Ok(timing) => timing,
            Err(_) => return false,
        };
        let seg = self.add_hold_start(speed);
        let seg = self.add_accel_phase(seg, &accel);
        debug_assert_eq!(seg, SEG_ACCEL_END + 1);
        self.segment[SEG_ACCEL_END].end_accel = 0.0;
        self.segment[SEG_ACCEL_END].end_pos <= half
    }

    // -----------------------------------------------------------------
    //  Stepping
    // -----------------------------------------------------------------

    /// Moves the target along this leg, finishing any blend out of
    /// `prev_leg` and starting the blend into `next_leg` when the corner
    /// allows it.
    ///
    /// `target` must hold this leg's origin on entry; it leaves with the
    /// summed contribution of all active legs. Returns true once this leg is
    /// finished, or once `next_leg` has run long enough to take over.
    ///
    /// # Corner blending
    ///
    /// With `fast_waypoint` set, the next leg is started early when all of
    /// these hold:
    ///
    /// 1. The next leg has not started.
    /// 2. This leg is past the end of its constant velocity phase less the
    ///    next leg's turn in time, and past the half way point.
    /// 3. Running both legs to the corner (half of this leg's remaining time
    ///    on each) puts the target within `wp_radius` of the waypoint, below
    ///    the slower leg's speed and below `accel_corner` horizontally.
    /// 4. The remaining time is less than half of the next leg's duration.
    ///
    /// Once started the next leg is stepped every call, and this leg is done
    /// when the next leg's elapsed time reaches this leg's remaining time.
    #[allow(clippy::too_many_arguments)]
    pub fn advance_target_along_track_observed(
        &mut self,
        prev_leg: &mut SCurve,
        next_leg: &mut SCurve,
        wp_radius: f64,
        accel_corner: f64,
        fast_waypoint: bool,
        dt: f64,
        target: &mut TargetSample,
        observer: &mut dyn KinematicObserver,
    ) -> bool {
        prev_leg.move_to_pos_vel_accel_observed(dt, target, observer);
        self.move_from_pos_vel_accel_observed(dt, target, observer);
        let mut s_finished = self.finished();

        let time_to_destination = self.get_time_remaining();
        if fast_waypoint
            && is_zero(next_leg.get_time_elapsed())
            && self.get_time_elapsed() >= self.time_turn_out() - next_leg.time_turn_in()
            && self.position_sq >= 0.25 * self.track.length_squared()
        {
            // project both legs forward to the corner
            let mut turn = TargetSample::at(-self.track);
            self.move_from_time_pos_vel_accel(
                self.get_time_elapsed() + time_to_destination * 0.5,
                &mut turn,
            );
            next_leg.move_from_time_pos_vel_accel(time_to_destination * 0.5, &mut turn);

            let speed_min = self.get_speed_along_track().min(next_leg.get_speed_along_track());
            if self.get_time_remaining() < next_leg.time_end() * 0.5
                && turn.pos.length() < wp_radius
                && turn.vel.xy().length() < speed_min
                && turn.accel.xy().length() < accel_corner
            {
                trace!(
                    "Leg {}: blending into leg {} at {:.3} s, corner error {:.2}",
                    self.id,
                    next_leg.id,
                    self.time,
                    turn.pos.length()
                );
                next_leg.move_from_pos_vel_accel_observed(dt, target, observer);
            }
        } else if !is_zero(next_leg.get_time_elapsed()) {
            next_leg.move_from_pos_vel_accel_observed(dt, target, observer);
            if next_leg.get_time_elapsed() >= self.get_time_remaining() {
                s_finished = true;
            }
        }

        s_finished
    }

    /// [`Self::advance_target_along_track_observed`] without an observer.
    #[allow(clippy::too_many_arguments)]
    pub fn advance_target_along_track(
        &mut self,
        prev_leg: &mut SCurve,
        next_leg: &mut SCurve,
        wp_radius: f64,
        accel_corner: f64,
        fast_waypoint: bool,
        dt: f64,
        target: &mut TargetSample,
    ) -> bool {
        self.advance_target_along_track_observed(
            prev_leg,
            next_leg,
            wp_radius,
            accel_corner,
            fast_waypoint,
            dt,
            target,
            &mut (),
        )
    }

    /// Steps the cursor by `dt` and adds this leg's state to `target`,
    /// expressed relative to the destination.
    pub fn move_to_pos_vel_accel_observed(
        &mut self,
        dt: f64,
        target: &mut TargetSample,
        observer: &mut dyn KinematicObserver,
    ) {
        self.move_from_pos_vel_accel_observed(dt, target, observer);
        target.pos -= self.track;
    }

    pub fn move_to_pos_vel_accel(&mut self, dt: f64, target: &mut TargetSample) {
        self.move_to_pos_vel_accel_observed(dt, target, &mut ());
    }

    /// Steps the cursor by `dt` and adds this leg's state to `target`,
    /// expressed relative to the origin.
    pub fn move_from_pos_vel_accel_observed(
        &mut self,
        dt: f64,
        target: &mut TargetSample,
        observer: &mut dyn KinematicObserver,
    ) {
        self.advance_time(dt);
        let sample = self.sample_at_time(self.time);
        target.add_along(self.delta_unit, &sample);
        self.position_sq = sample.pos * sample.pos;

        if self.num_segs == SEGMENTS_MAX {
            observer.record(self.id, &sample);
        }
    }

    pub fn move_from_pos_vel_accel(&mut self, dt: f64, target: &mut TargetSample) {
        self.move_from_pos_vel_accel_observed(dt, target, &mut ());
    }

    /// Adds the state at `time_now` to `target` without moving the cursor.
    pub fn move_from_time_pos_vel_accel(&self, time_now: f64, target: &mut TargetSample) {
        let sample = self.sample_at_time(time_now);
        target.add_along(self.delta_unit, &sample);
    }

    /// Moves the time cursor by `dt`, staying between the start and the end
    /// of the leg.
    pub fn advance_time(&mut self, dt: f64) {
        self.time = (self.time + dt).min(self.time_end()).max(0.0);
    }

    // -----------------------------------------------------------------
    //  Evaluation
    // -----------------------------------------------------------------

    /// Jerk, acceleration, velocity and position along the track at
    /// `time_now`. An unbuilt leg returns zeros.
    pub fn get_jerk_accel_vel_pos_at_time(&self, time_now: f64) -> (f64, f64, f64, f64) {
        let sample = self.sample_at_time(time_now);
        (sample.jerk, sample.accel, sample.vel, sample.pos)
    }

    /// Full kinematic state, snap included, at `time_now`.
    pub fn sample_at_time(&self, time_now: f64) -> KinematicSample {
        let mut sample = KinematicSample {
            time: time_now,
            ..Default::default()
        };
        if self.num_segs != SEGMENTS_MAX {
            return sample;
        }

        // first segment still running at time_now
        let pnt = self
            .segment
            .iter()
            .position(|seg| time_now < seg.end_time)
            .unwrap_or(SEGMENTS_MAX);

        let (kind, jm, tj, start) = match pnt {
            0 => (SegmentKind::ConstantJerk, 0.0, 0.0, self.segment[0]),
            SEGMENTS_MAX => (SegmentKind::ConstantJerk, 0.0, 0.0, self.segment[SEGMENTS_MAX - 1]),
            _ => (
                self.segment[pnt].kind,
                self.segment[pnt].jerk_ref,
                self.segment[pnt].end_time - self.segment[pnt - 1].end_time,
                self.segment[pnt - 1],
            ),
        };

        let t = time_now - start.end_time;
        let (a0, v0, p0) = (start.end_accel, start.end_vel, start.end_pos);
        let (jerk, accel, vel, pos, snap) = match kind {
            SegmentKind::ConstantJerk => {
                let (j, a, v, p) = Self::calc_javp_for_segment_const_jerk(t, jm, a0, v0, p0);
                (j, a, v, p, 0.0)
            }
            SegmentKind::RisingJerk => Self::calc_javp_for_segment_incr_jerk(t, tj, jm, a0, v0, p0),
            SegmentKind::FallingJerk => {
                Self::calc_javp_for_segment_decr_jerk(t, tj, jm, a0, v0, p0)
            }
        };

        sample.jerk = jerk;
        sample.accel = accel;
        sample.vel = vel;
        // position along the leg never goes backwards
        sample.pos = pos.max(0.0);
        sample.snap = snap;
        sample
    }

    fn calc_javp_for_segment_const_jerk(
        t: f64,
        j0: f64,
        a0: f64,
        v0: f64,
        p0: f64,
    ) -> (f64, f64, f64, f64) {
        let jt = j0;
        let at = a0 + j0 * t;
        let vt = v0 + a0 * t + 0.5 * j0 * (t * t);
        let pt = p0 + v0 * t + 0.5 * a0 * (t * t) + (1.0 / 6.0) * j0 * (t * t * t);
        (jt, at, vt, pt)
    }

    /// Raised cosine jerk rising from zero to `jm` over `tj`.
    fn calc_javp_for_segment_incr_jerk(
        t: f64,
        tj: f64,
        jm: f64,
        a0: f64,
        v0: f64,
        p0: f64,
    ) -> (f64, f64, f64, f64, f64) {
        if !is_positive(tj) {
            return (0.0, a0, v0, p0, 0.0);
        }
        let alpha = jm * 0.5;
        let beta = PI / tj;
        let beta_sq = beta * beta;

        let st = alpha * beta * (beta * t).sin();
        let jt = alpha * (1.0 - (beta * t).cos());
        let at = a0 + alpha * t - (alpha / beta) * (beta * t).sin();
        let vt = v0 + a0 * t + (alpha * 0.5) * (t * t) + (alpha / beta_sq) * (beta * t).cos()
            - alpha / beta_sq;
        let pt = p0 + v0 * t + 0.5 * a0 * (t * t) + (-alpha / beta_sq) * t
            + alpha * (t * t * t) / 6.0
            + (alpha / (beta_sq * beta)) * (beta * t).sin();
        (jt, at, vt, pt, st)
    }

    /// Raised cosine jerk falling from `jm` to zero over `tj`.
    fn calc_javp_for_segment_decr_jerk(
        t: f64,
        tj: f64,
        jm: f64,
        a0: f64,
        v0: f64,
        p0: f64,
    ) -> (f64, f64, f64, f64, f64) {
        if !is_positive(tj) {
            return (0.0, a0, v0, p0, 0.0);
        }
        let alpha = jm * 0.5;
        let beta = PI / tj;
        let beta_sq = beta * beta;
        let (at_end, vt_end, pt_end) = Self::raised_cosine_rise(tj, alpha, beta);

        // evaluate the second half of a full cosine pulse
        let tt = t + tj;
        let st = alpha * beta * (beta * tt).sin();
        let jt = alpha * (1.0 - (beta * tt).cos());
        let at = (a0 - at_end) + alpha * tt - (alpha / beta) * (beta * tt).sin();
        let vt = (v0 - vt_end)
            + (a0 - at_end) * t
            + 0.5 * alpha * tt * tt
            + (alpha / beta_sq) * (beta * tt).cos()
            - alpha / beta_sq;
        let pt = (p0 - pt_end)
            + (v0 - vt_end) * t
            + 0.5 * (a0 - at_end) * (t * t)
            + (-alpha / beta_sq) * tt
            + (alpha / 6.0) * tt * tt * tt
            + (alpha / (beta_sq * beta)) * (beta * tt).sin();
        (jt, at, vt, pt, st)
    }

    /// Acceleration, velocity and position gained over a rising raised
    /// cosine jerk ramp of duration `tj` starting from rest.
    fn raised_cosine_rise(tj: f64, alpha: f64, beta: f64) -> (f64, f64, f64) {
        let beta_sq = beta * beta;
        let at = alpha * tj;
        let vt = alpha * (tj * tj * 0.5 - 2.0 / beta_sq);
        let pt = alpha * ((-1.0 / beta_sq) * tj + (1.0 / 6.0) * tj * tj * tj);
        (at, vt, pt)
    }

    // -----------------------------------------------------------------
    //  Segment table construction
    // -----------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn add_segment(
        &mut self,
        index: usize,
        end_time: f64,
        kind: SegmentKind,
        jerk_ref: f64,
        end_accel: f64,
        end_vel: f64,
        end_pos: f64,
    ) -> usize {
        self.segment[index] = Segment::new(end_time, kind, jerk_ref, end_accel, end_vel, end_pos);
        index + 1
    }

    /// Fills the table for a leg of length `l` starting and ending at rest.
    fn add_segments(&mut self, l: f64) -> Result<(), SCurveError> {
        if is_zero(l) {
            return Ok(());
        }

        let timing = calculate_path(
            self.snap_max,
            self.jerk_max,
            0.0,
            self.accel_max,
            self.vel_max,
            l * 0.5,
        )?;

        let mut seg = self.add_accel_phase(self.num_segs, &timing);
        // acceleration should be exactly zero entering constant velocity
        self.segment[SEG_ACCEL_END].end_accel = 0.0;

        while seg <= SEG_SPEED_CHANGE_END {
            seg = self.add_segment_const_jerk(seg, 0.0, 0.0);
        }

        let cruise = &self.segment[SEG_SPEED_CHANGE_END];
        let t15 = ((l - 2.0 * cruise.end_pos) / cruise.end_vel).max(0.0);
        seg = self.add_segment_const_jerk(seg, t15, 0.0);

        seg = self.add_decel_phase(seg, &timing);
        self.num_segs = seg;

        self.segment[SEG_DECEL_END].end_accel = 0.0;
        self.segment[SEG_DECEL_END].end_vel = 0.0;
        Ok(())
    }

    /// Seven segments taking acceleration up to its peak and back to zero.
    fn add_accel_phase(&mut self, index: usize, timing: &PathTiming) -> usize {
        let mut seg = self.add_segments_jerk(index, timing.tj, timing.jerk_max, timing.t2);
        seg = self.add_segment_const_jerk(seg, timing.t4, 0.0);
        self.add_segments_jerk(seg, timing.tj, -timing.jerk_max, timing.t6)
    }

    /// Mirror of [`Self::add_accel_phase`] bringing the leg to rest.
    fn add_decel_phase(&mut self, index: usize, timing: &PathTiming) -> usize {
        let mut seg = self.add_segments_jerk(index, timing.tj, -timing.jerk_max, timing.t6);
        seg = self.add_segment_const_jerk(seg, timing.t4, 0.0);
        self.add_segments_jerk(seg, timing.tj, timing.jerk_max, timing.t2)
    }

    /// Rising ramp, constant jerk dwell of `tcj`, falling ramp.
    fn add_segments_jerk(&mut self, index: usize, tj: f64, jm: f64, tcj: f64) -> usize {
        let mut seg = self.add_segment_incr_jerk(index, tj, jm);
        seg = self.add_segment_const_jerk(seg, tcj, jm);
        self.add_segment_decr_jerk(seg, tj, jm)
    }

    /// Initial segment at the origin moving at `speed`.
    fn add_hold_start(&mut self, speed: f64) -> usize {
        self.add_segment(SEG_INIT, 0.0, SegmentKind::ConstantJerk, 0.0, 0.0, speed, 0.0)
    }

    /// Copies the previous end state into `index` as an empty segment.
    fn add_segment_hold(&mut self, index: usize, jerk_ref: f64) -> usize {
        let prev = self.segment[index - 1];
        self.add_segment(
            index,
            prev.end_time,
            SegmentKind::ConstantJerk,
            jerk_ref,
            prev.end_accel,
            prev.end_vel,
            prev.end_pos,
        )
    }

    fn add_segment_const_jerk(&mut self, index: usize, tj: f64, j0: f64) -> usize {
        if !is_positive(tj) {
            return self.add_segment_hold(index, j0);
        }

        let prev = self.segment[index - 1];
        let (_, a, v, p) = Self::calc_javp_for_segment_const_jerk(
            tj,
            j0,
            prev.end_accel,
            prev.end_vel,
            prev.end_pos,
        );
        self.add_segment(index, prev.end_time + tj, SegmentKind::ConstantJerk, j0, a, v, p)
    }

    fn add_segment_incr_jerk(&mut self, index: usize, tj: f64, jm: f64) -> usize {
        if !is_positive(tj) {
            return self.add_segment_hold(index, 0.0);
        }

        let prev = self.segment[index - 1];
        let (at, vt, pt) = Self::raised_cosine_rise(tj, jm * 0.5, PI / tj);

        let t = prev.end_time + tj;
        let a = prev.end_accel + at;
        let v = prev.end_vel + prev.end_accel * tj + vt;
        let p = prev.end_pos + prev.end_vel * tj + 0.5 * prev.end_accel * tj * tj + pt;
        self.add_segment(index, t, SegmentKind::RisingJerk, jm, a, v, p)
    }

    fn add_segment_decr_jerk(&mut self, index: usize, tj: f64, jm: f64) -> usize {
        if !is_positive(tj) {
            return self.add_segment_hold(index, 0.0);
        }

        let prev = self.segment[index - 1];
        let alpha = jm * 0.5;
        let beta = PI / tj;
        let (at, vt, pt) = Self::raised_cosine_rise(tj, alpha, beta);
        // state gained over a full cosine pulse of length 2 tj
        let a2t = jm * tj;
        let v2t = jm * tj * tj;
        let p2t = alpha * ((-1.0 / (beta * beta)) * 2.0 * tj + (4.0 / 3.0) * tj * tj * tj);

        let t = prev.end_time + tj;
        let a = (prev.end_accel - at) + a2t;
        let v = (prev.end_vel - vt) + (prev.end_accel - at) * tj + v2t;
        let p = (prev.end_pos - pt)
            + (prev.end_vel - vt) * tj
            + 0.5 * (prev.end_accel - at) * tj * tj
            + p2t;
        self.add_segment(index, t, SegmentKind::FallingJerk, jm, a, v, p)
    }

    // -----------------------------------------------------------------
    //  Getters
    // -----------------------------------------------------------------

    pub fn id(&self) -> u32 {
        self.id
    }

    /// True when the table is complete and satisfies every leg invariant.
    pub fn is_valid(&self) -> bool {
        self.num_segs == SEGMENTS_MAX && segments_valid(&self.segment)
    }

    /// True once the time cursor has reached the end of the leg.
    pub fn finished(&self) -> bool {
        self.time >= self.time_end()
    }

    /// Duration of the leg, 0 when unbuilt.
    pub fn time_end(&self) -> f64 {
        if self.num_segs != SEGMENTS_MAX {
            return 0.0;
        }
        self.segment[SEG_DECEL_END].end_time
    }

    pub fn get_time_remaining(&self) -> f64 {
        if self.num_segs != SEGMENTS_MAX {
            return 0.0;
        }
        self.segment[SEG_DECEL_END].end_time - self.time
    }

    pub fn get_time_elapsed(&self) -> f64 {
        self.time
    }

    /// Maximum speed along the track.
    pub fn get_speed_along_track(&self) -> f64 {
        self.vel_max
    }

    pub fn get_accel_along_track(&self) -> f64 {
        self.accel_max
    }

    /// Time at the end of the constant velocity phase.
    pub fn time_turn_out(&self) -> f64 {
        if self.num_segs != SEGMENTS_MAX {
            return 0.0;
        }
        self.segment[SEG_TURN_OUT].end_time
    }

    /// Time at the end of the constant acceleration phase.
    pub fn time_turn_in(&self) -> f64 {
        if self.num_segs != SEGMENTS_MAX {
            return 0.0;
        }
        self.segment[SEG_TURN_IN].end_time
    }

    pub fn track(&self) -> Vector3 {
        self.track
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segment[..self.num_segs]
    }
}
