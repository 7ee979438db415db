use std::collections::VecDeque;

use log::info;

use crate::error::SCurveError;
use crate::limits::{AttitudeLimits, PositionLimits};
use crate::observer::KinematicObserver;
use crate::scurve::TargetSample;
use crate::vector3::Vector3;
use crate::wpnav::WPNav;

/// One tick of a mission.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct MissionSample {
    /// Time since the mission started, s.
    pub time: f64,
    /// Index of the waypoint being flown to.
    pub leg_index: usize,
    pub target: TargetSample,
}

/// WaypointMission flies a [`WPNav`] through a list of waypoints, stepping it
/// at a fixed frequency.
///
/// The first waypoint is the start. Each waypoint after it is set as the
/// destination in turn, with the one following it pre-built so corners are
/// blended. The mission is complete when the last waypoint is reached.
pub struct WaypointMission<'o, A, P> {
    wpnav: WPNav<A, P>,

    /// Waypoints not yet set as destination
    pending: VecDeque<Vector3>,

    /// Update frequency in Hz
    freq: f64,

    /// Current time-step in discrete ticks
    ticks: u64,

    /// Index of the current destination in the original list
    leg_index: usize,

    complete: bool,

    observer: Option<&'o mut dyn KinematicObserver>,
}

impl<'o, A, P> WaypointMission<'o, A, P>
where
    A: AttitudeLimits,
    P: PositionLimits,
{
    /// Creates a mission stepping at `freq` Hz. `wpnav` is initialised at the
    /// first waypoint.
    pub fn new(
        mut wpnav: WPNav<A, P>,
        waypoints: &[Vector3],
        freq: u16,
    ) -> Result<Self, SCurveError> {
        if freq == 0 {
            return Err(SCurveError::InvalidFrequency);
        }

        let mut pending: VecDeque<Vector3> = waypoints.iter().copied().collect();
        let start = pending.pop_front().unwrap_or_default();
        wpnav.wp_and_spline_init(0.0, start);

        let mut mission = Self {
            wpnav,
            pending,
            freq: freq as f64,
            ticks: 0,
            leg_index: 0,
            complete: false,
            observer: None,
        };
        mission.load_next()?;
        Ok(mission)
    }

    /// Sends every leg sample to `observer`.
    pub fn with_observer(mut self, observer: &'o mut dyn KinematicObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Sets the next destination, and the one after it when there is one.
    fn load_next(&mut self) -> Result<(), SCurveError> {
        let destination = match self.pending.pop_front() {
            Some(d) => d,
            None => {
                self.complete = true;
                info!("Mission complete after {:.3} s", self.time());
                return Ok(());
            }
        };

        self.wpnav.set_wp_destination(destination)?;
        if let Some(next) = self.pending.front() {
            self.wpnav.set_wp_destination_next(*next)?;
        }
        self.leg_index += 1;
        Ok(())
    }

    /// Advances the mission by one tick.
    ///
    /// Returns `None` once the last waypoint has been reached.
    pub fn tick(&mut self) -> Result<Option<MissionSample>, SCurveError> {
        if self.complete {
            return Ok(None);
        }

        let dt = 1.0 / self.freq;
        let target = match self.observer.as_mut() {
            Some(observer) => {
                self.wpnav.advance_wp_target_along_track_observed(dt, &mut **observer)
            }
            None => self.wpnav.advance_wp_target_along_track(dt),
        };
        self.ticks += 1;

        let sample = MissionSample {
            time: self.time(),
            leg_index: self.leg_index,
            target,
        };

        if self.wpnav.reached_wp_destination() {
            self.load_next()?;
        }

        Ok(Some(sample))
    }

    /// Ticks until the mission completes or `max_time` seconds have passed.
    pub fn run(&mut self, max_time: f64) -> Result<Vec<MissionSample>, SCurveError> {
        let mut samples = Vec::new();
        while self.time() < max_time {
            match self.tick()? {
                Some(sample) => samples.push(sample),
                None => break,
            }
        }
        Ok(samples)
    }

    /// Mission time in seconds.
    pub fn time(&self) -> f64 {
        self.ticks as f64 / self.freq
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn wpnav(&self) -> &WPNav<A, P> {
        &self.wpnav
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::PosControl;
    use crate::observer::KinematicLog;
    use crate::params::{AttitudeParams, Params, PosControlParams};

    type Navigator = WPNav<AttitudeParams, PosControl<AttitudeParams, PosControlParams>>;

    fn navigator(params: &Params) -> Navigator {
        let pos_control = PosControl::from_params(&params.pos_control, &params.attitude);
        WPNav::new(&params.wpnav, params.attitude.clone(), pos_control)
    }

    fn waypoints() -> Vec<Vector3> {
        vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2000.0, 0.0, 0.0),
            Vector3::new(2000.0, 2000.0, 500.0),
            Vector3::new(0.0, 2000.0, 0.0),
        ]
    }

    #[test]
    fn flies_every_leg_to_the_end() {
        let params = Params::default();
        let wps = waypoints();
        let mut mission = WaypointMission::new(navigator(&params), &wps, 400).unwrap();
        let samples = mission.run(600.0).unwrap();

        assert!(mission.is_complete());
        assert_eq!(mission.tick(), Ok(None));

        let last = samples.last().unwrap();
        assert_eq!(last.leg_index, 3);
        assert!((last.target.pos - wps[3]).length() <= params.wpnav.radius_cm);

        // legs are flown in order and the path has no jumps
        for pair in samples.windows(2) {
            assert!(pair[1].leg_index >= pair[0].leg_index);
            assert!((pair[1].time - pair[0].time - 1.0 / 400.0).abs() < 1e-9);
            assert!((pair[1].target.pos - pair[0].target.pos).length() < 1000.0 / 400.0 * 1.5);
        }
        let legs: Vec<usize> = samples.iter().map(|s| s.leg_index).collect();
        assert!(legs.contains(&1) && legs.contains(&2));
    }

    #[test]
    fn run_stops_at_max_time() {
        let params = Params::default();
        let mut mission = WaypointMission::new(navigator(&params), &waypoints(), 100).unwrap();
        let samples = mission.run(1.0).unwrap();
        assert_eq!(samples.len(), 100);
        assert!(!mission.is_complete());
    }

    #[test]
    fn observer_receives_leg_samples() {
        let params = Params::default();
        let mut log = KinematicLog::new();
        {
            let mut mission = WaypointMission::new(navigator(&params), &waypoints(), 100)
                .unwrap()
                .with_observer(&mut log);
            mission.run(600.0).unwrap();
        }
        let ids: Vec<u32> = log.legs().map(|(id, _)| id).collect();
        assert_eq!(ids.len(), 3);
        assert!(log.legs().all(|(_, leg)| !leg.is_empty()));
    }

    #[test]
    fn single_waypoint_is_already_complete() {
        let params = Params::default();
        let mut mission =
            WaypointMission::new(navigator(&params), &[Vector3::zero()], 100).unwrap();
        assert!(mission.is_complete());
        assert_eq!(mission.run(10.0).unwrap(), Vec::new());
    }

    #[test]
    fn zero_frequency_is_rejected() {
        let params = Params::default();
        let result = WaypointMission::new(navigator(&params), &waypoints(), 0);
        assert!(matches!(result, Err(SCurveError::InvalidFrequency)));
    }

    #[test]
    fn mission_clock_only_moves_forward() {
        let params = Params::default();
        let mut mission = WaypointMission::new(navigator(&params), &waypoints(), 1).unwrap();
        let samples = mission.run(5.0).unwrap();
        assert_eq!(samples.len(), 5);
        for (i, sample) in samples.iter().enumerate() {
            assert_eq!(sample.time, (i + 1) as f64);
        }
        assert!(mission.wpnav().this_leg().get_time_elapsed() > 0.0);
    }
}
