//! Sample observation for legs that are being stepped.
//!
//! Legs report every evaluated step to a caller supplied observer instead of
//! writing to shared state. `()` is the no-op observer.

use std::collections::BTreeMap;

use crate::segment::KinematicSample;

/// Receives one sample per leg step.
pub trait KinematicObserver {
    /// Called with the id of the stepped leg and its state along the track.
    fn record(&mut self, _leg_id: u32, _sample: &KinematicSample) {}
}

impl KinematicObserver for () {}

/// Time series for a single leg.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct LegLog {
    pub time: Vec<f64>,
    pub pos: Vec<f64>,
    pub vel: Vec<f64>,
    pub accel: Vec<f64>,
    pub jerk: Vec<f64>,
    pub snap: Vec<f64>,
}

impl LegLog {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    fn push(&mut self, sample: &KinematicSample) {
        self.time.push(sample.time);
        self.pos.push(sample.pos);
        self.vel.push(sample.vel);
        self.accel.push(sample.accel);
        self.jerk.push(sample.jerk);
        self.snap.push(sample.snap);
    }
}

/// Recorder keeping a separate series per leg id.
#[derive(Default, Clone, Debug)]
pub struct KinematicLog {
    legs: BTreeMap<u32, LegLog>,
}

impl KinematicLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leg(&self, leg_id: u32) -> Option<&LegLog> {
        self.legs.get(&leg_id)
    }

    /// Recorded legs in ascending id order.
    pub fn legs(&self) -> impl Iterator<Item = (u32, &LegLog)> {
        self.legs.iter().map(|(id, log)| (*id, log))
    }

    pub fn clear(&mut self) {
        self.legs.clear();
    }
}

impl KinematicObserver for KinematicLog {
    fn record(&mut self, leg_id: u32, sample: &KinematicSample) {
        self.legs.entry(leg_id).or_default().push(sample);
    }
}
