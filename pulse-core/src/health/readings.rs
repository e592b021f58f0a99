//! Sources of synthetic sensor input.
//!
//! The session manager asks its [`ReadingSource`] for one [`ReadingTick`] per
//! sample and folds it into the running metrics. [`RandomReadings`] stands in
//! for real sensors; [`ScriptedReadings`] replays a fixed sequence for tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const HEART_RATE_MIN_BPM: u32 = 70;
pub const HEART_RATE_MAX_BPM: u32 = 110;
pub const MAX_DISTANCE_STEP_KM: f64 = 0.01;
pub const MAX_CALORIES_STEP: f64 = 0.2;
pub const MAX_STEPS_PER_TICK: u64 = 5;

/// One tick's worth of raw input. Heart rate is absolute, the rest are increments.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadingTick {
    pub heart_rate_bpm: u32,
    pub distance_km: f64,
    pub calories: f64,
    pub steps: u64,
}

pub trait ReadingSource: Send {
    fn next_tick(&mut self) -> ReadingTick;
}

pub struct RandomReadings {
    rng: StdRng,
}

impl RandomReadings {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomReadings {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingSource for RandomReadings {
    fn next_tick(&mut self) -> ReadingTick {
        ReadingTick {
            heart_rate_bpm: self
                .rng
                .random_range(HEART_RATE_MIN_BPM..HEART_RATE_MAX_BPM),
            distance_km: self.rng.random_range(0.0..MAX_DISTANCE_STEP_KM),
            calories: self.rng.random_range(0.0..MAX_CALORIES_STEP),
            steps: self.rng.random_range(0..MAX_STEPS_PER_TICK),
        }
    }
}

/// Cycles through a fixed list of ticks. An empty script yields all-zero ticks.
pub struct ScriptedReadings {
    ticks: Vec<ReadingTick>,
    next: usize,
}

impl ScriptedReadings {
    pub fn new(ticks: Vec<ReadingTick>) -> Self {
        Self { ticks, next: 0 }
    }
}

impl ReadingSource for ScriptedReadings {
    fn next_tick(&mut self) -> ReadingTick {
        if self.ticks.is_empty() {
            return ReadingTick::default();
        }
        let tick = self.ticks[self.next % self.ticks.len()];
        self.next = self.next.wrapping_add(1);
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ticks_stay_in_range() {
        let mut source = RandomReadings::seeded(7);
        for _ in 0..500 {
            let tick = source.next_tick();
            assert!((HEART_RATE_MIN_BPM..HEART_RATE_MAX_BPM).contains(&tick.heart_rate_bpm));
            assert!((0.0..MAX_DISTANCE_STEP_KM).contains(&tick.distance_km));
            assert!((0.0..MAX_CALORIES_STEP).contains(&tick.calories));
            assert!(tick.steps < MAX_STEPS_PER_TICK);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomReadings::seeded(42);
        let mut b = RandomReadings::seeded(42);
        for _ in 0..20 {
            assert_eq!(a.next_tick(), b.next_tick());
        }
    }

    #[test]
    fn script_cycles() {
        let first = ReadingTick {
            heart_rate_bpm: 80,
            steps: 3,
            ..Default::default()
        };
        let second = ReadingTick {
            heart_rate_bpm: 90,
            steps: 1,
            ..Default::default()
        };
        let mut source = ScriptedReadings::new(vec![first, second]);
        assert_eq!(source.next_tick(), first);
        assert_eq!(source.next_tick(), second);
        assert_eq!(source.next_tick(), first);

        let mut empty = ScriptedReadings::new(vec![]);
        assert_eq!(empty.next_tick(), ReadingTick::default());
    }
}
