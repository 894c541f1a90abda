//! Distance-driven spawn cadence

/// Fires once each time the travelled distance moves more than `interval`
/// past the distance of the previous firing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnCadence {
    interval: f32,
    last_distance: f32,
}

impl SpawnCadence {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            last_distance: 0.0,
        }
    }

    /// Returns true (and rearms at `distance`) when a spawn is due
    pub fn poll(&mut self, distance: f32) -> bool {
        if distance > self.last_distance + self.interval {
            self.last_distance = distance;
            true
        } else {
            false
        }
    }

    pub fn last_distance(&self) -> f32 {
        self.last_distance
    }

    pub fn reset(&mut self) {
        self.last_distance = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_past_interval_and_rearms() {
        let mut cadence = SpawnCadence::new(30.0);
        assert!(!cadence.poll(30.0));
        assert!(cadence.poll(30.5));
        assert_eq!(cadence.last_distance(), 30.5);
        assert!(!cadence.poll(60.0));
        assert!(cadence.poll(61.0));
    }

    #[test]
    fn test_big_jump_fires_once() {
        let mut cadence = SpawnCadence::new(30.0);
        assert!(cadence.poll(500.0));
        assert!(!cadence.poll(500.0));
        cadence.reset();
        assert_eq!(cadence.last_distance(), 0.0);
    }
}
