//! Turns host frame timestamps into simulation deltas.

use std::time::Instant;

/// Frame-to-frame timer driven by the host's timestamps.
///
/// The first frame reports a delta of zero. Deltas are not clamped here;
/// [`crate::Simulation::tick`] owns that policy.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call.
    pub fn delta(&mut self, now: Instant) -> f32 {
        let dt = match self.last {
            Some(previous) => now.saturating_duration_since(previous).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        self.frames += 1;
        dt
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_first_frame_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(Instant::now()), 0.0);
        assert_eq!(clock.frames(), 1);
    }

    #[test]
    fn test_delta_between_frames() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.delta(start);
        let dt = clock.delta(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn test_out_of_order_timestamp_is_zero() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.delta(start + Duration::from_millis(50));
        assert_eq!(clock.delta(start), 0.0);
    }
}
