use std::time::Instant;

/// Animation time with pause support. Paused time does not count, so waves
/// resume exactly where they stopped.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    pause_start: Option<Instant>,
    total_pause_duration: f32,
    current_frame: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            pause_start: None,
            total_pause_duration: 0.0,
            current_frame: 0,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_start.is_some()
    }

    /// Advances the frame counter unless paused.
    pub fn tick(&mut self) -> u64 {
        if !self.is_paused() {
            self.current_frame = self.current_frame.wrapping_add(1);
        }
        self.current_frame
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> f32 {
        let raw = now.saturating_duration_since(self.start).as_secs_f32();
        let paused_now = self
            .pause_start
            .map_or(0.0, |p| now.saturating_duration_since(p).as_secs_f32());
        raw - self.total_pause_duration - paused_now
    }

    pub fn set_paused(&mut self, paused: bool, now: Instant) {
        match (paused, self.pause_start) {
            (true, None) => self.pause_start = Some(now),
            (false, Some(p)) => {
                self.total_pause_duration += now.saturating_duration_since(p).as_secs_f32();
                self.pause_start = None;
            }
            _ => {}
        }
    }

    pub fn toggle_pause(&mut self) {
        let paused = !self.is_paused();
        self.set_paused(paused, Instant::now());
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn paused_time_is_not_counted() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let at = |secs: f32| t0 + Duration::from_secs_f32(secs);

        assert!((clock.elapsed_at(at(2.0)) - 2.0).abs() < 1e-3);
        clock.set_paused(true, at(2.0));
        assert!((clock.elapsed_at(at(5.0)) - 2.0).abs() < 1e-3);
        clock.set_paused(false, at(5.0));
        assert!((clock.elapsed_at(at(6.0)) - 3.0).abs() < 1e-3);
    }

    #[test]
    fn frames_stop_while_paused() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        assert_eq!(clock.tick(), 1);
        clock.set_paused(true, t0);
        assert_eq!(clock.tick(), 1);
        clock.set_paused(false, t0);
        assert_eq!(clock.tick(), 2);
    }
}
