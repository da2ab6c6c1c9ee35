use log::warn;

use crate::config::EngineConfig;

/// Fixed-timestep accumulator. Frame callbacks feed it wall-clock time and get back the number
/// of simulation ticks to run, so walker speed does not depend on the display refresh rate.
#[derive(Clone, Debug)]
pub struct AnimationClock {
    timestep_ms: f64,
    max_ticks: usize,
    min_frame_interval_ms: f64,
    last_frame_ms: Option<f64>,
    accumulator: f64,
}

impl AnimationClock {
    pub fn new(timestep_ms: f64, max_ticks: usize, max_fps: f64) -> AnimationClock {
        AnimationClock {
            timestep_ms,
            max_ticks,
            min_frame_interval_ms: 1000.0 / max_fps,
            last_frame_ms: None,
            accumulator: 0.0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> AnimationClock {
        AnimationClock::new(
            config.timestep_ms,
            config.max_ticks_per_frame,
            config.max_fps,
        )
    }

    pub fn timestep_ms(&self) -> f64 {
        self.timestep_ms
    }

    /// Time carried over to the next frame.
    pub fn backlog_ms(&self) -> f64 {
        self.accumulator
    }

    /// Handles a frame callback stamped `timestamp_ms`. The first frame only sets the baseline,
    /// and frames arriving faster than the frame-rate cap are ignored entirely.
    pub fn frame(&mut self, timestamp_ms: f64) -> usize {
        let Some(last) = self.last_frame_ms else {
            self.last_frame_ms = Some(timestamp_ms);
            return 0;
        };
        if timestamp_ms < last + self.min_frame_interval_ms {
            return 0;
        }
        self.last_frame_ms = Some(timestamp_ms);
        self.elapse(timestamp_ms - last)
    }

    /// Adds `elapsed_ms` to the accumulator and drains it in whole timesteps. Hitting the tick
    /// cap discards the remaining backlog.
    pub fn elapse(&mut self, elapsed_ms: f64) -> usize {
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            self.accumulator += elapsed_ms;
        }
        let mut ticks = 0;
        while self.accumulator >= self.timestep_ms {
            self.accumulator -= self.timestep_ms;
            ticks += 1;
            if ticks >= self.max_ticks {
                warn!(
                    "Hit the cap of {} ticks in one frame, dropping {:.1} ms of backlog",
                    self.max_ticks, self.accumulator
                );
                self.accumulator = 0.0;
                break;
            }
        }
        ticks
    }

    /// Forgets the previous frame, e.g. after the host was paused.
    pub fn reset(&mut self) {
        self.last_frame_ms = None;
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_partial_steps() {
        let mut clock = AnimationClock::new(10.0, 240, 1000.0);
        assert_eq!(clock.frame(0.0), 0);
        assert_eq!(clock.frame(25.0), 2);
        assert_eq!(clock.backlog_ms(), 5.0);
        assert_eq!(clock.frame(30.0), 1);
        assert_eq!(clock.backlog_ms(), 0.0);
    }

    #[test]
    fn caps_catch_up() {
        let mut clock = AnimationClock::new(10.0, 240, 1000.0);
        clock.frame(0.0);
        // ten seconds suspended
        assert_eq!(clock.frame(10_000.0), 240);
        assert_eq!(clock.backlog_ms(), 0.0);
    }

    #[test]
    fn throttles_fast_frames() {
        let mut clock = AnimationClock::new(10.0, 240, 50.0);
        clock.frame(0.0);
        // 50 fps means at least 20 ms between frames
        assert_eq!(clock.frame(15.0), 0);
        assert_eq!(clock.frame(20.0), 2);
    }
}
