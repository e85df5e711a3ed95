use std::time::{Duration, Instant};

/// Frame timing snapshot handed to the scene.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct GameTime {
    /// Scaled, clamped seconds since the previous tick.
    pub delta: f32,

    /// Clamped seconds since the previous tick, before `time_scale`.
    pub raw_delta: f32,

    /// Sum of scaled deltas since the clock started.
    pub elapsed: f32,

    /// Monotonic frame counter.
    pub frame: u64,
}

impl GameTime {
    /// A single frame of `delta` seconds, for driving updates by hand.
    pub fn from_delta(delta: f32) -> Self {
        Self { delta, raw_delta: delta, elapsed: delta, frame: 0 }
    }
}

/// Produces [`GameTime`] snapshots.
///
/// One clock per loop. Delta time is clamped so a debugger pause or a
/// minimized window does not produce a huge step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame: u64,
    elapsed: f32,
    dt_min: Duration,
    dt_max: Duration,
    /// Multiplier applied to `delta` (0 pauses game time).
    pub time_scale: f32,
}

impl FrameClock {
    /// Clock with the default clamps (0.1 ms to 250 ms).
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame: 0,
            elapsed: 0.0,
            dt_min,
            dt_max,
            time_scale: 1.0,
        }
    }

    /// Resets the baseline, e.g. after resuming from suspension.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Measures the time since the previous tick and advances by it.
    pub fn tick(&mut self) -> GameTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        self.advance(dt)
    }

    /// Advances by `dt` without reading the wall clock.
    pub fn advance(&mut self, dt: Duration) -> GameTime {
        let raw_delta = dt.clamp(self.dt_min, self.dt_max).as_secs_f32();
        let delta = raw_delta * self.time_scale;
        self.elapsed += delta;

        let time = GameTime { delta, raw_delta, elapsed: self.elapsed, frame: self.frame };
        self.frame = self.frame.wrapping_add(1);
        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
