use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,

    /// Smoothed frames per second.
    pub fps: f32,
}

/// Per-loop frame clock.
///
/// Call [`tick`](Self::tick) once per iteration of the caller's
/// `while window.is_open()` loop. Delta time is clamped so a stalled frame
/// (debugger, window drag) does not spike the FPS estimate.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    fps: Option<f32>,
    dt_min: Duration,
    dt_max: Duration,
    smoothing: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            fps: None,
            dt_min,
            dt_max,
            smoothing: 0.1,
        }
    }

    /// Advances the clock using the current time.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        self.advance(elapsed)
    }

    /// Advances the clock by an explicit elapsed duration.
    pub fn advance(&mut self, elapsed: Duration) -> FrameTime {
        let dt = elapsed.clamp(self.dt_min, self.dt_max).as_secs_f32();
        let instant_fps = 1.0 / dt;

        // Exponential moving average; the first frame seeds it.
        let fps = match self.fps {
            Some(prev) => prev + (instant_fps - prev) * self.smoothing,
            None => instant_fps,
        };
        self.fps = Some(fps);

        let ft = FrameTime { dt, frame_index: self.frame_index, fps };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
