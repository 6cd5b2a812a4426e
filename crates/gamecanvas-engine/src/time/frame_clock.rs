use std::time::{Duration, Instant};

/// Frame timing snapshot handed to every hook of a tick.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds.
    pub dt: f32,

    /// Timestamp the tick was started with.
    pub now: Instant,

    /// Monotonic tick counter, starting at 0.
    pub frame_index: u64,
}

/// Produces [`FrameTime`] snapshots from caller-supplied timestamps.
///
/// Delta time is clamped to avoid pathological values when the loop is paused
/// by the debugger, minimized, or stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps.
    pub fn new() -> Self {
        Self::with_clamps(
            Duration::from_micros(100), // 0.0001s
            Duration::from_millis(250), // 0.25s
        )
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: None,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Forgets the previous tick; the next `dt` is measured from scratch.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Number of ticks produced so far.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_index
    }

    /// The `FrameTime` a tick at `now` would get, without advancing.
    ///
    /// The first tick after construction or [`reset`](Self::reset) reports
    /// `dt_min`. Call [`commit`](Self::commit) once the tick has completed.
    pub fn peek(&self, now: Instant) -> FrameTime {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).clamp(self.dt_min, self.dt_max),
            None => self.dt_min,
        };

        FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        }
    }

    /// Records a completed tick at `now`.
    pub fn commit(&mut self, now: Instant) {
        self.last = Some(now);
        self.frame_index = self.frame_index.wrapping_add(1);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
