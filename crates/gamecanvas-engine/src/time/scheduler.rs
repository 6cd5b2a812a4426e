use std::time::{Duration, Instant};

use crate::canvas::{CanvasError, CanvasSettings};

/// Fixed-interval tick scheduler.
///
/// Deadlines advance by whole intervals from the previous deadline, so a loop
/// that wakes a little late does not drift. When a tick finishes more than one
/// interval behind, the schedule resyncs to `now + interval` rather than
/// firing a burst of catch-up ticks.
///
/// The scheduler never sleeps; the host asks [`next_deadline`] when to wake
/// and [`is_due`] whether to tick.
///
/// [`next_deadline`]: Self::next_deadline
/// [`is_due`]: Self::is_due
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    fps: u32,
    interval: Duration,
    next_deadline: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(fps: u32) -> Result<Self, CanvasError> {
        Ok(Self {
            fps,
            interval: interval_for(fps)?,
            next_deadline: None,
        })
    }

    /// Arms the schedule; the first tick is due immediately.
    pub fn start(&mut self, now: Instant) {
        self.next_deadline = Some(now);
    }

    /// Disarms the schedule. [`is_due`](Self::is_due) is false until restarted.
    pub fn stop(&mut self) {
        self.next_deadline = None;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.next_deadline.is_some()
    }

    #[inline]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Changes the rate used for the next deadline. The pending deadline is
    /// left as is.
    pub fn set_fps(&mut self, fps: u32) -> Result<(), CanvasError> {
        if fps != self.fps {
            self.interval = interval_for(fps)?;
            self.fps = fps;
        }
        Ok(())
    }

    /// Schedules the tick after the one that just ran at `now`.
    ///
    /// `fps` is the rate in effect at the end of the tick; if it differs from
    /// the current one the next deadline uses the new interval.
    pub fn complete_tick(&mut self, now: Instant, fps: u32) -> Result<(), CanvasError> {
        self.set_fps(fps)?;

        let Some(deadline) = self.next_deadline else {
            return Ok(());
        };

        let next = deadline + self.interval;
        if next <= now {
            let behind = now.saturating_duration_since(deadline);
            log::debug!("frame schedule fell {behind:?} behind; resyncing");
            self.next_deadline = Some(now + self.interval);
        } else {
            self.next_deadline = Some(next);
        }

        Ok(())
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        let fps = CanvasSettings::DEFAULT_FPS;
        Self {
            fps,
            interval: Duration::from_secs(1) / fps,
            next_deadline: None,
        }
    }
}

/// `1 s / fps`, exact to the nanosecond.
pub fn interval_for(fps: u32) -> Result<Duration, CanvasError> {
    if fps == 0 {
        return Err(CanvasError::InvalidFrameRate(fps));
    }
    Ok(Duration::from_secs(1) / fps)
}
