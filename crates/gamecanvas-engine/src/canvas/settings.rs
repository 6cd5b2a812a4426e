use crate::paint::Color;

use super::CanvasError;

/// Tunables hooks may change while the loop runs.
///
/// Frame-rate changes are picked up by the scheduler when the current tick
/// completes; they never alter the deadline of the tick in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasSettings {
    fps: u32,
    /// Colour the framebuffer is cleared to at the start of every tick.
    pub background: Color,
    /// World position of the viewport's top-left corner.
    pub origin: (i32, i32),
}

impl CanvasSettings {
    pub const DEFAULT_FPS: u32 = 30;

    /// Target ticks per second.
    #[inline]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn set_fps(&mut self, fps: u32) -> Result<(), CanvasError> {
        if fps == 0 {
            return Err(CanvasError::InvalidFrameRate(fps));
        }
        if fps != self.fps {
            log::debug!("frame rate {} -> {}", self.fps, fps);
        }
        self.fps = fps;
        Ok(())
    }
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            fps: Self::DEFAULT_FPS,
            background: Color::LIGHT_GRAY,
            origin: (0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fps_is_rejected_and_keeps_previous_value() {
        let mut s = CanvasSettings::default();
        assert!(matches!(s.set_fps(0), Err(CanvasError::InvalidFrameRate(0))));
        assert_eq!(s.fps(), 30);
    }

    #[test]
    fn set_fps_updates_value() {
        let mut s = CanvasSettings::default();
        s.set_fps(60).unwrap();
        assert_eq!(s.fps(), 60);
    }
}
