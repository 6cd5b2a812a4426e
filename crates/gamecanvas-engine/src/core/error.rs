use thiserror::Error;

use crate::canvas::CanvasError;

use super::Phase;

/// Reasons a tick did not complete.
///
/// When a hook or the presentation fails, the remaining phases are skipped,
/// buffered commands are discarded and the schedule is left where it was.
/// `Canvas` is also returned by a rejected resize request, after the frame
/// was presented.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("{phase} hook failed")]
    Hook {
        phase: Phase,
        #[source]
        source: anyhow::Error,
    },

    #[error("presenting the frame failed")]
    Present(#[source] anyhow::Error),

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

impl TickError {
    /// Phase that failed, if a hook was at fault.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            TickError::Hook { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
