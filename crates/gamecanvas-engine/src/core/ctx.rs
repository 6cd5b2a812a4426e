use crate::canvas::{CanvasSettings, DrawingContext};
use crate::coords::Viewport;
use crate::entity::{Commands, InstanceId, InstanceState, TemplateId, World};
use crate::time::FrameTime;

/// Context passed to a template's update hooks, once per instance.
///
/// Lifetimes:
/// - `'a` is the duration of the hook invocation
pub struct UpdateCtx<'a> {
    pub id:       InstanceId,
    pub template: TemplateId,
    pub state:    &'a mut InstanceState,
    pub viewport: Viewport,
    pub time:     FrameTime,
    pub(crate) commands: &'a mut Commands,
}

impl<'a> UpdateCtx<'a> {
    /// Deferred world edits.
    ///
    /// Spawns and despawns recorded here are applied once every instance has
    /// been updated, before the global update hooks run. Instances spawned
    /// this way are drawn in the same tick.
    #[inline]
    pub fn commands(&mut self) -> &mut Commands {
        self.commands
    }
}

/// Context passed to a template's draw hooks, once per instance.
///
/// `canvas` draws in world coordinates.
pub struct DrawCtx<'a> {
    pub id:       InstanceId,
    pub template: TemplateId,
    pub state:    &'a InstanceState,
    pub viewport: Viewport,
    pub time:     FrameTime,
    pub canvas:   DrawingContext<'a>,
}

/// Context passed to the global update hooks.
pub struct GlobalUpdateCtx<'a> {
    pub world:    &'a mut World,
    pub settings: &'a mut CanvasSettings,
    pub viewport: Viewport,
    pub time:     FrameTime,
    pub(crate) resize: &'a mut Option<(i32, i32)>,
}

impl<'a> GlobalUpdateCtx<'a> {
    /// Asks for a `width` x `height` viewport.
    ///
    /// The framebuffer is replaced once the current frame has been presented,
    /// so the next tick draws into the new size. The last request of a tick
    /// wins; an aborted tick drops it. An invalid size fails the tick that
    /// applies it with [`TickError::Canvas`](super::TickError::Canvas) and the
    /// old buffer is kept.
    pub fn request_resize(&mut self, width: i32, height: i32) {
        *self.resize = Some((width, height));
    }
}

/// Context passed to the global draw and overlay hooks.
///
/// For the global draw `canvas` is in world coordinates; for the overlay it
/// is in framebuffer pixels, unaffected by the viewport origin.
pub struct GlobalDrawCtx<'a> {
    pub world:    &'a World,
    pub settings: &'a CanvasSettings,
    pub viewport: Viewport,
    pub time:     FrameTime,
    pub canvas:   DrawingContext<'a>,
}
