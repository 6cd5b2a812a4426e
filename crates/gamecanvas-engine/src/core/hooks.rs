use crate::entity::{HookId, HookList};

use super::{GlobalDrawCtx, GlobalUpdateCtx};

pub type GlobalUpdateFn = dyn FnMut(&mut GlobalUpdateCtx<'_>) -> anyhow::Result<()>;
pub type GlobalDrawFn = dyn FnMut(&mut GlobalDrawCtx<'_>) -> anyhow::Result<()>;

/// The three hooks that run once per tick regardless of instances.
///
/// Each slot holds any number of hooks run in binding order; an empty slot is
/// skipped.
#[derive(Default)]
pub struct GlobalHooks {
    pub(crate) update:  HookList<GlobalUpdateFn>,
    pub(crate) draw:    HookList<GlobalDrawFn>,
    pub(crate) overlay: HookList<GlobalDrawFn>,
}

impl GlobalHooks {
    pub fn bind_update<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&mut GlobalUpdateCtx<'_>) -> anyhow::Result<()> + 'static,
    {
        self.update.push(Box::new(hook))
    }

    pub fn bind_draw<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&mut GlobalDrawCtx<'_>) -> anyhow::Result<()> + 'static,
    {
        self.draw.push(Box::new(hook))
    }

    pub fn bind_overlay<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&mut GlobalDrawCtx<'_>) -> anyhow::Result<()> + 'static,
    {
        self.overlay.push(Box::new(hook))
    }

    pub fn unbind_update(&mut self, id: HookId) -> bool {
        self.update.remove(id)
    }

    pub fn unbind_draw(&mut self, id: HookId) -> bool {
        self.draw.remove(id)
    }

    pub fn unbind_overlay(&mut self, id: HookId) -> bool {
        self.overlay.remove(id)
    }

    pub fn clear(&mut self) {
        self.update.clear();
        self.draw.clear();
        self.overlay.clear();
    }
}

impl std::fmt::Debug for GlobalHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalHooks")
            .field("update", &self.update.len())
            .field("draw", &self.draw.len())
            .field("overlay", &self.overlay.len())
            .finish()
    }
}
