use crate::core::{DrawCtx, UpdateCtx};

use super::{HookId, HookList};

/// Per-instance update logic.
pub type UpdateFn = dyn FnMut(&mut UpdateCtx<'_>) -> anyhow::Result<()>;

/// Per-instance draw logic.
pub type DrawFn = dyn FnMut(&mut DrawCtx<'_>) -> anyhow::Result<()>;

/// Identifies a template registered in a [`World`](super::World).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TemplateId(u32);

impl TemplateId {
    #[inline]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

/// Reusable entity definition: the behaviour shared by all its instances.
///
/// A template carries no position of its own; each instance spawned from it
/// has its own [`InstanceState`](super::InstanceState). Update hooks run
/// once per instance per tick, then (after the global update) draw hooks run
/// once per instance.
pub struct Template {
    name: String,
    update: HookList<UpdateFn>,
    draw: HookList<DrawFn>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            update: HookList::new(),
            draw: HookList::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches an update hook after any already bound.
    pub fn bind_update<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&mut UpdateCtx<'_>) -> anyhow::Result<()> + 'static,
    {
        self.update.push(Box::new(hook))
    }

    /// Attaches a draw hook after any already bound.
    pub fn bind_draw<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&mut DrawCtx<'_>) -> anyhow::Result<()> + 'static,
    {
        self.draw.push(Box::new(hook))
    }

    /// Replaces every bound update hook with `hook`.
    pub fn set_update<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&mut UpdateCtx<'_>) -> anyhow::Result<()> + 'static,
    {
        self.update.replace(Box::new(hook))
    }

    /// Replaces every bound draw hook with `hook`.
    pub fn set_draw<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&mut DrawCtx<'_>) -> anyhow::Result<()> + 'static,
    {
        self.draw.replace(Box::new(hook))
    }

    pub fn unbind_update(&mut self, id: HookId) -> bool {
        self.update.remove(id)
    }

    pub fn unbind_draw(&mut self, id: HookId) -> bool {
        self.draw.remove(id)
    }

    pub fn clear_update(&mut self) {
        self.update.clear();
    }

    pub fn clear_draw(&mut self) {
        self.draw.clear();
    }

    #[inline]
    pub fn has_update(&self) -> bool {
        !self.update.is_empty()
    }

    #[inline]
    pub fn has_draw(&self) -> bool {
        !self.draw.is_empty()
    }

    /// Runs the bound update hooks once each, stopping at the first error.
    /// With nothing bound this does nothing.
    pub fn trigger_update(&mut self, ctx: &mut UpdateCtx<'_>) -> anyhow::Result<()> {
        for hook in self.update.iter_mut() {
            hook(&mut *ctx)?;
        }
        Ok(())
    }

    /// Runs the bound draw hooks once each, stopping at the first error.
    /// With nothing bound this does nothing.
    pub fn trigger_draw(&mut self, ctx: &mut DrawCtx<'_>) -> anyhow::Result<()> {
        for hook in self.draw.iter_mut() {
            hook(&mut *ctx)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("update_hooks", &self.update.len())
            .field("draw_hooks", &self.draw.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_bookkeeping() {
        let mut t = Template::new("ship");
        assert!(!t.has_update());
        assert!(!t.has_draw());

        let a = t.bind_update(|_| Ok(()));
        let b = t.bind_update(|_| Ok(()));
        assert_ne!(a, b);
        assert!(t.unbind_update(a));
        assert!(!t.unbind_update(a));
        assert!(t.has_update());

        t.set_update(|_| Ok(()));
        assert!(!t.unbind_update(b));
        t.clear_update();
        assert!(!t.has_update());

        t.bind_draw(|_| Ok(()));
        assert!(t.has_draw());
        t.clear_draw();
        assert!(!t.has_draw());
        assert_eq!(t.name(), "ship");
    }

    #[test]
    fn update_id_does_not_unbind_a_draw_hook() {
        let mut t = Template::new("ship");
        let update = t.bind_update(|_| Ok(()));
        t.bind_draw(|_| Ok(()));

        assert!(!t.unbind_draw(update));
        assert!(t.has_draw());
        assert!(t.has_update());
    }
}
