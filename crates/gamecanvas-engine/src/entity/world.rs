use anyhow::Context as _;
use embedded_graphics::geometry::Point;

use crate::canvas::{DrawingContext, Framebuffer};
use crate::coords::Viewport;
use crate::core::{DrawCtx, UpdateCtx};
use crate::time::FrameTime;

use super::instance::{Instance, InstanceStore};
use super::{Commands, InstanceId, InstanceState, Template, TemplateId};

struct TemplateEntry {
    id: TemplateId,
    template: Template,
    /// Insertion order; this is the update/draw order.
    instances: Vec<InstanceId>,
}

/// Registered templates and their live instances.
///
/// Templates are kept in registration order and each keeps its instances in
/// insertion order. Instance state lives in a flat slot store; templates only
/// hold ids into it.
pub struct World {
    entries: Vec<TemplateEntry>,
    store: InstanceStore,
    next_template: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            store: InstanceStore::default(),
            next_template: 0,
        }
    }

    /// Adds `template` after all registered templates.
    pub fn register(&mut self, template: Template) -> TemplateId {
        let id = TemplateId::from_raw(self.next_template);
        self.next_template += 1;
        log::debug!("registered template `{}` as {id:?}", template.name());
        self.entries.push(TemplateEntry {
            id,
            template,
            instances: Vec::new(),
        });
        id
    }

    /// Removes a template, despawning all of its instances.
    pub fn unregister(&mut self, id: TemplateId) -> Option<Template> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(pos);
        for instance in &entry.instances {
            self.store.remove(*instance);
        }
        log::debug!(
            "unregistered template `{}` ({} instances dropped)",
            entry.template.name(),
            entry.instances.len()
        );
        Some(entry.template)
    }

    pub fn template(&self, id: TemplateId) -> Option<&Template> {
        self.entry(id).map(|e| &e.template)
    }

    pub fn template_mut(&mut self, id: TemplateId) -> Option<&mut Template> {
        self.entry_mut(id).map(|e| &mut e.template)
    }

    /// Templates in registration order.
    pub fn templates(&self) -> impl Iterator<Item = (TemplateId, &Template)> {
        self.entries.iter().map(|e| (e.id, &e.template))
    }

    #[inline]
    pub fn template_count(&self) -> usize {
        self.entries.len()
    }

    /// Appends a new instance of `template`. Returns `None` if the template is
    /// not registered.
    ///
    /// Identical states may be spawned any number of times; every call yields
    /// a distinct, independently tracked instance.
    pub fn spawn(&mut self, template: TemplateId, state: InstanceState) -> Option<InstanceId> {
        let pos = self.entries.iter().position(|e| e.id == template)?;
        let id = self.store.insert(Instance { template, state });
        self.entries[pos].instances.push(id);
        Some(id)
    }

    /// Removes an instance, returning its last state.
    pub fn despawn(&mut self, id: InstanceId) -> Option<InstanceState> {
        let instance = self.store.remove(id)?;
        if let Some(entry) = self.entry_mut(instance.template) {
            entry.instances.retain(|i| *i != id);
        }
        Some(instance.state)
    }

    /// Instance ids of `template` in insertion order; empty if unknown.
    pub fn instances_of(&self, template: TemplateId) -> &[InstanceId] {
        self.entry(template).map_or(&[], |e| e.instances.as_slice())
    }

    pub fn instance(&self, id: InstanceId) -> Option<&InstanceState> {
        self.store.get(id).map(|i| &i.state)
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut InstanceState> {
        self.store.get_mut(id).map(|i| &mut i.state)
    }

    pub fn template_of(&self, id: InstanceId) -> Option<TemplateId> {
        self.store.get(id).map(|i| i.template)
    }

    /// Live instances across all templates.
    #[inline]
    pub fn instance_count(&self) -> usize {
        self.store.len()
    }

    /// Runs every instance's update hooks: templates in registration order,
    /// instances in insertion order. Edits go through `commands`.
    pub(crate) fn run_update(
        &mut self,
        viewport: Viewport,
        time: FrameTime,
        commands: &mut Commands,
    ) -> anyhow::Result<()> {
        let Self { entries, store, .. } = self;

        for entry in entries.iter_mut() {
            if !entry.template.has_update() {
                continue;
            }
            for &id in &entry.instances {
                let Some(instance) = store.get_mut(id) else { continue };
                let mut ctx = UpdateCtx {
                    id,
                    template: entry.id,
                    state: &mut instance.state,
                    viewport,
                    time,
                    commands: &mut *commands,
                };
                entry
                    .template
                    .trigger_update(&mut ctx)
                    .with_context(|| format!("template `{}`, instance {id:?}", entry.template.name()))?;
            }
        }

        Ok(())
    }

    /// Runs every instance's draw hooks in the same order as [`run_update`],
    /// drawing in world coordinates.
    ///
    /// [`run_update`]: Self::run_update
    pub(crate) fn run_draw(
        &mut self,
        framebuffer: &mut Framebuffer,
        viewport: Viewport,
        time: FrameTime,
    ) -> anyhow::Result<()> {
        let Self { entries, store, .. } = self;
        let origin = Point::new(viewport.x, viewport.y);

        for entry in entries.iter_mut() {
            if !entry.template.has_draw() {
                continue;
            }
            for &id in &entry.instances {
                let Some(instance) = store.get(id) else { continue };
                let mut ctx = DrawCtx {
                    id,
                    template: entry.id,
                    state: &instance.state,
                    viewport,
                    time,
                    canvas: DrawingContext::world(&mut *framebuffer, origin),
                };
                entry
                    .template
                    .trigger_draw(&mut ctx)
                    .with_context(|| format!("template `{}`, instance {id:?}", entry.template.name()))?;
            }
        }

        Ok(())
    }

    fn entry(&self, id: TemplateId) -> Option<&TemplateEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: TemplateId) -> Option<&mut TemplateEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("templates", &self.entries.iter().map(|e| &e.template).collect::<Vec<_>>())
            .field("instances", &self.store.len())
            .finish()
    }
}
