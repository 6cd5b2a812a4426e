use super::{InstanceId, InstanceState, TemplateId, World};

enum Command {
    Spawn {
        template: TemplateId,
        state: InstanceState,
    },
    Despawn(InstanceId),
}

/// Deferred world edits recorded by per-instance update hooks.
///
/// The instance list cannot change while it is being walked, so hooks queue
/// spawns and despawns here. The driver applies them in recording order as
/// soon as the per-instance update phase ends, before the global update hook.
#[derive(Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn spawn(&mut self, template: TemplateId, state: InstanceState) {
        self.queue.push(Command::Spawn { template, state });
    }

    pub fn despawn(&mut self, id: InstanceId) {
        self.queue.push(Command::Despawn(id));
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drops queued commands without applying them.
    pub(crate) fn discard(&mut self) {
        self.queue.clear();
    }

    pub(crate) fn apply(&mut self, world: &mut World) {
        for cmd in self.queue.drain(..) {
            match cmd {
                Command::Spawn { template, state } => {
                    if world.spawn(template, state).is_none() {
                        log::warn!("spawn for unregistered template {template:?} dropped");
                    }
                }
                Command::Despawn(id) => {
                    if world.despawn(id).is_none() {
                        log::warn!("despawn of unknown instance {id:?} ignored");
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commands").field("queued", &self.queue.len()).finish()
    }
}
