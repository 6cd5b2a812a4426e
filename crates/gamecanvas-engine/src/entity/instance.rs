use crate::coords::Vec2;

use super::TemplateId;

/// Generational handle to a live instance.
///
/// When an instance is despawned its slot may be reused, but the generation
/// is bumped, so stale handles never reach the new occupant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct InstanceId {
    index: u32,
    generation: u32,
}

impl InstanceId {
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Per-instance state.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct InstanceState {
    pub position: Vec2,
    /// Advisory layer value for the application's own use. The driver does not
    /// sort by it: instances always update and draw in insertion order.
    pub depth: f32,
}

impl InstanceState {
    #[inline]
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            depth: 0.0,
        }
    }

    #[inline]
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Instance {
    pub(crate) template: TemplateId,
    pub(crate) state: InstanceState,
}

/// Slot storage for instances with index recycling through a free list.
#[derive(Debug, Default)]
pub(crate) struct InstanceStore {
    slots: Vec<(InstanceId, Option<Instance>)>,
    free: Vec<u32>,
    live: usize,
}

impl InstanceStore {
    pub(crate) fn insert(&mut self, instance: Instance) -> InstanceId {
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let (id, slot) = &mut self.slots[index as usize];
            id.generation = id.generation.wrapping_add(1);
            *slot = Some(instance);
            return *id;
        }

        let id = InstanceId {
            index: self.slots.len() as u32,
            generation: 0,
        };
        self.slots.push((id, Some(instance)));
        id
    }

    pub(crate) fn remove(&mut self, id: InstanceId) -> Option<Instance> {
        let (slot_id, slot) = self.slots.get_mut(id.index as usize)?;
        if *slot_id != id {
            return None;
        }
        let removed = slot.take()?;
        self.free.push(id.index);
        self.live -= 1;
        Some(removed)
    }

    pub(crate) fn get(&self, id: InstanceId) -> Option<&Instance> {
        match self.slots.get(id.index as usize) {
            Some((slot_id, slot)) if *slot_id == id => slot.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        match self.slots.get_mut(id.index as usize) {
            Some((slot_id, slot)) if *slot_id == id => slot.as_mut(),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(x: f32) -> Instance {
        Instance {
            template: TemplateId::from_raw(0),
            state: InstanceState::at(x, 0.0),
        }
    }

    #[test]
    fn recycled_slot_rejects_stale_handle() {
        let mut store = InstanceStore::default();
        let old = store.insert(instance(1.0));
        assert!(store.remove(old).is_some());

        let new = store.insert(instance(2.0));
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());

        assert!(store.get(old).is_none());
        assert!(store.remove(old).is_none());
        assert_eq!(store.get(new).unwrap().state.position.x, 2.0);
    }

    #[test]
    fn len_counts_live_instances() {
        let mut store = InstanceStore::default();
        let a = store.insert(instance(0.0));
        store.insert(instance(0.0));
        assert_eq!(store.len(), 2);
        store.remove(a);
        store.remove(a);
        assert_eq!(store.len(), 1);
    }
}
