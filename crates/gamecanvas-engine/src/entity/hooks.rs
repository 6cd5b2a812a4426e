use std::sync::atomic::{AtomicU64, Ordering};

/// Handle returned when a hook is bound; pass it back to unbind that hook.
///
/// Ids are unique across every hook list in the process, so an id handed to
/// the wrong list matches nothing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

static NEXT_HOOK_ID: AtomicU64 = AtomicU64::new(0);

impl HookId {
    fn next() -> Self {
        Self(NEXT_HOOK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Ordered set of subscribers for one phase.
///
/// Hooks run in the order they were bound. An empty list is a no-op.
pub struct HookList<F: ?Sized> {
    hooks: Vec<(HookId, Box<F>)>,
}

impl<F: ?Sized> HookList<F> {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Appends `hook` after every hook already bound.
    pub fn push(&mut self, hook: Box<F>) -> HookId {
        let id = HookId::next();
        self.hooks.push((id, hook));
        id
    }

    /// Removes the hook bound under `id`. Returns `false` if it was not bound.
    pub fn remove(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(hid, _)| *hid != id);
        self.hooks.len() != before
    }

    /// Drops all hooks and binds `hook` alone.
    pub fn replace(&mut self, hook: Box<F>) -> HookId {
        self.hooks.clear();
        self.push(hook)
    }

    pub fn clear(&mut self) {
        self.hooks.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hooks in binding order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<F>> {
        self.hooks.iter_mut().map(|(_, hook)| hook)
    }
}

impl<F: ?Sized> Default for HookList<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> std::fmt::Debug for HookList<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|(id, _)| id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Hook = dyn FnMut(&mut Vec<u32>);

    fn run(list: &mut HookList<Hook>) -> Vec<u32> {
        let mut out = Vec::new();
        for hook in list.iter_mut() {
            hook(&mut out);
        }
        out
    }

    #[test]
    fn hooks_run_in_binding_order() {
        let mut list: HookList<Hook> = HookList::new();
        list.push(Box::new(|v: &mut Vec<u32>| v.push(1)));
        list.push(Box::new(|v: &mut Vec<u32>| v.push(2)));
        list.push(Box::new(|v: &mut Vec<u32>| v.push(3)));
        assert_eq!(run(&mut list), vec![1, 2, 3]);
    }

    #[test]
    fn remove_drops_only_that_hook() {
        let mut list: HookList<Hook> = HookList::new();
        list.push(Box::new(|v: &mut Vec<u32>| v.push(1)));
        let middle = list.push(Box::new(|v: &mut Vec<u32>| v.push(2)));
        list.push(Box::new(|v: &mut Vec<u32>| v.push(3)));

        assert!(list.remove(middle));
        assert!(!list.remove(middle));
        assert_eq!(run(&mut list), vec![1, 3]);
    }

    #[test]
    fn replace_leaves_a_single_hook() {
        let mut list: HookList<Hook> = HookList::new();
        list.push(Box::new(|v: &mut Vec<u32>| v.push(1)));
        list.push(Box::new(|v: &mut Vec<u32>| v.push(2)));
        list.replace(Box::new(|v: &mut Vec<u32>| v.push(9)));
        assert_eq!(list.len(), 1);
        assert_eq!(run(&mut list), vec![9]);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut list: HookList<Hook> = HookList::new();
        let a = list.push(Box::new(|_: &mut Vec<u32>| {}));
        list.remove(a);
        let b = list.push(Box::new(|_: &mut Vec<u32>| {}));
        assert_ne!(a, b);
    }

    #[test]
    fn foreign_id_is_rejected() {
        let mut updates: HookList<Hook> = HookList::new();
        let mut draws: HookList<Hook> = HookList::new();
        let update_id = updates.push(Box::new(|v: &mut Vec<u32>| v.push(1)));
        draws.push(Box::new(|v: &mut Vec<u32>| v.push(2)));

        assert!(!draws.remove(update_id));
        assert_eq!(run(&mut draws), vec![2]);
        assert_eq!(updates.len(), 1);
    }
}
