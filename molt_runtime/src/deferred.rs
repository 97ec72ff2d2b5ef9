use index_vec::IndexVec;
use molt_types::id::{ActivationId, DeferredId};

use crate::val::Val;

/// A value that may not exist yet. Suspended activations park themselves on
/// the waiter list; resolution hands them to the resume queue.
#[derive(Debug)]
pub enum DeferredState {
    Pending { waiters: Vec<ActivationId> },
    Resolved(Val),
}

#[derive(Debug, Default)]
pub struct DeferredTable {
    arena: IndexVec<DeferredId, DeferredState>,
}

impl DeferredTable {
    pub fn new() -> Self {
        Self {
            arena: IndexVec::new(),
        }
    }

    pub fn create(&mut self) -> DeferredId {
        self.arena.push(DeferredState::Pending {
            waiters: Vec::new(),
        })
    }

    pub fn value(&self, id: DeferredId) -> Option<Val> {
        match &self.arena[id] {
            DeferredState::Pending { .. } => None,
            DeferredState::Resolved(v) => Some(*v),
        }
    }

    pub(crate) fn add_waiter(&mut self, id: DeferredId, waiter: ActivationId) {
        match &mut self.arena[id] {
            DeferredState::Pending { waiters } => waiters.push(waiter),
            DeferredState::Resolved(_) => panic!("waiter added to resolved deferred: {:?}", id),
        }
    }

    /// Resolve and hand back the parked waiters, in park order. The caller
    /// owns queueing them; this table knows nothing about scheduling.
    pub(crate) fn resolve(&mut self, id: DeferredId, val: Val) -> Vec<ActivationId> {
        match std::mem::replace(&mut self.arena[id], DeferredState::Resolved(val)) {
            DeferredState::Pending { waiters } => waiters,
            DeferredState::Resolved(_) => panic!("deferred resolved twice: {:?}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use molt_types::id::ActivationId;

    use super::DeferredTable;
    use crate::val::Val;

    #[test]
    fn resolve_hands_back_waiters() {
        let mut table = DeferredTable::new();
        let d = table.create();
        assert_eq!(table.value(d), None);

        table.add_waiter(d, ActivationId::new(3));
        table.add_waiter(d, ActivationId::new(1));

        let waiters = table.resolve(d, Val::Null);
        assert_eq!(
            waiters,
            vec![ActivationId::new(3), ActivationId::new(1)]
        );
        assert_eq!(table.value(d), Some(Val::Null));
    }

    #[test]
    #[should_panic(expected = "resolved twice")]
    fn double_resolve_panics() {
        let mut table = DeferredTable::new();
        let d = table.create();
        table.resolve(d, Val::Null);
        table.resolve(d, Val::Null);
    }
}
