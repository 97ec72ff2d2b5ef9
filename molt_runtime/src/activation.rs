use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use index_vec::IndexVec;
use molt_types::func::{FuncBody, Generation};
use molt_types::id::{ActivationId, DeferredId, FuncId};

use crate::val::Val;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    Running,
    Suspended,
    Completed,
}

/// Where an activation's execution state lives. A field transition, not a
/// type change: suspending moves the same record off-stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    OnStack,
    HeapResident,
}

/// One invocation instance of a func. The bound body and generation are
/// captured at creation and never rebound; an activation always finishes
/// running the code it started with, even across a redefinition.
#[derive(Debug)]
pub struct Activation {
    pub id: ActivationId,
    pub func: FuncId,
    pub generation: Generation,
    /// None for native hooks, which carry no ops.
    pub(crate) body: Option<Rc<FuncBody>>,
    pub state: CompletionState,
    pub location: Location,

    // externalized interpreter state
    pub(crate) pc: usize,
    pub(crate) acc: Val,
    pub(crate) args: Vec<Val>,
    pub(crate) awaiting: Option<DeferredId>,
    /// Produced-value handle for async activations.
    pub result: Option<DeferredId>,
}

/// Arena of all activations plus an index of the ones that can block a
/// patch: heap-resident and not yet completed. `mark_completed` drops the
/// index entry; that is the reclamation boundary.
#[derive(Debug, Default)]
pub struct ActivationRegistry {
    arena: IndexVec<ActivationId, Activation>,
    live_heap: HashMap<FuncId, BTreeSet<ActivationId>>,
}

impl ActivationRegistry {
    pub fn new() -> Self {
        Self {
            arena: IndexVec::new(),
            live_heap: HashMap::new(),
        }
    }

    pub fn register(
        &mut self, func: FuncId, generation: Generation, body: Option<Rc<FuncBody>>,
        args: Vec<Val>, result: Option<DeferredId>,
    ) -> ActivationId {
        let id = self.arena.next_idx();
        self.arena.push(Activation {
            id,
            func,
            generation,
            body,
            state: CompletionState::Running,
            location: Location::OnStack,
            pc: 0,
            acc: Val::Null,
            args,
            awaiting: None,
            result,
        });
        id
    }

    pub fn get(&self, id: ActivationId) -> &Activation {
        &self.arena[id]
    }

    pub(crate) fn get_mut(&mut self, id: ActivationId) -> &mut Activation {
        &mut self.arena[id]
    }

    /// Externalize: the native frame is gone, the record now lives on the
    /// heap until it completes.
    pub fn mark_suspended(&mut self, id: ActivationId) {
        let act = &mut self.arena[id];
        debug_assert_ne!(act.state, CompletionState::Completed);
        act.state = CompletionState::Suspended;
        act.location = Location::HeapResident;
        self.live_heap.entry(act.func).or_default().insert(id);
    }

    /// Back to Running for a resumption step. Location stays HeapResident and
    /// the live index keeps its entry; a mid-resumption activation still
    /// blocks a patch of its func.
    pub(crate) fn mark_resumed(&mut self, id: ActivationId) {
        let act = &mut self.arena[id];
        debug_assert_eq!(act.state, CompletionState::Suspended);
        act.state = CompletionState::Running;
    }

    pub fn mark_completed(&mut self, id: ActivationId) {
        let act = &mut self.arena[id];
        act.state = CompletionState::Completed;
        if let Some(set) = self.live_heap.get_mut(&act.func) {
            set.remove(&id);
            if set.is_empty() {
                self.live_heap.remove(&act.func);
            }
        }
    }

    /// Heap-resident, non-completed activations of `func`.
    pub fn live_heap_resident_of(&self, func: FuncId) -> impl Iterator<Item = ActivationId> + '_ {
        self.live_heap
            .get(&func)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use molt_types::func::Generation;
    use molt_types::id::FuncId;

    use super::{ActivationRegistry, CompletionState, Location};

    #[test]
    fn lifecycle() {
        let mut reg = ActivationRegistry::new();
        let func = FuncId::new(0);
        let id = reg.register(func, Generation::default(), None, vec![], None);

        assert_eq!(reg.get(id).state, CompletionState::Running);
        assert_eq!(reg.get(id).location, Location::OnStack);
        assert_eq!(reg.live_heap_resident_of(func).count(), 0);

        reg.mark_suspended(id);
        assert_eq!(reg.get(id).state, CompletionState::Suspended);
        assert_eq!(reg.get(id).location, Location::HeapResident);
        assert_eq!(reg.live_heap_resident_of(func).count(), 1);

        // resumption keeps the live entry
        reg.mark_resumed(id);
        assert_eq!(reg.live_heap_resident_of(func).count(), 1);

        reg.mark_completed(id);
        assert_eq!(reg.get(id).state, CompletionState::Completed);
        assert_eq!(reg.live_heap_resident_of(func).count(), 0);
    }

    #[test]
    fn live_index_tracks_per_func() {
        let mut reg = ActivationRegistry::new();
        let f0 = FuncId::new(0);
        let f1 = FuncId::new(1);
        let a = reg.register(f0, Generation::default(), None, vec![], None);
        let b = reg.register(f1, Generation::default(), None, vec![], None);

        reg.mark_suspended(a);
        reg.mark_suspended(b);
        assert_eq!(reg.live_heap_resident_of(f0).count(), 1);
        assert_eq!(reg.live_heap_resident_of(f1).count(), 1);

        reg.mark_completed(a);
        assert_eq!(reg.live_heap_resident_of(f0).count(), 0);
        assert_eq!(reg.live_heap_resident_of(f1).count(), 1);
    }
}
