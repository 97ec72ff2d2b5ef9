use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use molt_types::func::{FuncBody, FuncInfo, FuncKind, Generation};
use molt_types::id::{ActivationId, DeferredId, FuncId};
use tracing::debug;

use crate::activation::ActivationRegistry;
use crate::deferred::DeferredTable;
use crate::func_table::{FuncDef, FuncTable};
use crate::lower::{lower, LowerError};
use crate::stack::FrameStack;
use crate::string_table::StringTable;
use crate::val::Val;

/// The whole guest world: funcs, activations, deferreds, the guest stack and
/// the queue of pending resumptions. Single-threaded cooperative; nothing in
/// here is shared across threads.
#[derive(Debug)]
pub struct Runtime {
    pub strings: StringTable,
    pub(crate) funcs: FuncTable,
    pub(crate) activations: ActivationRegistry,
    pub(crate) deferreds: DeferredTable,
    pub(crate) stack: FrameStack,
    pub(crate) resume_queue: VecDeque<ActivationId>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            strings: StringTable::new(),
            funcs: FuncTable::new(),
            activations: ActivationRegistry::new(),
            deferreds: DeferredTable::new(),
            stack: FrameStack::new(),
            resume_queue: VecDeque::new(),
        }
    }

    /// Register a guest func. Lowering failure surfaces here, before the
    /// func can ever be invoked or patched.
    pub fn define_func(
        &mut self, name: &str, kind: FuncKind, arity: u32, body: FuncBody,
    ) -> Result<FuncId, LowerError> {
        assert_ne!(kind, FuncKind::Native, "use define_native for host hooks");
        let info = FuncInfo {
            name: self.strings.put(name),
            kind,
            arity,
        };
        let lowered = lower(&info, &body)?;
        let id = self
            .funcs
            .register(info, FuncDef::Ops(Rc::new(body)), Some(Rc::new(lowered)));
        debug!(func = ?id, name, ?kind, "defined func");
        Ok(id)
    }

    /// Register a host hook as a first-class func. Hooks get the runtime
    /// re-entrantly and may invoke guest code or request patches. A hook
    /// must not invoke itself, directly or transitively; doing so panics.
    pub fn define_native<F>(&mut self, name: &str, f: F) -> FuncId
    where
        F: FnMut(&mut Runtime, &[Val]) -> Val + 'static,
    {
        let info = FuncInfo {
            name: self.strings.put(name),
            kind: FuncKind::Native,
            arity: 0,
        };
        let id = self
            .funcs
            .register(info, FuncDef::Native(Rc::new(RefCell::new(f))), None);
        debug!(func = ?id, name, "defined native hook");
        id
    }

    pub fn func_info(&self, func: FuncId) -> &FuncInfo {
        &self.funcs.slot(func).info
    }

    pub fn generation_of(&self, func: FuncId) -> Generation {
        self.funcs.slot(func).generation
    }

    pub fn new_deferred(&mut self) -> DeferredId {
        self.deferreds.create()
    }

    /// Resolve a deferred and queue its waiters. Does not run them; drain
    /// with `run_pending`.
    pub fn resolve_deferred(&mut self, id: DeferredId, val: Val) {
        for waiter in self.deferreds.resolve(id, val) {
            self.resume_queue.push_back(waiter);
        }
    }

    pub fn deferred_value(&self, id: DeferredId) -> Option<Val> {
        self.deferreds.value(id)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
