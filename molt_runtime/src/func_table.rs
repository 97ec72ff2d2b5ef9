use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use index_vec::IndexVec;
use molt_types::func::{FuncBody, FuncInfo, Generation};
use molt_types::id::FuncId;

use crate::lower::Lowered;
use crate::runtime::Runtime;
use crate::val::Val;

/// Host hook callable from guest code. Receives the runtime re-entrantly;
/// this is the explicit-context replacement for a global debug listener.
pub type NativeFn = Rc<RefCell<dyn FnMut(&mut Runtime, &[Val]) -> Val>>;

#[derive(Clone)]
pub enum FuncDef {
    Ops(Rc<FuncBody>),
    Native(NativeFn),
}

impl fmt::Debug for FuncDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuncDef::Ops(body) => f.debug_tuple("Ops").field(&body.ops.len()).finish(),
            FuncDef::Native(_) => f.write_str("Native(..)"),
        }
    }
}

/// One redefinable unit. `info` is stable identity; `def`, `lowered` and
/// `generation` move together under the source patcher.
#[derive(Debug)]
pub struct FuncSlot {
    pub info: FuncInfo,
    pub def: FuncDef,
    pub generation: Generation,
    /// None for native hooks.
    pub lowered: Option<Rc<Lowered>>,
}

/// All funcs known to the runtime, indexed by stable id.
#[derive(Debug, Default)]
pub struct FuncTable {
    slots: IndexVec<FuncId, FuncSlot>,
}

impl FuncTable {
    pub fn new() -> Self {
        Self {
            slots: IndexVec::new(),
        }
    }

    pub fn register(
        &mut self, info: FuncInfo, def: FuncDef, lowered: Option<Rc<Lowered>>,
    ) -> FuncId {
        self.slots.push(FuncSlot {
            info,
            def,
            generation: Generation::default(),
            lowered,
        })
    }

    pub fn slot(&self, id: FuncId) -> &FuncSlot {
        &self.slots[id]
    }

    pub(crate) fn slot_mut(&mut self, id: FuncId) -> &mut FuncSlot {
        &mut self.slots[id]
    }
}
