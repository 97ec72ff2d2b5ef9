use std::rc::Rc;

use molt_types::func::{FuncBody, FuncKind, Generation};
use molt_types::id::FuncId;
use thiserror::Error;
use tracing::debug;

use crate::classify::droppable;
use crate::func_table::FuncDef;
use crate::lower::{lower, LowerError, Lowered};
use crate::runtime::Runtime;

/// Why a redefinition was refused. Both kinds are recoverable and reported
/// with zero mutation; `code()` is the string-stable taxonomy exposed to
/// embedders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The target is on the stack at or beneath a frame that cannot be
    /// discarded and re-entered.
    #[error("patch rejected: BlockedByNonDroppableFrame")]
    BlockedByNonDroppableFrame,
    /// A suspended-but-unfinished activation still holds captured locals and
    /// a resumption offset laid out for the old body.
    #[error("patch rejected: BlockedByRunningGenerator")]
    BlockedByRunningGenerator,
}

impl RejectReason {
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::BlockedByNonDroppableFrame => "BlockedByNonDroppableFrame",
            RejectReason::BlockedByRunningGenerator => "BlockedByRunningGenerator",
        }
    }
}

pub type PatchResult = Result<Generation, RejectReason>;

/// A validated-for-shape redefinition request. Construction lowers the new
/// body, so a malformed body fails here and never reaches the engine.
#[derive(Debug)]
pub struct PatchRequest {
    pub func: FuncId,
    new_body: Rc<FuncBody>,
    lowered: Rc<Lowered>,
}

impl PatchRequest {
    pub fn compile(rt: &Runtime, func: FuncId, new_body: FuncBody) -> Result<Self, LowerError> {
        let info = &rt.funcs.slot(func).info;
        assert_ne!(
            info.kind,
            FuncKind::Native,
            "native hooks are not redefinable"
        );
        let lowered = lower(info, &new_body)?;
        Ok(Self {
            func,
            new_body: Rc::new(new_body),
            lowered: Rc::new(lowered),
        })
    }
}

impl Runtime {
    /// Decide whether `target` can be redefined right now. Fresh stack
    /// snapshot per call, no cross-call state; safe to re-enter from hooks.
    pub fn validate_patch(&self, target: FuncId) -> Result<(), RejectReason> {
        // Innermost to outermost: once the target has been seen on-stack,
        // the target's own frame and every frame enclosing it must be
        // droppable. This check runs before the heap check so an
        // actively-running activation is reported over a merely-suspended
        // one.
        let mut target_seen = false;
        for frame in self.stack.snapshot() {
            if self.activations.get(frame.activation).func == target {
                target_seen = true;
            }
            if target_seen && !droppable(frame.kind) {
                return Err(RejectReason::BlockedByNonDroppableFrame);
            }
        }

        // Any heap-resident, unfinished activation is still bound to the old
        // body's suspension layout.
        if self.activations.live_heap_resident_of(target).next().is_some() {
            return Err(RejectReason::BlockedByRunningGenerator);
        }

        Ok(())
    }

    /// Swap the body, bump the generation, replace the lowered artifact.
    /// Affects future invocations only; live activations keep the body and
    /// generation they bound at creation.
    fn apply_patch(&mut self, req: &PatchRequest) -> Generation {
        let slot = self.funcs.slot_mut(req.func);
        slot.def = FuncDef::Ops(req.new_body.clone());
        slot.lowered = Some(req.lowered.clone());
        slot.generation = slot.generation.bump();
        debug!(func = ?req.func, generation = slot.generation.index(), "patched func");
        slot.generation
    }

    /// The sole external patch operation: validate then apply as one
    /// synchronous step. Rejection is guaranteed side-effect free.
    pub fn request_patch(&mut self, req: PatchRequest) -> PatchResult {
        self.validate_patch(req.func)?;
        Ok(self.apply_patch(&req))
    }
}
