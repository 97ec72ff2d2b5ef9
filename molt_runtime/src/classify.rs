/// What kind of execution a guest stack frame represents. Assigned by the
/// executor when the frame is pushed; droppability is derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Host hook running on behalf of guest code.
    Native,
    /// Synchronous body entered from the host or from not-yet-suspended code.
    SyncCall,
    /// An async activation that has not reached its first suspension point.
    AsyncPreSuspend,
    /// A call made during the resumption of a heap-resident async activation.
    /// The only frames with a fully externalized caller.
    AsyncPostSuspend,
}

/// Whether a frame of this kind can be discarded and re-entered without
/// information loss. Single decision table, no dispatch.
pub fn droppable(kind: FrameKind) -> bool {
    match kind {
        // host code has no externalizable execution state
        FrameKind::Native => false,
        // plain sync bodies have no suspension model to rebuild from
        FrameKind::SyncCall => false,
        // unwinding here would lose control flow the runtime can't package;
        // the activation only becomes externalizable at its first suspension
        FrameKind::AsyncPreSuspend => false,
        // caller is already off-stack, so the frame's one obligation (finish
        // this call) can be reconstructed by re-invoking it fresh
        FrameKind::AsyncPostSuspend => true,
    }
}
