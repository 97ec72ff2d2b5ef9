use molt_types::id::ActivationId;

use crate::classify::FrameKind;

/// The guest call stack. Only guest activations appear here; a heap-resident
/// async activation being resumed pushes no frame of its own, its state never
/// comes back on-stack.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub activation: ActivationId,
    pub kind: FrameKind,
}

/// Snapshot view of one on-stack frame. Depth 0 is innermost.
#[derive(Debug, Clone, Copy)]
pub struct FrameDescriptor {
    pub activation: ActivationId,
    pub kind: FrameKind,
    pub depth: usize,
}

impl FrameStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub(crate) fn push(&mut self, activation: ActivationId, kind: FrameKind) {
        self.frames.push(Frame { activation, kind });
    }

    pub(crate) fn pop(&mut self) -> Frame {
        self.frames
            .pop()
            .expect("frame pop with no active execution context")
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Ordered walk of the current stack, innermost first. Restartable and
    /// side-effect free; an empty result means only the host frame is live.
    pub fn snapshot(&self) -> Vec<FrameDescriptor> {
        self.frames
            .iter()
            .rev()
            .enumerate()
            .map(|(depth, frame)| FrameDescriptor {
                activation: frame.activation,
                kind: frame.kind,
                depth,
            })
            .collect()
    }
}
