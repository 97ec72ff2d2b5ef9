use serde::{Deserialize, Serialize};

use crate::id::{FuncId, StringId};

/// Version tag for a func's executable body. Bumped on every successful
/// redefinition; activations capture the generation they were created under
/// and never rebind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Generation(u32);

impl Generation {
    pub fn bump(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn index(self) -> u32 {
        self.0 as _
    }
}

/// Holds run-time information about a func. Everything here is stable across
/// redefinition; only the body (and its generation) changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncInfo {
    pub name: StringId,
    pub kind: FuncKind,
    pub arity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuncKind {
    /// Plain call, runs to completion on the guest stack.
    Sync,
    /// Suspendable; invocation produces a deferred result.
    Async,
    /// Host hook. No ops body, not redefinable.
    Native,
}

/// Executable body: a flat op sequence over a single accumulator.
/// Small on purpose; just enough to express callback-then-return shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncBody {
    pub ops: Vec<Op>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// acc = literal
    Const(Literal),
    /// acc = target(args..)
    Call { target: Operand, args: Vec<Operand> },
    /// Suspend on acc. Only legal in async bodies.
    Await,
    /// Return acc.
    Ret,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// Nth argument of the running activation.
    Param(u32),
    Lit(Literal),
    Func(FuncId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Float(f32),
    Str(String),
}
