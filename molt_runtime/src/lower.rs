use molt_types::func::{FuncBody, FuncInfo, FuncKind, Op, Operand};
use thiserror::Error;

/// Compiled artifact for one generation of a func body. Rebuilt (never
/// patched in place) whenever the body is redefined; activations hold the
/// artifact they started with.
#[derive(Debug)]
pub struct Lowered {
    /// Op offsets of `Await`s, i.e. the body's suspension points.
    pub suspend_points: Vec<usize>,
    pub op_count: usize,
}

impl Lowered {
    pub fn can_suspend(&self) -> bool {
        !self.suspend_points.is_empty()
    }
}

/// Body rejected before it ever reaches the patch engine. Not part of the
/// patch rejection taxonomy.
#[derive(Debug, Error)]
pub enum LowerError {
    #[error("await in synchronous function body")]
    AwaitInSyncFunc,
    #[error("await in native function body")]
    AwaitInNativeFunc,
    #[error("param index {0} out of range for arity {1}")]
    ParamOutOfRange(u32, u32),
    #[error("body does not end with a return")]
    MissingRet,
}

/// Validate `body` against the func's stable shape and precompute its
/// suspension layout.
pub fn lower(info: &FuncInfo, body: &FuncBody) -> Result<Lowered, LowerError> {
    let mut suspend_points = Vec::new();

    match body.ops.last() {
        Some(Op::Ret) => {},
        _ => return Err(LowerError::MissingRet),
    }

    for (offset, op) in body.ops.iter().enumerate() {
        match op {
            Op::Const(_) | Op::Ret => {},
            Op::Call { target, args } => {
                check_operand(info, target)?;
                for arg in args {
                    check_operand(info, arg)?;
                }
            },
            Op::Await => match info.kind {
                FuncKind::Async => suspend_points.push(offset),
                FuncKind::Sync => return Err(LowerError::AwaitInSyncFunc),
                FuncKind::Native => return Err(LowerError::AwaitInNativeFunc),
            },
        }
    }

    Ok(Lowered {
        suspend_points,
        op_count: body.ops.len(),
    })
}

fn check_operand(info: &FuncInfo, operand: &Operand) -> Result<(), LowerError> {
    if let Operand::Param(n) = operand {
        if *n >= info.arity {
            return Err(LowerError::ParamOutOfRange(*n, info.arity));
        }
    }
    Ok(())
}
