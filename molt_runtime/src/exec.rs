use molt_types::func::{FuncKind, Op, Operand};
use molt_types::id::{ActivationId, FuncId};
use tracing::{debug, trace};

use crate::classify::FrameKind;
use crate::func_table::FuncDef;
use crate::runtime::Runtime;
use crate::val::Val;

/// How one interpreter run of an activation ended.
#[derive(Debug)]
enum Flow {
    Completed(Val),
    Suspended,
}

impl Runtime {
    /// Host entry point. Sync funcs return their value directly; async funcs
    /// return `Val::Deferred` for their eventual result.
    pub fn invoke(&mut self, func: FuncId, args: Vec<Val>) -> Val {
        let depth = self.stack.depth();
        let ret = self.call_func(func, args, None);
        debug_assert_eq!(self.stack.depth(), depth, "unbalanced guest stack");
        ret
    }

    /// Drain the resume queue synchronously and exhaustively. Each resumption
    /// is non-preemptible: it runs to the next suspension point or to
    /// completion before the next one is dequeued.
    pub fn run_pending(&mut self) {
        while let Some(id) = self.resume_queue.pop_front() {
            self.resume(id);
        }
    }

    fn call_func(&mut self, func: FuncId, mut args: Vec<Val>, parent: Option<FrameKind>) -> Val {
        let slot = self.funcs.slot(func);
        let func_kind = slot.info.kind;
        let arity = slot.info.arity as usize;
        let generation = slot.generation;
        let def = slot.def.clone();

        match def {
            FuncDef::Native(hook) => {
                let id = self
                    .activations
                    .register(func, generation, None, args.clone(), None);
                self.stack.push(id, FrameKind::Native);
                trace!(activation = ?id, func = ?func, "entering native hook");
                let mut hook_ref = hook
                    .try_borrow_mut()
                    .expect("native hook re-entered itself");
                let ret = (&mut *hook_ref)(self, &args);
                drop(hook_ref);
                self.stack.pop();
                self.activations.mark_completed(id);
                ret
            },
            FuncDef::Ops(body) => {
                // missing args read as null
                while args.len() < arity {
                    args.push(Val::Null);
                }

                match func_kind {
                    FuncKind::Sync => {
                        // a sync call made during a resumption inherits its
                        // caller's externalized footing
                        let frame_kind = match parent {
                            Some(FrameKind::AsyncPostSuspend) => FrameKind::AsyncPostSuspend,
                            _ => FrameKind::SyncCall,
                        };
                        let id = self
                            .activations
                            .register(func, generation, Some(body), args, None);
                        self.stack.push(id, frame_kind);
                        let flow = self.step(id, frame_kind);
                        self.stack.pop();
                        match flow {
                            Flow::Completed(val) => {
                                self.activations.mark_completed(id);
                                val
                            },
                            Flow::Suspended => unreachable!("sync activation suspended: {:?}", id),
                        }
                    },
                    FuncKind::Async => {
                        let result = self.deferreds.create();
                        let id =
                            self.activations
                                .register(func, generation, Some(body), args, Some(result));
                        self.stack.push(id, FrameKind::AsyncPreSuspend);
                        let flow = self.step(id, FrameKind::AsyncPreSuspend);
                        self.stack.pop();
                        match flow {
                            Flow::Completed(val) => {
                                self.activations.mark_completed(id);
                                self.resolve_deferred(result, val);
                            },
                            Flow::Suspended => {
                                debug_assert!(
                                    self.funcs
                                        .slot(func)
                                        .lowered
                                        .as_ref()
                                        .map_or(false, |l| l.can_suspend()),
                                    "activation suspended under an artifact with no suspend points"
                                );
                                debug!(activation = ?id, func = ?func, "async activation externalized");
                                self.activations.mark_suspended(id);
                            },
                        }
                        Val::Deferred(result)
                    },
                    FuncKind::Native => unreachable!("native func with ops body"),
                }
            },
        }
    }

    /// One resumption step of a suspended, heap-resident activation. Pushes
    /// no frame for the activation itself; its state stays on the heap and
    /// calls it makes run as `AsyncPostSuspend`.
    fn resume(&mut self, id: ActivationId) {
        self.activations.mark_resumed(id);

        let awaiting = self.activations.get_mut(id).awaiting.take();
        if let Some(d) = awaiting {
            let val = self
                .deferreds
                .value(d)
                .expect("resumed activation still awaiting unresolved deferred");
            self.activations.get_mut(id).acc = val;
        }

        trace!(activation = ?id, "resuming");
        match self.step(id, FrameKind::AsyncPostSuspend) {
            Flow::Completed(val) => {
                let result = self
                    .activations
                    .get(id)
                    .result
                    .expect("resumed activation has no result deferred");
                self.activations.mark_completed(id);
                self.resolve_deferred(result, val);
            },
            Flow::Suspended => self.activations.mark_suspended(id),
        }
    }

    /// Run ops from the activation's saved pc until it returns or hits a
    /// suspension point. `ctx` is the frame kind this execution runs under
    /// and decides the footing of nested calls.
    fn step(&mut self, id: ActivationId, ctx: FrameKind) -> Flow {
        loop {
            let op = {
                let act = self.activations.get(id);
                let body = act.body.as_ref().expect("ops step on native activation");
                body.ops[act.pc].clone()
            };
            // advance first so a resumption continues after the await
            self.activations.get_mut(id).pc += 1;

            match op {
                Op::Const(lit) => {
                    let val = Val::from_literal(&lit, &mut self.strings);
                    self.activations.get_mut(id).acc = val;
                },
                Op::Call { target, args } => {
                    let target = self.eval_operand(id, &target);
                    let callee = target
                        .as_func()
                        .unwrap_or_else(|| panic!("call target is not a func: {:?}", target));
                    let argv: Vec<Val> = args.iter().map(|arg| self.eval_operand(id, arg)).collect();
                    let ret = self.call_func(callee, argv, Some(ctx));
                    self.activations.get_mut(id).acc = ret;
                },
                Op::Await => {
                    // externalize; the resumption is queued now if the value
                    // is already available, else when the deferred resolves
                    let acc = self.activations.get(id).acc;
                    match acc.as_deferred() {
                        Some(d) if self.deferreds.value(d).is_none() => {
                            self.activations.get_mut(id).awaiting = Some(d);
                            self.deferreds.add_waiter(d, id);
                        },
                        Some(d) => {
                            self.activations.get_mut(id).awaiting = Some(d);
                            self.resume_queue.push_back(id);
                        },
                        None => {
                            self.resume_queue.push_back(id);
                        },
                    }
                    return Flow::Suspended;
                },
                Op::Ret => {
                    return Flow::Completed(self.activations.get(id).acc);
                },
            }
        }
    }

    fn eval_operand(&mut self, id: ActivationId, operand: &Operand) -> Val {
        match operand {
            Operand::Param(n) => self.activations.get(id).args[*n as usize],
            Operand::Lit(lit) => Val::from_literal(lit, &mut self.strings),
            Operand::Func(func) => Val::Func(*func),
        }
    }
}
