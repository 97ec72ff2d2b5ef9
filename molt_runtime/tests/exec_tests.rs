use std::cell::Cell;
use std::rc::Rc;

use molt_runtime::runtime::Runtime;
use molt_runtime::val::Val;
use molt_types::func::{FuncBody, FuncKind, Literal, Op, Operand};
use molt_types::id::{DeferredId, FuncId};
use ordered_float::OrderedFloat;

fn ret_str(s: &str) -> FuncBody {
    FuncBody {
        ops: vec![Op::Const(Literal::Str(s.into())), Op::Ret],
    }
}

/// `cb(); return s` for a sync func.
fn call_then_ret(s: &str) -> FuncBody {
    FuncBody {
        ops: vec![
            Op::Call {
                target: Operand::Param(0),
                args: vec![],
            },
            Op::Const(Literal::Str(s.into())),
            Op::Ret,
        ],
    }
}

/// `await cb(); return s` for an async func.
fn await_then_ret(s: &str) -> FuncBody {
    FuncBody {
        ops: vec![
            Op::Call {
                target: Operand::Param(0),
                args: vec![],
            },
            Op::Await,
            Op::Const(Literal::Str(s.into())),
            Op::Ret,
        ],
    }
}

#[test]
fn sync_invoke_returns_literal() {
    let mut rt = Runtime::new();
    let f = rt
        .define_func("f", FuncKind::Sync, 0, ret_str("Cat"))
        .unwrap();

    let cat = rt.strings.put("Cat");
    assert_eq!(rt.invoke(f, vec![]), Val::Str(cat));
}

#[test]
fn sync_call_returns_callback_value() {
    let mut rt = Runtime::new();
    let f = rt
        .define_func(
            "f",
            FuncKind::Sync,
            1,
            FuncBody {
                ops: vec![
                    Op::Call {
                        target: Operand::Param(0),
                        args: vec![],
                    },
                    Op::Ret,
                ],
            },
        )
        .unwrap();
    let cb = rt.define_native("cb", |_rt, _args| Val::Float(OrderedFloat(7.0)));

    assert_eq!(
        rt.invoke(f, vec![Val::Func(cb)]),
        Val::Float(OrderedFloat(7.0))
    );
}

#[test]
fn async_completes_after_drain() {
    let mut rt = Runtime::new();
    let a = rt
        .define_func("a", FuncKind::Async, 1, await_then_ret("Cat"))
        .unwrap();
    let noop = rt.define_native("noop", |_rt, _args| Val::Null);

    let promise = rt
        .invoke(a, vec![Val::Func(noop)])
        .as_deferred()
        .expect("async invoke produces a deferred");

    // the await externalized the activation; nothing resolves until the
    // resume queue is drained
    assert_eq!(rt.deferred_value(promise), None);

    rt.run_pending();
    let cat = rt.strings.put("Cat");
    assert_eq!(rt.deferred_value(promise), Some(Val::Str(cat)));
}

#[test]
fn async_suspends_on_pending_deferred() {
    let mut rt = Runtime::new();
    let a = rt
        .define_func("a", FuncKind::Async, 1, await_then_ret("Cat"))
        .unwrap();

    let pending: Rc<Cell<Option<DeferredId>>> = Rc::new(Cell::new(None));
    let cb = {
        let pending = pending.clone();
        rt.define_native("cb", move |rt, _args| {
            let d = rt.new_deferred();
            pending.set(Some(d));
            Val::Deferred(d)
        })
    };

    let promise = rt.invoke(a, vec![Val::Func(cb)]).as_deferred().unwrap();

    // nothing to run until the awaited deferred resolves
    rt.run_pending();
    assert_eq!(rt.deferred_value(promise), None);

    rt.resolve_deferred(pending.get().unwrap(), Val::Null);
    rt.run_pending();
    let cat = rt.strings.put("Cat");
    assert_eq!(rt.deferred_value(promise), Some(Val::Str(cat)));
}

#[test]
fn await_of_plain_value_resumes_immediately() {
    let mut rt = Runtime::new();
    let a = rt
        .define_func(
            "a",
            FuncKind::Async,
            0,
            FuncBody {
                ops: vec![Op::Const(Literal::Float(3.0)), Op::Await, Op::Ret],
            },
        )
        .unwrap();

    let promise = rt.invoke(a, vec![]).as_deferred().unwrap();
    rt.run_pending();
    assert_eq!(rt.deferred_value(promise), Some(Val::Float(OrderedFloat(3.0))));
}

#[test]
fn interleaved_activations_both_complete() {
    let mut rt = Runtime::new();
    let a = rt
        .define_func("a", FuncKind::Async, 1, await_then_ret("Cat"))
        .unwrap();
    let noop = rt.define_native("noop", |_rt, _args| Val::Null);

    let p1 = rt.invoke(a, vec![Val::Func(noop)]).as_deferred().unwrap();
    let p2 = rt.invoke(a, vec![Val::Func(noop)]).as_deferred().unwrap();
    rt.run_pending();

    let cat = rt.strings.put("Cat");
    assert_eq!(rt.deferred_value(p1), Some(Val::Str(cat)));
    assert_eq!(rt.deferred_value(p2), Some(Val::Str(cat)));
}

#[test]
fn sync_callback_runs_before_return() {
    let mut rt = Runtime::new();
    let f = rt
        .define_func("f", FuncKind::Sync, 1, call_then_ret("Cat"))
        .unwrap();

    let ran = Rc::new(Cell::new(false));
    let cb = {
        let ran = ran.clone();
        rt.define_native("cb", move |_rt, _args| {
            ran.set(true);
            Val::Null
        })
    };

    let cat = rt.strings.put("Cat");
    assert_eq!(rt.invoke(f, vec![Val::Func(cb)]), Val::Str(cat));
    assert!(ran.get());
}

#[test]
#[should_panic(expected = "re-entered itself")]
fn self_reentrant_hook_panics() {
    let mut rt = Runtime::new();

    let own_id: Rc<Cell<Option<FuncId>>> = Rc::new(Cell::new(None));
    let hook = {
        let own_id = own_id.clone();
        rt.define_native("loopy", move |rt, _args| {
            rt.invoke(own_id.get().unwrap(), vec![])
        })
    };
    own_id.set(Some(hook));

    rt.invoke(hook, vec![]);
}
