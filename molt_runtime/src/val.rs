use molt_types::func::Literal;
use molt_types::id::{DeferredId, FuncId, StringId};
use ordered_float::OrderedFloat;

use crate::string_table::StringTable;

/// Runtime value. Kept `Copy`; strings live in the string table.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Val {
    Null,
    Float(OrderedFloat<f32>),
    Str(StringId),
    /// First-class reference to a func, callable as `Op::Call` target.
    Func(FuncId),
    /// Handle to a deferred (possibly unresolved) result.
    Deferred(DeferredId),
}

impl Val {
    pub fn from_literal(lit: &Literal, strings: &mut StringTable) -> Val {
        match lit {
            Literal::Null => Val::Null,
            Literal::Float(f) => Val::Float(OrderedFloat(*f)),
            Literal::Str(s) => Val::Str(strings.put(s.as_str())),
        }
    }

    pub fn as_func(self) -> Option<FuncId> {
        match self {
            Val::Func(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_deferred(self) -> Option<DeferredId> {
        match self {
            Val::Deferred(id) => Some(id),
            _ => None,
        }
    }
}
