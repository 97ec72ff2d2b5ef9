pub mod activation;
pub mod classify;
pub mod deferred;
mod exec;
pub mod func_table;
pub mod lower;
pub mod patch;
pub mod runtime;
pub mod stack;
pub mod string_table;
pub mod val;
