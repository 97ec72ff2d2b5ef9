pub mod func;
pub mod id;
