use index_vec::define_index_type;

define_index_type! {pub struct FuncId = u32;}
define_index_type! {pub struct ActivationId = u32;}
define_index_type! {pub struct DeferredId = u32;}
define_index_type! {pub struct StringId = u64;}
