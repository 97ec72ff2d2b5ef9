use std::borrow::Cow;
use std::collections::HashMap;

use molt_types::id::StringId;

/// Interned guest strings. Id 0 is reserved for the empty string so empty
/// literals never allocate.
// TODO: no GC, static literals pile up over long sessions
#[derive(Debug)]
pub struct StringTable {
    strings: HashMap<StringId, String>,
    ids: HashMap<String, StringId>,

    next_id: u64,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            strings: HashMap::new(),
            ids: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn get(&self, id: StringId) -> &str {
        if id.raw() == 0 {
            return "";
        }
        &self.strings[&id]
    }

    pub fn put<'a, S: Into<Cow<'a, str>>>(&mut self, s: S) -> StringId {
        let s = s.into();
        if s.is_empty() {
            return StringId::new(0);
        }

        if let Some(id) = self.ids.get(s.as_ref()) {
            return *id;
        }

        let s_owned = s.into_owned();

        let id = StringId::new(self.next_id as usize);
        self.next_id += 1;

        self.strings.insert(id, s_owned.clone());
        self.ids.insert(s_owned, id);

        id
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}
