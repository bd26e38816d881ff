use std::collections::BTreeMap;

use log::warn;

use crate::object::{ObjKey, ObjectId};
use crate::store::Store;
use crate::Result;

/// Object-number table of a document: which object currently occupies each
/// indirect object number.
#[derive(Debug, Default)]
pub struct Xref {
    pub(crate) entries: BTreeMap<u32, XrefEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    Free { generation: u16 },
    InUse { generation: u16, object: ObjKey },
}

impl XrefEntry {
    pub fn generation(&self) -> u16 {
        match *self {
            XrefEntry::Free { generation } | XrefEntry::InUse { generation, .. } => generation,
        }
    }
}

impl Xref {
    pub fn new() -> Xref {
        Xref { entries: BTreeMap::new() }
    }

    pub fn get(&self, number: u32) -> Option<&XrefEntry> {
        self.entries.get(&number)
    }

    pub fn insert(&mut self, number: u32, entry: XrefEntry) -> Option<XrefEntry> {
        self.entries.insert(number, entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest object number in the table.
    pub fn max_id(&self) -> u32 {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    /// Objects currently in use, in object-number order.
    pub fn in_use(&self) -> impl Iterator<Item = (ObjectId, ObjKey)> + '_ {
        self.entries.iter().filter_map(|(&number, entry)| match *entry {
            XrefEntry::InUse { generation, object } => Some(((number, generation), object)),
            XrefEntry::Free { .. } => None,
        })
    }
}

impl Store {
    pub fn xref(&self) -> &Xref {
        &self.xref
    }

    /// Object currently stored under `number`, with its generation.
    pub fn lookup(&self, number: u32) -> Option<(u16, ObjKey)> {
        match self.xref.get(number)? {
            XrefEntry::InUse { generation, object } => Some((*generation, *object)),
            XrefEntry::Free { .. } => None,
        }
    }

    /// Object stored under `id`; a generation mismatch counts as missing.
    pub(crate) fn lookup_id(&self, id: ObjectId) -> Option<ObjKey> {
        let (generation, object) = self.lookup(id.0)?;
        if generation != id.1 {
            warn!(
                "reference {} {} R points at generation {} of object {}",
                id.0, id.1, generation, id.0
            );
            return None;
        }
        Some(object)
    }

    /// Store `object` under `id`, taking over one reference to it and marking it
    /// dirty. The object previously in that slot, if any, is released.
    pub fn update(&mut self, id: ObjectId, object: ObjKey) -> Result<()> {
        self.consuming(object, |store| {
            if !store.contains(object) {
                return Err(crate::Error::UsageViolation("object was already freed"));
            }
            let previous = store.xref.insert(
                id.0,
                XrefEntry::InUse {
                    generation: id.1,
                    object,
                },
            );
            if let Some(XrefEntry::InUse { object: previous, .. }) = previous {
                let _ = store.release(previous);
            }
            store.mark_dirty(object);
            Ok(())
        })
    }

    /// Free the object number, bumping its generation for the next user.
    /// Returns whether an object was stored under it.
    pub fn free_object(&mut self, number: u32) -> bool {
        match self.xref.get(number).copied() {
            Some(XrefEntry::InUse { generation, object }) => {
                self.xref.insert(
                    number,
                    XrefEntry::Free {
                        generation: generation.saturating_add(1),
                    },
                );
                let _ = self.release(object);
                true
            }
            _ => false,
        }
    }

    /// The identifier a newly added object gets.
    pub fn next_object_id(&self) -> ObjectId {
        (self.xref.max_id() + 1, 0)
    }
}
