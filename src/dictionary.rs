use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Weak;

use indexmap::IndexMap;
use log::warn;

use crate::handle::{PdfObject, with_store_mut};
use crate::names::PdfName;
use crate::object::{AsName, Kind, ObjFlags, ObjKey, Value};
use crate::resolve::MAX_REFERENCE_CHAIN;
use crate::store::{Body, ITERATING, IterationLock, Store};
use crate::{Error, Result};

/// Key to value table of a dictionary or stream node, in storage order.
pub type Dict = IndexMap<Vec<u8>, ObjKey>;

impl Store {
    /// The dictionary of a dictionary or stream object.
    pub(crate) fn dict(&self, key: ObjKey) -> Result<&Dict> {
        match self.body(key) {
            Some(Body::Dictionary(dict)) => Ok(dict),
            Some(Body::Stream(stream)) => Ok(&stream.dict),
            _ => Err(Error::object_type("Dictionary", self.kind_of(key))),
        }
    }

    /// Mutable dictionary access for a mutator; marks the object dirty.
    fn dict_for_update(&mut self, key: ObjKey) -> Result<&mut Dict> {
        let kind = self.kind_of(key);
        let node = self
            .node_mut(key)
            .ok_or(Error::object_type("Dictionary", kind))?;
        if node.is_iterated() {
            return Err(Error::UsageViolation(ITERATING));
        }
        let dict = match &mut node.body {
            Body::Dictionary(dict) => dict,
            Body::Stream(stream) => &mut stream.dict,
            _ => return Err(Error::object_type("Dictionary", kind)),
        };
        node.flags.insert(ObjFlags::DIRTY);
        Ok(dict)
    }

    pub fn dict_len(&self, key: ObjKey) -> Result<usize> {
        self.dict(key).map(IndexMap::len)
    }

    pub fn dict_get(&self, key: ObjKey, name: &[u8]) -> Result<Option<ObjKey>> {
        Ok(self.dict(key)?.get(name).copied())
    }

    /// Looks up `name`, falling back to its abbreviation.
    pub fn dict_get_abbrev(&self, key: ObjKey, name: &[u8], abbrev: &[u8]) -> Result<Option<ObjKey>> {
        let dict = self.dict(key)?;
        Ok(dict.get(name).or_else(|| dict.get(abbrev)).copied())
    }

    /// Looks up `name` here, then along the chain of `/Parent` dictionaries.
    pub fn dict_get_inheritable(&self, key: ObjKey, name: &[u8]) -> Result<Option<ObjKey>> {
        let mut dict = self.dict(key)?;
        for _ in 0..MAX_REFERENCE_CHAIN {
            if let Some(value) = dict.get(name) {
                return Ok(Some(*value));
            }
            let Some(parent) = dict.get(PdfName::Parent.as_bytes()) else {
                return Ok(None);
            };
            match self.dict(self.resolve(*parent)) {
                Ok(parent) => dict = parent,
                Err(_) => return Ok(None),
            }
        }
        warn!("/Parent chain too long looking up /{}", String::from_utf8_lossy(name));
        Ok(None)
    }

    /// Walks `path` through nested dictionaries, resolving references between
    /// the steps. The final value is returned unresolved.
    pub fn dict_locate(&self, key: ObjKey, path: &[&[u8]]) -> Result<Option<ObjKey>> {
        let mut current = key;
        for (index, name) in path.iter().enumerate() {
            let dict = if index == 0 {
                self.dict(current)?
            } else {
                match self.dict(self.resolve(current)) {
                    Ok(dict) => dict,
                    Err(_) => return Ok(None),
                }
            };
            match dict.get(*name) {
                Some(value) => current = *value,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    pub fn dict_key_at(&self, key: ObjKey, index: usize) -> Result<&[u8]> {
        let dict = self.dict(key)?;
        dict.get_index(index)
            .map(|(name, _)| name.as_slice())
            .ok_or(Error::IndexOutOfRange { index, len: dict.len() })
    }

    pub fn dict_value_at(&self, key: ObjKey, index: usize) -> Result<ObjKey> {
        let dict = self.dict(key)?;
        dict.get_index(index)
            .map(|(_, value)| *value)
            .ok_or(Error::IndexOutOfRange { index, len: dict.len() })
    }

    /// Sets `name` to `value`, taking over one reference to `value`. An existing
    /// entry keeps its position.
    pub fn dict_put(&mut self, key: ObjKey, name: &[u8], value: ObjKey) -> Result<()> {
        self.consuming(value, |store| {
            store.dict(key)?;
            store.check_child(key, value)?;
            let dict = store.dict_for_update(key)?;
            let previous = dict.insert(name.to_vec(), value);
            if previous.is_none() {
                if let Some(node) = store.node_mut(key) {
                    node.flags.remove(ObjFlags::SORTED);
                }
            }
            if let Some(previous) = previous {
                let _ = store.release(previous);
            }
            Ok(())
        })
    }

    /// Removes `name`; returns whether it was present.
    pub fn dict_del(&mut self, key: ObjKey, name: &[u8]) -> Result<bool> {
        if !self.dict(key)?.contains_key(name) {
            return Ok(false);
        }
        let removed = self.dict_for_update(key)?.shift_remove(name);
        if let Some(removed) = removed {
            let _ = self.release(removed);
        }
        Ok(true)
    }

    /// Reorders the keys into canonical (byte-wise) order.
    pub fn dict_sort(&mut self, key: ObjKey) -> Result<()> {
        self.dict_for_update(key)?.sort_keys();
        if let Some(node) = self.node_mut(key) {
            node.flags.insert(ObjFlags::SORTED);
        }
        Ok(())
    }
}

/// Dictionary view of a dictionary or stream object.
#[derive(Clone, PartialEq)]
pub struct Dictionary {
    obj: PdfObject,
}

impl Dictionary {
    pub(crate) fn new_unchecked(obj: PdfObject) -> Dictionary {
        Dictionary { obj }
    }

    pub fn object(&self) -> &PdfObject {
        &self.obj
    }

    pub fn into_object(self) -> PdfObject {
        self.obj
    }

    /// Number of entries.
    pub fn len(&self) -> Result<usize> {
        self.obj.read(|store| store.dict_len(self.obj.key()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    pub fn has(&self, key: impl AsName) -> Result<bool> {
        self.obj
            .read(|store| Ok(store.dict_get(self.obj.key(), key.as_name_bytes())?.is_some()))
    }

    /// The stored value, unresolved.
    pub fn get(&self, key: impl AsName) -> Result<Option<PdfObject>> {
        self.obj.lookup(|store| store.dict_get(self.obj.key(), key.as_name_bytes()))
    }

    /// The value of `key`, or of `abbrev` when `key` is absent (e.g. `/Length` and `/L`).
    pub fn get_abbrev(&self, key: impl AsName, abbrev: impl AsName) -> Result<Option<PdfObject>> {
        self.obj.lookup(|store| {
            store.dict_get_abbrev(self.obj.key(), key.as_name_bytes(), abbrev.as_name_bytes())
        })
    }

    /// The value of `key`, inherited through `/Parent` links when absent here.
    pub fn get_inheritable(&self, key: impl AsName) -> Result<Option<PdfObject>> {
        self.obj
            .lookup(|store| store.dict_get_inheritable(self.obj.key(), key.as_name_bytes()))
    }

    /// The value of `key` with references resolved.
    pub fn get_deref(&self, key: impl AsName) -> Result<Option<PdfObject>> {
        self.obj.lookup(|store| {
            Ok(store
                .dict_get(self.obj.key(), key.as_name_bytes())?
                .map(|value| store.resolve(value)))
        })
    }

    /// Follows a path of keys through nested dictionaries.
    pub fn locate<K: AsName>(&self, path: &[K]) -> Result<Option<PdfObject>> {
        let path: Vec<&[u8]> = path.iter().map(AsName::as_name_bytes).collect();
        self.obj.lookup(|store| store.dict_locate(self.obj.key(), &path))
    }

    pub fn key_at(&self, index: usize) -> Result<Vec<u8>> {
        self.obj
            .read(|store| store.dict_key_at(self.obj.key(), index).map(<[u8]>::to_vec))
    }

    pub fn value_at(&self, index: usize) -> Result<PdfObject> {
        self.obj.fetch(|store| store.dict_value_at(self.obj.key(), index))
    }

    /// Inserts or replaces `key`.
    pub fn set<'a>(&self, key: impl AsName, value: impl Into<Value<'a>>) -> Result<()> {
        let value = value.into();
        self.obj.write(|store, owner| {
            let child = crate::handle::materialize(store, owner, value)?;
            store.dict_put(self.obj.key(), key.as_name_bytes(), child)
        })
    }

    /// Removes `key`; returns whether it was present.
    pub fn remove(&self, key: impl AsName) -> Result<bool> {
        self.obj
            .write(|store, _| store.dict_del(self.obj.key(), key.as_name_bytes()))
    }

    /// Sorts the keys into canonical order; iteration follows the new order.
    pub fn sort(&self) -> Result<()> {
        self.obj.write(|store, _| store.dict_sort(self.obj.key()))
    }

    pub fn is_sorted(&self) -> bool {
        self.obj
            .read(|store| Ok(store.flags(self.obj.key()).contains(ObjFlags::SORTED)))
            .unwrap_or(false)
    }

    /// Value of `/Type`, when it is a name.
    pub fn type_name(&self) -> Result<Option<String>> {
        match self.get_deref(PdfName::Type)? {
            Some(name) if name.is_name() => name.as_name_str().map(Some),
            _ => Ok(None),
        }
    }

    pub fn type_is(&self, type_name: impl AsName) -> bool {
        self.get_deref(PdfName::Type)
            .ok()
            .flatten()
            .and_then(|name| name.as_name().ok())
            .is_some_and(|name| name == type_name.as_name_bytes())
    }

    pub fn keys(&self) -> Result<Vec<Vec<u8>>> {
        self.obj
            .read(|store| Ok(store.dict(self.obj.key())?.keys().cloned().collect()))
    }

    /// Fully independent copy; references inside stay references.
    pub fn deep_clone(&self) -> Result<Dictionary> {
        self.obj.deep_clone().map(Dictionary::new_unchecked)
    }

    /// Iterates over the entries in storage order.
    ///
    /// The dictionary must not be modified while the iterator is alive; mutators
    /// fail with [`Error::UsageViolation`] until it is dropped.
    pub fn iter(&self) -> Result<DictIter> {
        let len = self.len()?;
        let lock = self.obj.write(|store, _| store.lock_iteration(self.obj.key()))?;
        Ok(DictIter {
            store: self.obj.owner().clone(),
            key: self.obj.key(),
            index: 0,
            len,
            _lock: lock,
        })
    }
}

impl Deref for Dictionary {
    type Target = PdfObject;

    fn deref(&self) -> &PdfObject {
        &self.obj
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.obj, f)
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.obj, f)
    }
}

/// Iterator over the entries of a dictionary, see [`Dictionary::iter`].
pub struct DictIter {
    store: Weak<RefCell<Store>>,
    key: ObjKey,
    index: usize,
    len: usize,
    _lock: IterationLock,
}

impl Iterator for DictIter {
    type Item = (Vec<u8>, PdfObject);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let index = self.index;
        self.index += 1;
        let key = self.key;
        let entry = with_store_mut(&self.store, |store, owner| {
            let name = store.dict_key_at(key, index)?.to_vec();
            let value = store.dict_value_at(key, index)?;
            Ok((name, PdfObject::wrap(store, owner, value)?))
        });
        match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("dictionary iteration stopped: {}", err);
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl Kind {
    pub(crate) fn check_dictionary(self) -> Result<()> {
        if self.is_dictionary() {
            Ok(())
        } else {
            Err(Error::object_type("Dictionary", self))
        }
    }
}
