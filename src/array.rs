use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Weak;

use log::warn;

use crate::handle::{PdfObject, materialize, with_store_mut};
use crate::object::{ObjFlags, ObjKey, Value};
use crate::store::{Body, ITERATING, IterationLock, Store};
use crate::{Error, Result};

impl Store {
    fn array(&self, key: ObjKey) -> Result<&Vec<ObjKey>> {
        match self.body(key) {
            Some(Body::Array(items)) => Ok(items),
            _ => Err(Error::object_type("Array", self.kind_of(key))),
        }
    }

    /// Mutable element access for a mutator; marks the array dirty.
    fn array_for_update(&mut self, key: ObjKey) -> Result<&mut Vec<ObjKey>> {
        let kind = self.kind_of(key);
        match self.node_mut(key) {
            Some(node) if node.is_iterated() => Err(Error::UsageViolation(ITERATING)),
            Some(node) => match &mut node.body {
                Body::Array(items) => {
                    node.flags.insert(ObjFlags::DIRTY);
                    Ok(items)
                }
                _ => Err(Error::object_type("Array", kind)),
            },
            None => Err(Error::object_type("Array", kind)),
        }
    }

    pub fn array_len(&self, key: ObjKey) -> Result<usize> {
        self.array(key).map(Vec::len)
    }

    pub fn array_get(&self, key: ObjKey, index: usize) -> Result<ObjKey> {
        let items = self.array(key)?;
        items
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange { index, len: items.len() })
    }

    /// Appends `value`, taking over one reference to it.
    pub fn array_push(&mut self, key: ObjKey, value: ObjKey) -> Result<()> {
        self.consuming(value, |store| {
            store.array(key)?;
            store.check_child(key, value)?;
            store.array_for_update(key)?.push(value);
            Ok(())
        })
    }

    /// Replaces the element at `index`, taking over one reference to `value`.
    pub fn array_put(&mut self, key: ObjKey, index: usize, value: ObjKey) -> Result<()> {
        self.consuming(value, |store| {
            let len = store.array_len(key)?;
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
            store.check_child(key, value)?;
            let previous = std::mem::replace(&mut store.array_for_update(key)?[index], value);
            let _ = store.release(previous);
            Ok(())
        })
    }

    /// Inserts `value` before `index`; `index == len` appends.
    pub fn array_insert(&mut self, key: ObjKey, index: usize, value: ObjKey) -> Result<()> {
        self.consuming(value, |store| {
            let len = store.array_len(key)?;
            if index > len {
                return Err(Error::IndexOutOfRange { index, len });
            }
            store.check_child(key, value)?;
            store.array_for_update(key)?.insert(index, value);
            Ok(())
        })
    }

    /// Removes the element at `index`, shifting the rest down.
    pub fn array_delete(&mut self, key: ObjKey, index: usize) -> Result<()> {
        let len = self.array_len(key)?;
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        let removed = self.array_for_update(key)?.remove(index);
        let _ = self.release(removed);
        Ok(())
    }

    /// Position of the first element structurally equal to `value`.
    pub fn array_find(&self, key: ObjKey, value: ObjKey) -> Result<Option<usize>> {
        Ok(self
            .array(key)?
            .iter()
            .position(|item| self.compare(*item, value)))
    }
}

/// Array view of an array object.
#[derive(Clone, PartialEq)]
pub struct Array {
    obj: PdfObject,
}

impl Array {
    pub(crate) fn new_unchecked(obj: PdfObject) -> Array {
        Array { obj }
    }

    pub fn object(&self) -> &PdfObject {
        &self.obj
    }

    pub fn into_object(self) -> PdfObject {
        self.obj
    }

    pub fn len(&self) -> Result<usize> {
        self.obj.read(|store| store.array_len(self.obj.key()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// Element at `index`, unresolved.
    pub fn get(&self, index: usize) -> Result<PdfObject> {
        self.obj.fetch(|store| store.array_get(self.obj.key(), index))
    }

    pub fn push<'a>(&self, value: impl Into<Value<'a>>) -> Result<()> {
        let value = value.into();
        self.obj.write(|store, owner| {
            let child = materialize(store, owner, value)?;
            store.array_push(self.obj.key(), child)
        })
    }

    pub fn set<'a>(&self, index: usize, value: impl Into<Value<'a>>) -> Result<()> {
        let value = value.into();
        self.obj.write(|store, owner| {
            let child = materialize(store, owner, value)?;
            store.array_put(self.obj.key(), index, child)
        })
    }

    pub fn insert<'a>(&self, index: usize, value: impl Into<Value<'a>>) -> Result<()> {
        let value = value.into();
        self.obj.write(|store, owner| {
            let child = materialize(store, owner, value)?;
            store.array_insert(self.obj.key(), index, child)
        })
    }

    pub fn remove(&self, index: usize) -> Result<()> {
        self.obj.write(|store, _| store.array_delete(self.obj.key(), index))
    }

    /// Whether an element structurally equal to `value` is present.
    pub fn contains(&self, value: &PdfObject) -> Result<bool> {
        self.index_of(value).map(|index| index.is_some())
    }

    pub fn index_of(&self, value: &PdfObject) -> Result<Option<usize>> {
        if !value.is_predefined() && !self.obj.same_document(value) {
            return Ok(None);
        }
        self.obj
            .read(|store| store.array_find(self.obj.key(), value.key()))
    }

    pub fn deep_clone(&self) -> Result<Array> {
        self.obj.deep_clone().map(Array::new_unchecked)
    }

    /// Iterates over the elements.
    ///
    /// The array must not be modified while the iterator is alive; mutators
    /// fail with [`Error::UsageViolation`] until it is dropped. The iterator
    /// does not keep the array alive.
    pub fn iter(&self) -> Result<ArrayIter> {
        let len = self.len()?;
        let lock = self.obj.write(|store, _| store.lock_iteration(self.obj.key()))?;
        Ok(ArrayIter {
            store: self.obj.owner().clone(),
            key: self.obj.key(),
            index: 0,
            len,
            _lock: lock,
        })
    }

    /// Collects the elements into a vector of handles.
    pub fn to_vec(&self) -> Result<Vec<PdfObject>> {
        (0..self.len()?).map(|index| self.get(index)).collect()
    }
}

impl Deref for Array {
    type Target = PdfObject;

    fn deref(&self) -> &PdfObject {
        &self.obj
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.obj, f)
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.obj, f)
    }
}

pub struct ArrayIter {
    store: Weak<RefCell<Store>>,
    key: ObjKey,
    index: usize,
    len: usize,
    _lock: IterationLock,
}

impl Iterator for ArrayIter {
    type Item = PdfObject;

    fn next(&mut self) -> Option<PdfObject> {
        if self.index >= self.len {
            return None;
        }
        let index = self.index;
        self.index += 1;
        let key = self.key;
        let item = with_store_mut(&self.store, |store, owner| {
            let item = store.array_get(key, index)?;
            PdfObject::wrap(store, owner, item)
        });
        match item {
            Ok(item) => Some(item),
            Err(err) => {
                warn!("array iteration stopped: {}", err);
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::StringFormat;

    #[test]
    fn insert_and_delete_shift_elements() {
        let mut store = Store::new();
        let array = store.new_array();
        for value in [1, 3] {
            let item = store.new_integer(value);
            store.array_push(array, item).unwrap();
        }
        let two = store.new_integer(2);
        store.array_insert(array, 1, two).unwrap();
        let values: Vec<i64> = (0..3)
            .map(|index| store.as_i64(store.array_get(array, index).unwrap()).unwrap())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);

        store.array_delete(array, 0).unwrap();
        assert_eq!(store.array_len(array).unwrap(), 2);
        assert_eq!(store.len(), 3);
        assert!(matches!(
            store.array_delete(array, 5),
            Err(Error::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn failed_push_releases_the_value() {
        let mut store = Store::new();
        let not_an_array = store.new_integer(0);
        let value = store.new_string(b"x".to_vec(), StringFormat::Literal);
        assert!(store.array_push(not_an_array, value).is_err());
        assert!(!store.contains(value));
    }

    #[test]
    fn self_insertion_is_rejected() {
        let mut store = Store::new();
        let outer = store.new_array();
        let inner = store.new_array();
        store.retain(inner).unwrap();
        store.array_push(outer, inner).unwrap();
        store.retain(outer).unwrap();
        assert!(matches!(store.array_push(inner, outer), Err(Error::UsageViolation(_))));
        store.retain(outer).unwrap();
        assert!(store.array_push(outer, outer).is_err());
        assert_eq!(store.ref_count(outer), Some(1));
    }

    #[test]
    fn put_replaces_and_releases() {
        let mut store = Store::new();
        let array = store.new_array();
        let old = store.new_integer(1);
        store.array_push(array, old).unwrap();
        let new = store.new_real(2.5);
        store.array_put(array, 0, new).unwrap();
        assert!(!store.contains(old));
        assert_eq!(store.array_find(array, new).unwrap(), Some(0));
        assert!(store.is_dirty(array));
    }
}
