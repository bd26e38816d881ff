use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::dictionary::Dict;
use crate::filters::FilterCodec;
use crate::handle::bound;
use crate::object::{ObjKey, ObjectId, StringFormat, Value};
use crate::store::Store;
use crate::stream::StreamLoader;
use crate::{Array, Dictionary, Error, PdfObject, Result, Stream};

const STORE_BORROWED: &str = "document store is already borrowed";

/// A PDF document's object graph.
///
/// The document owns the object store; every [`PdfObject`] handed out refers back
/// to it. Handles must be dropped before the document.
pub struct Document {
    store: Rc<RefCell<Store>>,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Document {
    pub fn new() -> Document {
        Document::with_store(Store::new())
    }

    /// Create a document that decodes stream filters with `codec`.
    pub fn with_codec(codec: Box<dyn FilterCodec>) -> Document {
        Document::with_store(Store::with_codec(codec))
    }

    fn with_store(store: Store) -> Document {
        Document {
            store: Rc::new(RefCell::new(store)),
        }
    }

    /// Direct access to the store, for parsers and writers.
    ///
    /// Handle operations report [`Error::UsageViolation`] while the returned
    /// borrow is alive.
    ///
    /// # Panics
    ///
    /// Panics if the store is mutably borrowed; [`Document::try_store`]
    /// reports that instead.
    pub fn store(&self) -> Ref<'_, Store> {
        self.store.borrow()
    }

    /// Exclusive access to the store.
    ///
    /// Every handle operation, reads included, reports
    /// [`Error::UsageViolation`] while the returned borrow is alive.
    ///
    /// # Panics
    ///
    /// Panics if the store is borrowed at all; [`Document::try_store_mut`]
    /// reports that instead.
    pub fn store_mut(&self) -> RefMut<'_, Store> {
        self.store.borrow_mut()
    }

    pub fn try_store(&self) -> Result<Ref<'_, Store>> {
        self.store.try_borrow().map_err(|_| Error::UsageViolation(STORE_BORROWED))
    }

    pub fn try_store_mut(&self) -> Result<RefMut<'_, Store>> {
        self.store.try_borrow_mut().map_err(|_| Error::UsageViolation(STORE_BORROWED))
    }

    fn create(&self, f: impl FnOnce(&mut Store) -> Result<ObjKey>) -> Result<PdfObject> {
        let key = f(&mut *self.try_store_mut()?)?;
        Ok(bound(&self.store, key))
    }

    /// Wraps `value` as a direct object of this document.
    pub fn new_object<'a>(&self, value: impl Into<Value<'a>>) -> Result<PdfObject> {
        let value = value.into();
        let owner = Rc::downgrade(&self.store);
        self.create(|store| crate::handle::materialize(store, &owner, value))
    }

    pub fn new_array(&self) -> Result<Array> {
        self.create(|store| Ok(store.new_array()))
            .map(Array::new_unchecked)
    }

    pub fn new_dictionary(&self) -> Result<Dictionary> {
        self.create(|store| Ok(store.new_dictionary()))
            .map(Dictionary::new_unchecked)
    }

    /// A stream with an empty dictionary apart from `/Length`.
    pub fn new_stream(&self, content: impl Into<Vec<u8>>) -> Result<Stream> {
        let content = content.into();
        self.create(|store| Ok(store.new_stream(Dict::new(), content)))
            .map(Stream::new_unchecked)
    }

    /// A stream whose payload is read by `loader` on first access.
    pub fn new_deferred_stream(&self, loader: impl FnMut() -> Result<Vec<u8>> + 'static) -> Result<Stream> {
        let loader: StreamLoader = Box::new(loader);
        self.create(|store| Ok(store.new_deferred_stream(Dict::new(), loader)))
            .map(Stream::new_unchecked)
    }

    /// A literal string holding `bytes` untouched.
    pub fn new_string(&self, bytes: impl Into<Vec<u8>>) -> Result<PdfObject> {
        let bytes = bytes.into();
        self.create(|store| Ok(store.new_string(bytes, StringFormat::Literal)))
    }

    pub fn new_text(&self, text: &str) -> Result<PdfObject> {
        self.create(|store| Ok(store.new_text_string(text)))
    }

    pub fn new_name(&self, name: impl AsRef<[u8]>) -> Result<PdfObject> {
        self.create(|store| Ok(store.new_name(name.as_ref())))
    }

    pub fn new_reference(&self, id: ObjectId) -> Result<PdfObject> {
        self.create(|store| Ok(store.new_reference(id)))
    }

    /// Stores `object` under the next free object number, generation 0.
    pub fn add_object(&self, object: &PdfObject) -> Result<ObjectId> {
        let mut store = self.try_store_mut()?;
        let id = store.next_object_id();
        self.put(&mut store, id, object)?;
        Ok(id)
    }

    /// Stores `object` under `id`, replacing whatever was there.
    pub fn set_object(&self, id: ObjectId, object: &PdfObject) -> Result<()> {
        let mut store = self.try_store_mut()?;
        self.put(&mut store, id, object)
    }

    fn put(&self, store: &mut Store, id: ObjectId, object: &PdfObject) -> Result<()> {
        if !object.is_predefined() && !Weak::ptr_eq(object.owner(), &Rc::downgrade(&self.store)) {
            return Err(Error::UsageViolation("object belongs to a different document"));
        }
        store.retain(object.key())?;
        store.update(id, object.key())
    }

    /// The object stored under `number` and its generation.
    pub fn lookup(&self, number: u32) -> Result<Option<(u16, PdfObject)>> {
        let mut store = self.try_store_mut()?;
        let Some((generation, key)) = store.lookup(number) else {
            return Ok(None);
        };
        store.retain(key)?;
        Ok(Some((generation, bound(&self.store, key))))
    }

    /// The object stored under `id`, following references.
    pub fn get_object(&self, id: ObjectId) -> Result<PdfObject> {
        self.new_reference(id)?.try_resolve()
    }

    /// Frees `number`; returns whether an object was stored there.
    pub fn remove_object(&self, number: u32) -> Result<bool> {
        Ok(self.try_store_mut()?.free_object(number))
    }

    pub fn max_id(&self) -> Result<u32> {
        Ok(self.try_store()?.xref().max_id())
    }

    /// Ids of the table objects that changed, directly or in something they own.
    pub fn dirty_objects(&self) -> Result<Vec<ObjectId>> {
        let store = self.try_store()?;
        Ok(store
            .xref()
            .in_use()
            .filter(|(_, object)| store.is_dirty_deep(*object))
            .map(|(id, _)| id)
            .collect())
    }

    /// Marks every table object clean, e.g. after an incremental save.
    pub fn clear_dirty_all(&self) -> Result<()> {
        let mut store = self.try_store_mut()?;
        let objects: Vec<ObjKey> = store.xref().in_use().map(|(_, object)| object).collect();
        for object in objects {
            store.clear_dirty_deep(object);
        }
        Ok(())
    }

    /// Number of live objects, interned ones excluded.
    pub fn live_objects(&self) -> Result<usize> {
        Ok(self.try_store()?.len())
    }
}
