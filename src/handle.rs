use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::warn;

use crate::names::PdfName;
use crate::object::{Kind, ObjKey, ObjectId, StringFormat, Value};
use crate::store::Store;
use crate::{Array, Dictionary, Error, Result, Stream};

const BORROWED: &str = "document store is already borrowed";
const FOREIGN: &str = "object belongs to a different document";

/// Owning handle to an object of a [`Document`](crate::Document).
///
/// A handle holds one reference to its object and gives it back when dropped.
/// Cloning a handle adds a reference. Handles to null, booleans and predefined
/// names need no document and can be created directly.
///
/// Handles must not outlive their document: releasing one afterwards trips a
/// debug assertion.
pub struct PdfObject {
    key: ObjKey,
    store: Weak<RefCell<Store>>,
}

impl PdfObject {
    pub fn null() -> PdfObject {
        PdfObject::unbound(ObjKey::Null)
    }

    pub fn boolean(value: bool) -> PdfObject {
        PdfObject::unbound(ObjKey::boolean(value))
    }

    pub fn name(name: PdfName) -> PdfObject {
        PdfObject::unbound(ObjKey::Name(name))
    }

    fn unbound(key: ObjKey) -> PdfObject {
        PdfObject { key, store: Weak::new() }
    }

    /// Wraps `key`, adding a reference to it.
    pub(crate) fn wrap(store: &mut Store, owner: &Weak<RefCell<Store>>, key: ObjKey) -> Result<PdfObject> {
        store.retain(key)?;
        Ok(PdfObject::adopt(owner, key))
    }

    /// Wraps `key`, taking over a reference the caller already holds.
    pub(crate) fn adopt(owner: &Weak<RefCell<Store>>, key: ObjKey) -> PdfObject {
        PdfObject {
            key,
            store: owner.clone(),
        }
    }

    pub fn key(&self) -> ObjKey {
        self.key
    }

    pub(crate) fn owner(&self) -> &Weak<RefCell<Store>> {
        &self.store
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&Store) -> Result<T>) -> Result<T> {
        match self.store.upgrade() {
            Some(store) => {
                let store = store.try_borrow().map_err(|_| Error::UsageViolation(BORROWED))?;
                f(&store)
            }
            // Interned objects need no document; an empty store answers for them.
            None if self.key.is_predefined() => f(&Store::new()),
            None => Err(Error::DocumentDropped),
        }
    }

    pub(crate) fn write<T>(&self, f: impl FnOnce(&mut Store, &Weak<RefCell<Store>>) -> Result<T>) -> Result<T> {
        with_store_mut(&self.store, f)
    }

    /// Runs a store lookup and wraps the key it finds in a new handle.
    pub(crate) fn fetch(&self, f: impl FnOnce(&Store) -> Result<ObjKey>) -> Result<PdfObject> {
        self.write(|store, owner| {
            let key = f(store)?;
            PdfObject::wrap(store, owner, key)
        })
    }

    pub(crate) fn lookup(&self, f: impl FnOnce(&Store) -> Result<Option<ObjKey>>) -> Result<Option<PdfObject>> {
        self.write(|store, owner| match f(store)? {
            Some(key) => PdfObject::wrap(store, owner, key).map(Some),
            None => Ok(None),
        })
    }

    /// A second handle to the same object. Unlike [`Clone`] this reports a
    /// borrowed store as [`Error::UsageViolation`] instead of panicking.
    pub fn try_clone(&self) -> Result<PdfObject> {
        if self.key.is_predefined() {
            return Ok(PdfObject::adopt(&self.store, self.key));
        }
        self.write(|store, owner| PdfObject::wrap(store, owner, self.key))
    }

    pub fn kind(&self) -> Kind {
        if let Some(kind) = self.key.interned_kind() {
            return kind;
        }
        self.read(|store| Ok(store.kind_of(self.key)))
            .unwrap_or(Kind::Unknown)
    }

    pub fn is_null(&self) -> bool {
        self.key == ObjKey::Null
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.key, ObjKey::True | ObjKey::False)
    }

    pub fn is_name(&self) -> bool {
        self.kind() == Kind::Name
    }

    pub fn is_integer(&self) -> bool {
        self.kind() == Kind::Integer
    }

    pub fn is_float(&self) -> bool {
        self.kind() == Kind::Float
    }

    pub fn is_number(&self) -> bool {
        self.kind().is_number()
    }

    pub fn is_string(&self) -> bool {
        self.kind() == Kind::String
    }

    pub fn is_array(&self) -> bool {
        self.kind() == Kind::Array
    }

    /// Streams count as dictionaries.
    pub fn is_dictionary(&self) -> bool {
        self.kind().is_dictionary()
    }

    pub fn is_stream(&self) -> bool {
        self.kind() == Kind::Stream
    }

    /// Whether this is an indirect reference. Does not resolve.
    pub fn is_indirect(&self) -> bool {
        self.kind() == Kind::Reference
    }

    /// Whether this is one of the interned objects (null, booleans, predefined names).
    pub fn is_predefined(&self) -> bool {
        self.key.is_predefined()
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.read(|store| store.as_bool(self.key))
    }

    /// Integer value; a real is truncated toward zero.
    pub fn as_i64(&self) -> Result<i64> {
        self.read(|store| store.as_i64(self.key))
    }

    /// Like [`PdfObject::as_i64`], saturated to the `i32` range.
    pub fn as_i32(&self) -> Result<i32> {
        self.as_i64()
            .map(|value| value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }

    pub fn as_f64(&self) -> Result<f64> {
        self.read(|store| store.as_f64(self.key))
    }

    pub fn as_name(&self) -> Result<Vec<u8>> {
        self.read(|store| store.name_bytes(self.key).map(<[u8]>::to_vec))
    }

    pub fn as_name_str(&self) -> Result<String> {
        self.read(|store| Ok(std::str::from_utf8(store.name_bytes(self.key)?)?.to_owned()))
    }

    /// Decoded text of a string object.
    pub fn as_text(&self) -> Result<String> {
        self.read(|store| store.text(self.key).map(str::to_owned))
    }

    /// Raw bytes of a string object.
    pub fn as_string_bytes(&self) -> Result<Vec<u8>> {
        self.read(|store| store.string_bytes(self.key).map(<[u8]>::to_vec))
    }

    pub fn string_format(&self) -> Result<StringFormat> {
        self.read(|store| store.string_format(self.key))
    }

    pub fn as_reference(&self) -> Result<ObjectId> {
        self.read(|store| store.reference(self.key))
    }

    pub fn set_i64(&self, value: i64) -> Result<()> {
        self.write(|store, _| store.set_integer(self.key, value))
    }

    pub fn set_f64(&self, value: f64) -> Result<()> {
        self.write(|store, _| store.set_real(self.key, value))
    }

    /// The object this reference leads to; dangling references give null, as
    /// does a borrowed store.
    /// Anything that is not a reference resolves to itself.
    pub fn resolve(&self) -> PdfObject {
        let resolved = if self.is_indirect() {
            self.fetch(|store| Ok(store.resolve(self.key)))
        } else {
            self.try_clone()
        };
        match resolved {
            Ok(target) => target,
            Err(err) => {
                warn!("{}; using null instead", err);
                PdfObject::null()
            }
        }
    }

    /// Like [`PdfObject::resolve`], but reports a dangling reference.
    pub fn try_resolve(&self) -> Result<PdfObject> {
        if !self.is_indirect() {
            return self.try_clone();
        }
        self.fetch(|store| store.try_resolve(self.key))
    }

    pub fn as_array(&self) -> Result<Array> {
        match self.kind() {
            Kind::Array => self.try_clone().map(Array::new_unchecked),
            kind => Err(Error::object_type("Array", kind)),
        }
    }

    /// Dictionary view; works for streams too.
    pub fn as_dict(&self) -> Result<Dictionary> {
        let kind = self.kind();
        kind.check_dictionary()?;
        self.try_clone().map(Dictionary::new_unchecked)
    }

    pub fn as_stream(&self) -> Result<Stream> {
        match self.kind() {
            Kind::Stream => self.try_clone().map(Stream::new_unchecked),
            kind => Err(Error::object_type("Stream", kind)),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.read(|store| Ok(store.is_dirty(self.key))).unwrap_or(false)
    }

    pub fn set_dirty(&self, dirty: bool) -> Result<()> {
        if self.key.is_predefined() {
            return Ok(());
        }
        self.write(|store, _| {
            if dirty {
                store.mark_dirty(self.key);
            } else {
                store.clear_dirty(self.key);
            }
            Ok(())
        })
    }

    pub fn mark_dirty(&self) -> Result<()> {
        self.set_dirty(true)
    }

    pub fn clear_dirty(&self) -> Result<()> {
        self.set_dirty(false)
    }

    /// Current reference count; `None` for interned objects.
    pub fn ref_count(&self) -> Option<u32> {
        self.read(|store| Ok(store.ref_count(self.key))).ok().flatten()
    }

    /// Recursive copy; nested references stay references.
    pub fn deep_clone(&self) -> Result<PdfObject> {
        if self.key.is_predefined() {
            return self.try_clone();
        }
        self.write(|store, owner| Ok(PdfObject::adopt(owner, store.deep_copy(self.key)?)))
    }

    /// Whether both handles belong to the same document.
    pub fn same_document(&self, other: &PdfObject) -> bool {
        Weak::ptr_eq(&self.store, &other.store)
    }

    /// Gives back this handle's reference now instead of on drop. Further calls
    /// do nothing; the handle reads as null afterwards.
    pub fn release(&mut self) {
        let key = std::mem::replace(&mut self.key, ObjKey::Null);
        if key.is_predefined() {
            return;
        }
        let Some(store) = self.store.upgrade() else {
            debug_assert!(
                std::thread::panicking(),
                "object handle released after its document was dropped"
            );
            return;
        };
        let Ok(mut store) = store.try_borrow_mut() else {
            warn!("document store busy; leaking a reference to {:?}", key);
            return;
        };
        let _ = store.release(key);
    }
}

/// Turns `value` into a key owned by the caller, creating an object when needed.
/// Mutable access to the store behind `owner`, without holding a reference
/// to any object in it.
pub(crate) fn with_store_mut<T>(
    owner: &Weak<RefCell<Store>>,
    f: impl FnOnce(&mut Store, &Weak<RefCell<Store>>) -> Result<T>,
) -> Result<T> {
    let store = owner.upgrade().ok_or(Error::DocumentDropped)?;
    let mut store = store.try_borrow_mut().map_err(|_| Error::UsageViolation(BORROWED))?;
    f(&mut store, owner)
}

pub(crate) fn materialize(store: &mut Store, owner: &Weak<RefCell<Store>>, value: Value<'_>) -> Result<ObjKey> {
    let check_owner = |object: &PdfObject| {
        if object.key.is_predefined() || Weak::ptr_eq(object.owner(), owner) {
            Ok(())
        } else {
            Err(Error::UsageViolation(FOREIGN))
        }
    };
    Ok(match value {
        Value::Null => ObjKey::Null,
        Value::Boolean(value) => ObjKey::boolean(value),
        Value::Integer(value) => store.new_integer(value),
        Value::Real(value) => store.new_real(value),
        Value::Predefined(name) => ObjKey::Name(name),
        Value::Name(name) => store.new_name(&name),
        Value::Text(text) => store.new_text_string(&text),
        Value::Bytes(bytes, format) => store.new_string(bytes.into_owned(), format),
        #[cfg(feature = "chrono")]
        Value::Date(date) => store.new_string(crate::datetime::format_date(&date).into_bytes(), StringFormat::Literal),
        Value::Reference(id) => store.new_reference(id),
        Value::Object(object) => {
            check_owner(object)?;
            store.retain(object.key)?;
            object.key
        }
        Value::Owned(mut object) => {
            check_owner(&object)?;
            std::mem::replace(&mut object.key, ObjKey::Null)
        }
    })
}

impl Clone for PdfObject {
    /// # Panics
    ///
    /// Panics if the document store is borrowed at the time; use
    /// [`PdfObject::try_clone`] to get an error instead.
    fn clone(&self) -> Self {
        if !self.key.is_predefined() {
            if let Some(store) = self.store.upgrade() {
                let _ = store.borrow_mut().retain(self.key);
            }
        }
        PdfObject {
            key: self.key,
            store: self.store.clone(),
        }
    }
}

impl Drop for PdfObject {
    fn drop(&mut self) {
        self.release();
    }
}

impl PartialEq for PdfObject {
    /// Structural equality, following references.
    fn eq(&self, other: &PdfObject) -> bool {
        if self.key.is_predefined() && other.key.is_predefined() {
            return self.key == other.key;
        }
        if !self.same_document(other) && !self.key.is_predefined() && !other.key.is_predefined() {
            return false;
        }
        let store = if self.key.is_predefined() { other } else { self };
        store
            .read(|store| Ok(store.compare(self.key, other.key)))
            .unwrap_or(false)
    }
}

impl fmt::Display for PdfObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            ObjKey::Null => return f.write_str("<null>"),
            ObjKey::True => return f.write_str("<true>"),
            ObjKey::False => return f.write_str("<false>"),
            ObjKey::Name(name) => return write!(f, "{}", name),
            ObjKey::Slot(_) => {}
        }
        let summary = self.read(|store| Ok(summary(store, self.key)));
        match summary {
            Ok(summary) => f.write_str(&summary),
            Err(_) => f.write_str(Kind::Unknown.as_str()),
        }
    }
}

fn summary(store: &Store, key: ObjKey) -> String {
    match store.kind_of(key) {
        Kind::Integer => store.as_i64(key).map(|value| value.to_string()).unwrap_or_default(),
        Kind::Float => store.as_f64(key).map(|value| value.to_string()).unwrap_or_default(),
        Kind::Name => format!("/{}", String::from_utf8_lossy(store.name_bytes(key).unwrap_or_default())),
        Kind::String => store.text(key).map(str::to_owned).unwrap_or_default(),
        Kind::Array => format!("[{}]", store.array_len(key).unwrap_or_default()),
        Kind::Dictionary | Kind::Stream => {
            let type_name = store
                .dict_get(key, PdfName::Type.as_bytes())
                .ok()
                .flatten()
                .map(|value| store.resolve(value))
                .and_then(|value| store.name_bytes(value).ok());
            match type_name {
                Some(name) => format!("{{/{}}}", String::from_utf8_lossy(name)),
                None => "{}".to_owned(),
            }
        }
        Kind::Reference => match store.reference(key) {
            Ok((number, generation)) => format!("{} {} R", number, generation),
            Err(_) => String::new(),
        },
        kind => kind.as_str().to_owned(),
    }
}

impl fmt::Debug for PdfObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(store) = self.store.upgrade() else {
            return match self.key {
                ObjKey::Slot(_) => f.write_str("<dropped>"),
                key => Store::new().write_debug(key, f),
            };
        };
        let result = match store.try_borrow() {
            Ok(store) => store.write_debug(self.key, f),
            Err(_) => write!(f, "{:?}", self.key),
        };
        result
    }
}

impl From<PdfName> for PdfObject {
    fn from(name: PdfName) -> Self {
        PdfObject::name(name)
    }
}

impl From<bool> for PdfObject {
    fn from(value: bool) -> Self {
        PdfObject::boolean(value)
    }
}

/// Handle to `key`, taking over the caller's reference.
pub(crate) fn bound(store: &Rc<RefCell<Store>>, key: ObjKey) -> PdfObject {
    PdfObject::adopt(&Rc::downgrade(store), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interned_handles_need_no_document() {
        let null = PdfObject::null();
        assert_eq!(null.kind(), Kind::Null);
        assert!(null.is_predefined());
        assert_eq!(null.to_string(), "<null>");

        let yes = PdfObject::boolean(true);
        assert!(yes.as_bool().unwrap());
        assert_eq!(yes.to_string(), "<true>");
        assert!(matches!(yes.as_i64(), Err(Error::ObjectType { expected: "Integer", found: "Boolean" })));

        let name = PdfObject::name(PdfName::Type);
        assert_eq!(name.as_name().unwrap(), b"Type");
        assert_eq!(name.to_string(), "/Type");
        assert_eq!(name, PdfObject::name(PdfName::Type));
        assert_ne!(name, PdfObject::name(PdfName::Length));
    }

    #[test]
    fn release_is_idempotent() {
        let mut null = PdfObject::null();
        null.release();
        null.release();
        assert!(null.is_null());
    }

    #[test]
    fn i32_saturates() {
        let store = Rc::new(RefCell::new(Store::new()));
        let key = store.borrow_mut().new_integer(i64::from(i32::MAX) + 10);
        let big = bound(&store, key);
        assert_eq!(big.as_i32().unwrap(), i32::MAX);
        assert_eq!(big.as_i64().unwrap(), i64::from(i32::MAX) + 10);
    }
}
