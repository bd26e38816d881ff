use std::cell::{Cell, OnceCell};
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::dictionary::Dict;
use crate::encodings;
use crate::filters::{FilterCodec, StandardFilters};
use crate::names::PdfName;
use crate::object::{Kind, ObjFlags, ObjKey, ObjectId, SlotId, StringFormat};
use crate::stream::{Payload, StreamData};
use crate::xref::Xref;
use crate::{Error, Result};

pub(crate) const ITERATING: &str = "container modified while it is being iterated";
const FREED: &str = "object was already freed";

/// Kind-specific payload of a store node.
pub(crate) enum Body {
    Integer(i64),
    Real(f64),
    Name(Vec<u8>),
    String(PdfString),
    Array(Vec<ObjKey>),
    Dictionary(Dict),
    Stream(Box<StreamData>),
    Reference(ObjectId),
}

pub(crate) struct PdfString {
    pub(crate) bytes: Vec<u8>,
    pub(crate) format: StringFormat,
    /// Decoded once, on first request.
    pub(crate) text: OnceCell<String>,
}

impl PdfString {
    pub(crate) fn new(bytes: Vec<u8>, format: StringFormat) -> PdfString {
        PdfString {
            bytes,
            format,
            text: OnceCell::new(),
        }
    }
}

impl Body {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Body::Integer(_) => Kind::Integer,
            Body::Real(_) => Kind::Float,
            Body::Name(_) => Kind::Name,
            Body::String(_) => Kind::String,
            Body::Array(_) => Kind::Array,
            Body::Dictionary(_) => Kind::Dictionary,
            Body::Stream(_) => Kind::Stream,
            Body::Reference(_) => Kind::Reference,
        }
    }

    /// Pushes the store entries directly owned by this body.
    fn children(&self, out: &mut Vec<ObjKey>) {
        match self {
            Body::Array(items) => out.extend(items.iter().filter(|key| !key.is_predefined())),
            Body::Dictionary(dict) => out.extend(dict.values().filter(|key| !key.is_predefined())),
            Body::Stream(stream) => out.extend(stream.dict.values().filter(|key| !key.is_predefined())),
            _ => {}
        }
    }
}

pub(crate) struct Node {
    pub(crate) refs: u32,
    pub(crate) flags: ObjFlags,
    /// Live iterators over this container. Shared with their
    /// [`IterationLock`]s so dropping one never needs the store.
    pub(crate) iterators: Option<Rc<Cell<u32>>>,
    pub(crate) body: Body,
}

impl Node {
    pub(crate) fn is_iterated(&self) -> bool {
        self.iterators.as_ref().is_some_and(|count| count.get() > 0)
    }
}

/// Keeps a container locked against mutation until dropped.
pub(crate) struct IterationLock(Rc<Cell<u32>>);

impl Drop for IterationLock {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

struct Slot {
    epoch: u32,
    node: Option<Node>,
}

/// The object store of one document.
///
/// The store owns every live object, is the only place where reference counts
/// and dirty bits change, and holds the object-number table used to resolve
/// indirect references.
pub struct Store {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    pub(crate) xref: Xref,
    pub(crate) codec: Box<dyn FilterCodec>,
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .field("objects", &self.xref.len())
            .finish()
    }
}

impl Store {
    pub fn new() -> Store {
        Store::with_codec(Box::new(StandardFilters))
    }

    /// Create a store that decodes stream filters with `codec`.
    pub fn with_codec(codec: Box<dyn FilterCodec>) -> Store {
        Store {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            xref: Xref::new(),
            codec,
        }
    }

    /// Number of live (non-interned) objects.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub(crate) fn alloc(&mut self, body: Body) -> ObjKey {
        let node = Node {
            refs: 1,
            flags: ObjFlags::empty(),
            iterators: None,
            body,
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            ObjKey::Slot(SlotId {
                index,
                epoch: slot.epoch,
            })
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                epoch: 0,
                node: Some(node),
            });
            ObjKey::Slot(SlotId { index, epoch: 0 })
        }
    }

    pub(crate) fn node(&self, key: ObjKey) -> Option<&Node> {
        match key {
            ObjKey::Slot(id) => self
                .slots
                .get(id.index as usize)
                .filter(|slot| slot.epoch == id.epoch)
                .and_then(|slot| slot.node.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn node_mut(&mut self, key: ObjKey) -> Option<&mut Node> {
        match key {
            ObjKey::Slot(id) => self
                .slots
                .get_mut(id.index as usize)
                .filter(|slot| slot.epoch == id.epoch)
                .and_then(|slot| slot.node.as_mut()),
            _ => None,
        }
    }

    pub(crate) fn body(&self, key: ObjKey) -> Option<&Body> {
        self.node(key).map(|node| &node.body)
    }

    /// Whether `key` names a live object. Interned keys are always live.
    pub fn contains(&self, key: ObjKey) -> bool {
        key.is_predefined() || self.node(key).is_some()
    }

    pub fn kind_of(&self, key: ObjKey) -> Kind {
        key.interned_kind()
            .or_else(|| self.body(key).map(Body::kind))
            .unwrap_or(Kind::Unknown)
    }

    /// Add one owner to `key`. Interned keys are not counted.
    pub fn retain(&mut self, key: ObjKey) -> Result<()> {
        if key.is_predefined() {
            return Ok(());
        }
        let node = self.node_mut(key).ok_or(Error::UsageViolation(FREED))?;
        node.refs += 1;
        Ok(())
    }

    /// Drop one owner of `key`.
    ///
    /// When the last owner goes away the object's children are released in turn
    /// and the slot is recycled.
    pub fn release(&mut self, key: ObjKey) -> Result<()> {
        if key.is_predefined() {
            return Ok(());
        }
        if self.node(key).is_none() {
            debug!("release of stale object key {:?}", key);
            return Err(Error::UsageViolation(FREED));
        }
        let mut pending = vec![key];
        while let Some(key) = pending.pop() {
            let ObjKey::Slot(id) = key else { continue };
            let remaining = match self.node_mut(key) {
                Some(node) => {
                    node.refs -= 1;
                    node.refs
                }
                None => {
                    debug!("child {:?} was freed before its owner", key);
                    continue;
                }
            };
            if remaining > 0 {
                continue;
            }
            let slot = &mut self.slots[id.index as usize];
            if let Some(node) = slot.node.take() {
                node.body.children(&mut pending);
            }
            slot.epoch = slot.epoch.wrapping_add(1);
            self.free.push(id.index);
            self.live -= 1;
        }
        Ok(())
    }

    /// Current reference count, `None` for interned or freed keys.
    pub fn ref_count(&self, key: ObjKey) -> Option<u32> {
        self.node(key).map(|node| node.refs)
    }

    pub fn flags(&self, key: ObjKey) -> ObjFlags {
        self.node(key).map(|node| node.flags).unwrap_or_default()
    }

    pub fn is_dirty(&self, key: ObjKey) -> bool {
        self.flags(key).contains(ObjFlags::DIRTY)
    }

    pub fn mark_dirty(&mut self, key: ObjKey) {
        if let Some(node) = self.node_mut(key) {
            node.flags.insert(ObjFlags::DIRTY);
        }
    }

    pub fn clear_dirty(&mut self, key: ObjKey) {
        if let Some(node) = self.node_mut(key) {
            node.flags.remove(ObjFlags::DIRTY);
        }
    }

    /// Whether `key` or anything it directly owns is dirty.
    pub fn is_dirty_deep(&self, key: ObjKey) -> bool {
        let mut pending = vec![key];
        while let Some(key) = pending.pop() {
            if let Some(node) = self.node(key) {
                if node.flags.contains(ObjFlags::DIRTY) {
                    return true;
                }
                node.body.children(&mut pending);
            }
        }
        false
    }

    /// Clear the dirty bit of `key` and of everything it directly owns.
    pub fn clear_dirty_deep(&mut self, key: ObjKey) {
        let mut pending = vec![key];
        while let Some(key) = pending.pop() {
            if let Some(node) = self.node_mut(key) {
                node.flags.remove(ObjFlags::DIRTY);
                node.body.children(&mut pending);
            }
        }
    }

    pub fn new_integer(&mut self, value: i64) -> ObjKey {
        self.alloc(Body::Integer(value))
    }

    pub fn new_real(&mut self, value: f64) -> ObjKey {
        self.alloc(Body::Real(value))
    }

    /// Spellings of predefined names yield the interned name.
    pub fn new_name(&mut self, name: &[u8]) -> ObjKey {
        match PdfName::from_bytes(name) {
            Some(name) => ObjKey::Name(name),
            None => self.alloc(Body::Name(name.to_vec())),
        }
    }

    pub fn new_string(&mut self, bytes: Vec<u8>, format: StringFormat) -> ObjKey {
        self.alloc(Body::String(PdfString::new(bytes, format)))
    }

    /// A text string holding `text`, see [`encodings::encode_text_string`].
    pub fn new_text_string(&mut self, text: &str) -> ObjKey {
        let (bytes, format) = encodings::encode_text_string(text);
        let key = self.new_string(bytes, format);
        if let Some(Body::String(string)) = self.node(key).map(|node| &node.body) {
            let _ = string.text.set(text.to_owned());
        }
        key
    }

    pub fn new_array(&mut self) -> ObjKey {
        self.alloc(Body::Array(Vec::new()))
    }

    pub fn new_dictionary(&mut self) -> ObjKey {
        self.alloc(Body::Dictionary(Dict::new()))
    }

    pub fn new_reference(&mut self, id: ObjectId) -> ObjKey {
        self.alloc(Body::Reference(id))
    }

    pub fn as_bool(&self, key: ObjKey) -> Result<bool> {
        match key {
            ObjKey::True => Ok(true),
            ObjKey::False => Ok(false),
            _ => Err(Error::object_type("Boolean", self.kind_of(key))),
        }
    }

    /// Integer value; a real is truncated toward zero.
    pub fn as_i64(&self, key: ObjKey) -> Result<i64> {
        match self.body(key) {
            Some(Body::Integer(value)) => Ok(*value),
            Some(Body::Real(value)) => Ok(value.trunc() as i64),
            _ => Err(Error::object_type("Integer", self.kind_of(key))),
        }
    }

    /// Real value; an integer is widened.
    pub fn as_f64(&self, key: ObjKey) -> Result<f64> {
        match self.body(key) {
            Some(Body::Real(value)) => Ok(*value),
            Some(Body::Integer(value)) => Ok(*value as f64),
            _ => Err(Error::object_type("Float", self.kind_of(key))),
        }
    }

    pub fn name_bytes(&self, key: ObjKey) -> Result<&[u8]> {
        match key {
            ObjKey::Name(name) => Ok(name.as_bytes()),
            _ => match self.body(key) {
                Some(Body::Name(name)) => Ok(name),
                _ => Err(Error::object_type("Name", self.kind_of(key))),
            },
        }
    }

    fn string(&self, key: ObjKey) -> Result<&PdfString> {
        match self.body(key) {
            Some(Body::String(string)) => Ok(string),
            _ => Err(Error::object_type("String", self.kind_of(key))),
        }
    }

    /// Raw bytes of a string object, without any decoding.
    pub fn string_bytes(&self, key: ObjKey) -> Result<&[u8]> {
        self.string(key).map(|string| string.bytes.as_slice())
    }

    pub fn string_format(&self, key: ObjKey) -> Result<StringFormat> {
        self.string(key).map(|string| string.format)
    }

    /// Decoded text of a string object. The result is cached on the object.
    pub fn text(&self, key: ObjKey) -> Result<&str> {
        let string = self.string(key)?;
        Ok(string
            .text
            .get_or_init(|| encodings::decode_text_string(&string.bytes)))
    }

    pub fn reference(&self, key: ObjKey) -> Result<ObjectId> {
        match self.body(key) {
            Some(Body::Reference(id)) => Ok(*id),
            _ => Err(Error::object_type("Reference", self.kind_of(key))),
        }
    }

    pub fn set_integer(&mut self, key: ObjKey, value: i64) -> Result<()> {
        let kind = self.kind_of(key);
        match self.node_mut(key) {
            Some(Node {
                body: Body::Integer(current),
                flags,
                ..
            }) => {
                *current = value;
                flags.insert(ObjFlags::DIRTY);
                Ok(())
            }
            _ => Err(Error::object_type("Integer", kind)),
        }
    }

    pub fn set_real(&mut self, key: ObjKey, value: f64) -> Result<()> {
        let kind = self.kind_of(key);
        match self.node_mut(key) {
            Some(Node {
                body: Body::Real(current),
                flags,
                ..
            }) => {
                *current = value;
                flags.insert(ObjFlags::DIRTY);
                Ok(())
            }
            _ => Err(Error::object_type("Float", kind)),
        }
    }

    /// Run `f`, which takes over one reference to `child`; the reference is
    /// dropped if `f` fails.
    pub(crate) fn consuming<T>(&mut self, child: ObjKey, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        let result = f(self);
        if result.is_err() {
            let _ = self.release(child);
        }
        result
    }

    /// Rejects storing `child` inside `container` when that would make the
    /// container directly contain itself.
    pub(crate) fn check_child(&self, container: ObjKey, child: ObjKey) -> Result<()> {
        if child.is_predefined() {
            return Ok(());
        }
        if child == container || self.reaches(child, container) {
            return Err(Error::UsageViolation("a container cannot directly contain itself"));
        }
        Ok(())
    }

    fn reaches(&self, from: ObjKey, target: ObjKey) -> bool {
        let mut pending = Vec::new();
        if let Some(body) = self.body(from) {
            body.children(&mut pending);
        }
        while let Some(key) = pending.pop() {
            if key == target {
                return true;
            }
            if let Some(body) = self.body(key) {
                body.children(&mut pending);
            }
        }
        false
    }

    pub(crate) fn lock_iteration(&mut self, key: ObjKey) -> Result<IterationLock> {
        let node = self.node_mut(key).ok_or(Error::UsageViolation(FREED))?;
        let count = node.iterators.get_or_insert_with(|| Rc::new(Cell::new(0)));
        count.set(count.get() + 1);
        Ok(IterationLock(Rc::clone(count)))
    }

    /// Copy `key` recursively. References are copied as references; arrays,
    /// dictionaries and streams are duplicated. The copy starts clean.
    pub fn deep_copy(&mut self, key: ObjKey) -> Result<ObjKey> {
        if key.is_predefined() {
            return Ok(key);
        }
        if let Some(Body::Stream(_)) = self.body(key) {
            // Load a deferred payload so the copy owns real bytes.
            self.load_payload(key)?;
        }
        let body = match self.body(key) {
            Some(Body::Integer(value)) => Body::Integer(*value),
            Some(Body::Real(value)) => Body::Real(*value),
            Some(Body::Name(name)) => Body::Name(name.clone()),
            Some(Body::String(string)) => Body::String(PdfString::new(string.bytes.clone(), string.format)),
            Some(Body::Reference(id)) => Body::Reference(*id),
            Some(Body::Array(items)) => {
                let items = items.clone();
                Body::Array(self.deep_copy_all(items)?)
            }
            Some(Body::Dictionary(dict)) => {
                let dict = dict.clone();
                Body::Dictionary(self.deep_copy_dict(dict)?)
            }
            Some(Body::Stream(stream)) => {
                let dict = stream.dict.clone();
                let content = match &stream.payload {
                    Payload::Loaded(bytes) => bytes.clone(),
                    Payload::Deferred(_) => Vec::new(),
                };
                Body::Stream(Box::new(StreamData {
                    dict: self.deep_copy_dict(dict)?,
                    payload: Payload::Loaded(content),
                }))
            }
            None => return Err(Error::UsageViolation(FREED)),
        };
        Ok(self.alloc(body))
    }

    fn deep_copy_all(&mut self, items: Vec<ObjKey>) -> Result<Vec<ObjKey>> {
        let mut copies = Vec::with_capacity(items.len());
        for item in items {
            match self.deep_copy(item) {
                Ok(copy) => copies.push(copy),
                Err(err) => {
                    for copy in copies {
                        let _ = self.release(copy);
                    }
                    return Err(err);
                }
            }
        }
        Ok(copies)
    }

    fn deep_copy_dict(&mut self, dict: Dict) -> Result<Dict> {
        let (keys, values): (Vec<_>, Vec<_>) = dict.into_iter().unzip();
        let copies = self.deep_copy_all(values)?;
        Ok(keys.into_iter().zip(copies).collect())
    }

    /// Writes `key` in PDF-like syntax. References are printed, not followed.
    pub(crate) fn write_debug(&self, key: ObjKey, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match key {
            ObjKey::Null => return f.write_str("null"),
            ObjKey::True => return f.write_str("true"),
            ObjKey::False => return f.write_str("false"),
            ObjKey::Name(name) => return write!(f, "{}", name),
            ObjKey::Slot(_) => {}
        }
        match self.body(key) {
            None => f.write_str("<freed>"),
            Some(Body::Integer(value)) => write!(f, "{}", value),
            Some(Body::Real(value)) => write!(f, "{}", value),
            Some(Body::Name(name)) => write!(f, "/{}", String::from_utf8_lossy(name)),
            Some(Body::String(string)) => write!(f, "({})", String::from_utf8_lossy(&string.bytes)),
            Some(Body::Reference(id)) => write!(f, "{} {} R", id.0, id.1),
            Some(Body::Array(items)) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    self.write_debug(*item, f)?;
                }
                f.write_str("]")
            }
            Some(Body::Dictionary(dict)) => self.write_dict_debug(dict, f),
            Some(Body::Stream(stream)) => {
                self.write_dict_debug(&stream.dict, f)?;
                f.write_str("stream...endstream")
            }
        }
    }

    fn write_dict_debug(&self, dict: &Dict, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<<")?;
        for (name, value) in dict {
            write!(f, "/{} ", String::from_utf8_lossy(name))?;
            self.write_debug(*value, f)?;
        }
        f.write_str(">>")
    }
}
