use std::borrow::Cow;
use std::fmt;

use bitflags::bitflags;

use crate::names::PdfName;
use crate::{Array, Dictionary, PdfObject, Stream};

/// Object identifier consists of two parts: object number and generation number.
pub type ObjectId = (u32, u16);

/// Position of a node inside a document store.
///
/// The epoch changes every time a slot is recycled, so a stale key never aliases
/// the object that later reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    pub(crate) index: u32,
    pub(crate) epoch: u32,
}

/// Compact key of an object.
///
/// Null, the two booleans and the predefined names are interned: they are tags,
/// not store entries, and are never reference counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjKey {
    Null,
    True,
    False,
    Name(PdfName),
    Slot(SlotId),
}

impl ObjKey {
    pub fn boolean(value: bool) -> ObjKey {
        if value { ObjKey::True } else { ObjKey::False }
    }

    /// Whether the key is one of the interned singletons.
    pub fn is_predefined(self) -> bool {
        !matches!(self, ObjKey::Slot(_))
    }

    /// Kind of an interned key, `None` for store entries.
    pub(crate) fn interned_kind(self) -> Option<Kind> {
        match self {
            ObjKey::Null => Some(Kind::Null),
            ObjKey::True | ObjKey::False => Some(Kind::Boolean),
            ObjKey::Name(_) => Some(Kind::Name),
            ObjKey::Slot(_) => None,
        }
    }
}

impl From<PdfName> for ObjKey {
    fn from(name: PdfName) -> Self {
        ObjKey::Name(name)
    }
}

/// Kind of a PDF object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Boolean,
    Name,
    Integer,
    Float,
    String,
    Array,
    Dictionary,
    Stream,
    Reference,
    Unknown,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Null => "Null",
            Kind::Boolean => "Boolean",
            Kind::Name => "Name",
            Kind::Integer => "Integer",
            Kind::Float => "Float",
            Kind::String => "String",
            Kind::Array => "Array",
            Kind::Dictionary => "Dictionary",
            Kind::Stream => "Stream",
            Kind::Reference => "Reference",
            Kind::Unknown => "Unknown",
        }
    }

    pub fn is_number(self) -> bool {
        matches!(self, Kind::Integer | Kind::Float)
    }

    /// A stream is always also a dictionary.
    pub fn is_dictionary(self) -> bool {
        matches!(self, Kind::Dictionary | Kind::Stream)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Per-object state bits kept by the store.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ObjFlags: u8 {
        /// Changed since the document was opened or since the last save point.
        const DIRTY = 0b0000_0001;
        /// Dictionary keys are in canonical order.
        const SORTED = 0b0000_0010;
    }
}

/// String objects can be written in two formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringFormat {
    #[default]
    Literal,
    Hexadecimal,
}

/// A value handed to a container mutator or an object constructor.
///
/// Scalars, names and text are materialised as fresh objects owned by the
/// container. `Object` retains an existing handle, `Owned` transfers the reference
/// held by the handle.
#[derive(Debug)]
pub enum Value<'a> {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Predefined(PdfName),
    Name(Cow<'a, [u8]>),
    /// Text, stored as a PDF text string.
    Text(Cow<'a, str>),
    /// Raw string bytes, stored untouched.
    Bytes(Cow<'a, [u8]>, StringFormat),
    #[cfg(feature = "chrono")]
    Date(chrono::DateTime<chrono::Utc>),
    Reference(ObjectId),
    Object(&'a PdfObject),
    Owned(PdfObject),
}

impl<'a> Value<'a> {
    /// An arbitrary name. Spellings of predefined names yield the interned name.
    pub fn name<N: AsRef<[u8]> + ?Sized>(name: &'a N) -> Value<'a> {
        Value::Name(Cow::Borrowed(name.as_ref()))
    }

    pub fn string_literal<S: Into<Vec<u8>>>(bytes: S) -> Value<'static> {
        Value::Bytes(Cow::Owned(bytes.into()), StringFormat::Literal)
    }

    pub fn string_hex<S: Into<Vec<u8>>>(bytes: S) -> Value<'static> {
        Value::Bytes(Cow::Owned(bytes.into()), StringFormat::Hexadecimal)
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value<'_> {
    fn from(number: i64) -> Self {
        Value::Integer(number)
    }
}

macro_rules! from_smaller_ints {
	($( $Int: ty )+) => {
		$(
			impl From<$Int> for Value<'_> {
				fn from(number: $Int) -> Self {
					Value::Integer(i64::from(number))
				}
			}
		)+
	}
}

from_smaller_ints! {
    i8 i16 i32
    u8 u16 u32
}

impl From<f64> for Value<'_> {
    fn from(number: f64) -> Self {
        Value::Real(number)
    }
}

impl From<f32> for Value<'_> {
    fn from(number: f32) -> Self {
        Value::Real(f64::from(number))
    }
}

impl From<PdfName> for Value<'_> {
    fn from(name: PdfName) -> Self {
        Value::Predefined(name)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(text: &'a str) -> Self {
        Value::Text(Cow::Borrowed(text))
    }
}

impl From<String> for Value<'_> {
    fn from(text: String) -> Self {
        Value::Text(Cow::Owned(text))
    }
}

impl From<ObjectId> for Value<'_> {
    fn from(id: ObjectId) -> Self {
        Value::Reference(id)
    }
}

impl<'a> From<&'a PdfObject> for Value<'a> {
    fn from(object: &'a PdfObject) -> Self {
        Value::Object(object)
    }
}

impl From<PdfObject> for Value<'_> {
    fn from(object: PdfObject) -> Self {
        Value::Owned(object)
    }
}

macro_rules! from_views {
	($( $View: ty )+) => {
		$(
			impl<'a> From<&'a $View> for Value<'a> {
				fn from(view: &'a $View) -> Self {
					Value::Object(view.object())
				}
			}

			impl From<$View> for Value<'_> {
				fn from(view: $View) -> Self {
					Value::Owned(view.into_object())
				}
			}
		)+
	}
}

from_views! {
    Array Dictionary Stream
}

/// Something that can be used as a dictionary key.
pub trait AsName {
    fn as_name_bytes(&self) -> &[u8];
}

impl AsName for PdfName {
    fn as_name_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsName for &str {
    fn as_name_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsName for &[u8] {
    fn as_name_bytes(&self) -> &[u8] {
        self
    }
}

impl<const N: usize> AsName for &[u8; N] {
    fn as_name_bytes(&self) -> &[u8] {
        &self[..]
    }
}

impl AsName for &String {
    fn as_name_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsName for &Vec<u8> {
    fn as_name_bytes(&self) -> &[u8] {
        self
    }
}
