//! Reference-counted object graph of a PDF document.
//!
//! Objects live in the store of a [`Document`] and are reached through owning
//! [`PdfObject`] handles. Arrays, dictionaries and streams are viewed through
//! [`Array`], [`Dictionary`] and [`Stream`]; indirect references are resolved
//! against the document's object table on demand.
//!
//! ```
//! use lopdf_graph::{Document, PdfName};
//!
//! let doc = Document::new();
//! let page = doc.new_dictionary()?;
//! page.set(PdfName::Type, PdfName::Page)?;
//! page.set("Rotate", 90)?;
//! let id = doc.add_object(&page)?;
//!
//! let parent = doc.new_dictionary()?;
//! parent.set(PdfName::Kids, doc.new_array()?)?;
//! parent.get(PdfName::Kids)?.unwrap().as_array()?.push(id)?;
//! assert_eq!(page.to_string(), "{/Page}");
//! # Ok::<(), lopdf_graph::Error>(())
//! ```

#![forbid(unsafe_code)]

mod array;
mod datetime;
mod dictionary;
mod document;
pub mod encodings;
mod error;
pub mod filters;
mod handle;
mod names;
mod object;
mod resolve;
mod store;
mod stream;
mod xref;

pub use crate::array::{Array, ArrayIter};
pub use crate::datetime::DateString;
pub use crate::dictionary::{Dict, DictIter, Dictionary};
pub use crate::document::Document;
pub use crate::error::{DecompressError, Error, Result};
pub use crate::filters::{DecodeParams, FilterCodec, StandardFilters};
pub use crate::handle::PdfObject;
pub use crate::names::PdfName;
pub use crate::object::{AsName, Kind, ObjFlags, ObjKey, ObjectId, SlotId, StringFormat, Value};
pub use crate::resolve::MAX_REFERENCE_CHAIN;
pub use crate::store::Store;
pub use crate::stream::{ByteStream, Stream, StreamLoader};
pub use crate::xref::{Xref, XrefEntry};
