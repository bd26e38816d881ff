use std::fmt;
use std::io::{self, Read};
use std::ops::Deref;

use log::debug;

use crate::dictionary::{Dict, Dictionary};
use crate::filters::DecodeParams;
use crate::handle::PdfObject;
use crate::names::PdfName;
use crate::object::{ObjFlags, ObjKey};
use crate::store::{Body, ITERATING, Node, Store};
use crate::{Error, Result};

/// Supplies the raw payload of a stream on first access.
///
/// A loader that fails is kept and tried again on the next access.
pub type StreamLoader = Box<dyn FnMut() -> Result<Vec<u8>>>;

pub(crate) struct StreamData {
    pub(crate) dict: Dict,
    pub(crate) payload: Payload,
}

pub(crate) enum Payload {
    Loaded(Vec<u8>),
    Deferred(StreamLoader),
}

impl Payload {
    /// Deferred payloads are only equal to themselves.
    pub(crate) fn same_bytes(&self, other: &Payload) -> bool {
        match (self, other) {
            (Payload::Loaded(a), Payload::Loaded(b)) => a == b,
            (a, b) => std::ptr::eq(a, b),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Loaded(bytes) => write!(f, "Loaded({} bytes)", bytes.len()),
            Payload::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

impl Store {
    /// A stream holding `content` as its raw payload; `/Length` is set.
    pub fn new_stream(&mut self, dict: Dict, content: Vec<u8>) -> ObjKey {
        let mut dict = dict;
        let length = self.new_integer(content.len() as i64);
        if let Some(previous) = dict.insert(PdfName::Length.as_bytes().to_vec(), length) {
            let _ = self.release(previous);
        }
        self.alloc(Body::Stream(Box::new(StreamData {
            dict,
            payload: Payload::Loaded(content),
        })))
    }

    /// A stream whose raw payload is produced by `loader` when first needed.
    pub fn new_deferred_stream(&mut self, dict: Dict, loader: StreamLoader) -> ObjKey {
        self.alloc(Body::Stream(Box::new(StreamData {
            dict,
            payload: Payload::Deferred(loader),
        })))
    }

    fn stream(&self, key: ObjKey) -> Result<&StreamData> {
        match self.body(key) {
            Some(Body::Stream(stream)) => Ok(stream),
            _ => Err(Error::object_type("Stream", self.kind_of(key))),
        }
    }

    fn stream_mut(&mut self, key: ObjKey) -> Result<&mut StreamData> {
        let kind = self.kind_of(key);
        match self.node_mut(key).map(|node| &mut node.body) {
            Some(Body::Stream(stream)) => Ok(stream),
            _ => Err(Error::object_type("Stream", kind)),
        }
    }

    /// Runs a deferred loader, replacing it with its result.
    pub(crate) fn load_payload(&mut self, key: ObjKey) -> Result<()> {
        let stream = self.stream_mut(key)?;
        if let Payload::Deferred(loader) = &mut stream.payload {
            debug!("loading deferred stream payload of {:?}", key);
            let bytes = loader()?;
            stream.payload = Payload::Loaded(bytes);
        }
        Ok(())
    }

    /// The undecoded payload.
    pub fn stream_raw_bytes(&mut self, key: ObjKey) -> Result<&[u8]> {
        self.load_payload(key)?;
        match &self.stream(key)?.payload {
            Payload::Loaded(bytes) => Ok(bytes),
            Payload::Deferred(_) => Err(Error::UsageViolation("stream payload is not loaded")),
        }
    }

    /// Names listed in `/Filter`, in application order.
    pub fn stream_filters(&self, key: ObjKey) -> Result<Vec<Vec<u8>>> {
        let dict = &self.stream(key)?.dict;
        let Some(filter) = dict.get(PdfName::Filter.as_bytes()) else {
            return Ok(Vec::new());
        };
        let filter = self.resolve(*filter);
        if let Ok(name) = self.name_bytes(filter) {
            return Ok(vec![name.to_vec()]);
        }
        match self.body(filter) {
            Some(Body::Array(items)) => items
                .iter()
                .map(|item| self.name_bytes(self.resolve(*item)).map(<[u8]>::to_vec))
                .collect(),
            _ => Err(Error::object_type("Name", self.kind_of(filter))),
        }
    }

    /// `/DecodeParms` for each filter; missing or null entries take the defaults.
    fn stream_decode_params(&self, key: ObjKey, count: usize) -> Result<Vec<DecodeParams>> {
        let dict = &self.stream(key)?.dict;
        let params = dict
            .get(PdfName::DecodeParms.as_bytes())
            .map(|params| self.resolve(*params))
            .unwrap_or(ObjKey::Null);
        let per_filter: Vec<ObjKey> = match self.body(params) {
            Some(Body::Array(items)) => items.iter().map(|item| self.resolve(*item)).collect(),
            _ => vec![params; count],
        };
        Ok((0..count)
            .map(|index| {
                per_filter
                    .get(index)
                    .map(|params| self.decode_params(*params))
                    .unwrap_or_default()
            })
            .collect())
    }

    fn decode_params(&self, key: ObjKey) -> DecodeParams {
        let mut params = DecodeParams::default();
        let Ok(dict) = self.dict(key) else {
            return params;
        };
        let integer = |name: PdfName| {
            dict.get(name.as_bytes())
                .and_then(|value| self.as_i64(self.resolve(*value)).ok())
        };
        if let Some(predictor) = integer(PdfName::Predictor) {
            params.predictor = predictor;
        }
        if let Some(colors) = integer(PdfName::Colors) {
            params.colors = colors;
        }
        if let Some(bits) = integer(PdfName::BitsPerComponent) {
            params.bits_per_component = bits;
        }
        if let Some(columns) = integer(PdfName::Columns) {
            params.columns = columns;
        }
        if let Some(early_change) = integer(PdfName::EarlyChange) {
            params.early_change = early_change != 0;
        }
        params
    }

    /// The payload with every declared filter undone.
    pub fn stream_decoded_bytes(&mut self, key: ObjKey) -> Result<Vec<u8>> {
        let filters = self.stream_filters(key)?;
        let params = self.stream_decode_params(key, filters.len())?;
        let mut data = self.stream_raw_bytes(key)?.to_vec();
        for (filter, params) in filters.iter().zip(&params) {
            data = self.codec.decode(filter, &data, params)?;
        }
        Ok(data)
    }

    /// Replaces the payload and updates `/Length`.
    ///
    /// `compressed` tells whether `data` is already encoded with the declared
    /// filters; when it is not, `/Filter` and `/DecodeParms` are removed.
    pub fn stream_set_bytes(&mut self, key: ObjKey, data: Vec<u8>, compressed: bool) -> Result<()> {
        self.stream(key)?;
        if self.node(key).is_some_and(Node::is_iterated) {
            return Err(Error::UsageViolation(ITERATING));
        }
        let length = self.new_integer(data.len() as i64);
        let mut released = Vec::new();
        let stream = self.stream_mut(key)?;
        if !compressed {
            released.extend(stream.dict.shift_remove(PdfName::Filter.as_bytes()));
            released.extend(stream.dict.shift_remove(PdfName::DecodeParms.as_bytes()));
        }
        released.extend(stream.dict.insert(PdfName::Length.as_bytes().to_vec(), length));
        stream.payload = Payload::Loaded(data);
        for previous in released {
            let _ = self.release(previous);
        }
        if let Some(node) = self.node_mut(key) {
            node.flags.insert(ObjFlags::DIRTY);
        }
        Ok(())
    }
}

/// Stream view of a stream object. Dictionary operations apply to the stream's
/// dictionary through [`Deref`].
#[derive(Clone, PartialEq)]
pub struct Stream {
    dict: Dictionary,
}

impl Stream {
    pub(crate) fn new_unchecked(obj: PdfObject) -> Stream {
        Stream {
            dict: Dictionary::new_unchecked(obj),
        }
    }

    pub fn object(&self) -> &PdfObject {
        self.dict.object()
    }

    pub fn into_object(self) -> PdfObject {
        self.dict.into_object()
    }

    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// Reader over the decoded payload.
    pub fn open_decoded(&self) -> Result<ByteStream> {
        self.get_bytes().map(ByteStream::new)
    }

    /// Reader over the raw payload.
    pub fn open_raw(&self) -> Result<ByteStream> {
        self.get_raw_bytes().map(ByteStream::new)
    }

    pub fn get_bytes(&self) -> Result<Vec<u8>> {
        let key = self.object().key();
        self.object().write(|store, _| store.stream_decoded_bytes(key))
    }

    pub fn get_raw_bytes(&self) -> Result<Vec<u8>> {
        let key = self.object().key();
        self.object()
            .write(|store, _| store.stream_raw_bytes(key).map(<[u8]>::to_vec))
    }

    /// Replaces the payload, see [`Store::stream_set_bytes`].
    pub fn set_bytes(&self, data: impl Into<Vec<u8>>, compressed: bool) -> Result<()> {
        let key = self.object().key();
        let data = data.into();
        self.object()
            .write(|store, _| store.stream_set_bytes(key, data, compressed))
    }

    /// Declared filter names.
    pub fn filters(&self) -> Result<Vec<Vec<u8>>> {
        let key = self.object().key();
        self.object().read(|store| store.stream_filters(key))
    }

    pub fn deep_clone(&self) -> Result<Stream> {
        self.object().deep_clone().map(Stream::new_unchecked)
    }
}

impl Deref for Stream {
    type Target = Dictionary;

    fn deref(&self) -> &Dictionary {
        &self.dict
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.object(), f)
    }
}

/// Single-pass reader over a stream payload.
#[derive(Debug)]
pub struct ByteStream {
    data: Vec<u8>,
    position: usize,
}

impl ByteStream {
    fn new(data: Vec<u8>) -> ByteStream {
        ByteStream { data, position: 0 }
    }

    /// Bytes not read yet.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = &self.data[self.position..];
        let count = rest.len().min(buf.len());
        buf[..count].copy_from_slice(&rest[..count]);
        self.position += count;
        Ok(count)
    }
}

impl Drop for ByteStream {
    fn drop(&mut self) {
        if self.remaining() > 0 {
            debug!("stream reader dropped with {} unread bytes", self.remaining());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn deferred_payload_loads_once() {
        let mut store = Store::new();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let stream = store.new_deferred_stream(
            Dict::new(),
            Box::new(move || {
                counter.set(counter.get() + 1);
                Ok(b"BT ET".to_vec())
            }),
        );
        assert_eq!(calls.get(), 0);
        assert_eq!(store.stream_raw_bytes(stream).unwrap(), b"BT ET");
        assert_eq!(store.stream_raw_bytes(stream).unwrap(), b"BT ET");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failing_loader_is_retried() {
        let mut store = Store::new();
        let mut attempts = 0;
        let stream = store.new_deferred_stream(
            Dict::new(),
            Box::new(move || {
                attempts += 1;
                if attempts == 1 {
                    Err(Error::UsageViolation("not yet"))
                } else {
                    Ok(vec![1, 2, 3])
                }
            }),
        );
        assert!(store.stream_raw_bytes(stream).is_err());
        assert_eq!(store.stream_raw_bytes(stream).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn unknown_filter_is_reported() {
        let mut store = Store::new();
        let mut dict = Dict::new();
        let filter = store.new_name(b"JBIG2Decode");
        dict.insert(b"Filter".to_vec(), filter);
        let stream = store.new_stream(dict, vec![0; 4]);
        assert_eq!(store.stream_filters(stream).unwrap(), vec![b"JBIG2Decode".to_vec()]);
        assert!(matches!(
            store.stream_decoded_bytes(stream),
            Err(Error::UnsupportedFilter(name)) if name == "JBIG2Decode"
        ));
    }

    #[test]
    fn set_bytes_uncompressed_drops_filters() {
        let mut store = Store::new();
        let mut dict = Dict::new();
        dict.insert(b"Filter".to_vec(), ObjKey::Name(PdfName::FlateDecode));
        let params = store.new_dictionary();
        dict.insert(b"DecodeParms".to_vec(), params);
        let stream = store.new_stream(dict, vec![0x78, 0x9c]);
        store.stream_set_bytes(stream, b"plain".to_vec(), false).unwrap();
        assert!(!store.contains(params));
        assert_eq!(store.dict_get(stream, b"Filter").unwrap(), None);
        let length = store.dict_get(stream, b"Length").unwrap().unwrap();
        assert_eq!(store.as_i64(length).unwrap(), 5);
        assert_eq!(store.stream_decoded_bytes(stream).unwrap(), b"plain");
        assert!(store.is_dirty(stream));
    }

    #[test]
    fn reader_is_single_pass() {
        let mut reader = ByteStream::new(b"abcdef".to_vec());
        let mut head = [0; 4];
        assert_eq!(reader.read(&mut head).unwrap(), 4);
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"ef");
        assert_eq!(reader.read(&mut head).unwrap(), 0);
    }
}
