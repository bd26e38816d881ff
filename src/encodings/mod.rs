mod pdf_doc;

use encoding_rs::UTF_16BE;

use crate::object::StringFormat;

pub use self::pdf_doc::PDF_DOC_ENCODING;

/// Unicode code point of every byte of a one-byte encoding, `None` where undefined.
pub type ByteToGlyphMap = [Option<u16>; 256];

const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Undefined bytes are dropped.
pub fn bytes_to_string(encoding: &ByteToGlyphMap, bytes: &[u8]) -> String {
    let code_points = bytes
        .iter()
        .filter_map(|&byte| encoding[byte as usize])
        .collect::<Vec<u16>>();
    String::from_utf16_lossy(&code_points)
}

/// Characters without a byte in `encoding` are dropped.
pub fn string_to_bytes(encoding: &ByteToGlyphMap, text: &str) -> Vec<u8> {
    text.encode_utf16()
        .filter_map(|ch| encoding_byte(encoding, ch))
        .collect()
}

fn encoding_byte(encoding: &ByteToGlyphMap, ch: u16) -> Option<u8> {
    encoding
        .iter()
        .position(|&code| code == Some(ch))
        .map(|byte| byte as u8)
}

/// Decodes the bytes of a PDF text string.
///
/// A `FE FF` byte order mark selects UTF-16BE and `EF BB BF` selects UTF-8;
/// anything else is PDFDocEncoding.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&UTF16_BE_BOM) {
        let (text, _) = UTF_16BE.decode_without_bom_handling(utf16);
        return text.into_owned();
    }
    if let Some(utf8) = bytes.strip_prefix(&UTF8_BOM) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes_to_string(&PDF_DOC_ENCODING, bytes)
}

/// Encodes `text` as a PDF text string: PDFDocEncoding when every character
/// has a byte there, UTF-16BE otherwise.
pub fn encode_text_string(text: &str) -> (Vec<u8>, StringFormat) {
    let representable = text
        .encode_utf16()
        .all(|ch| encoding_byte(&PDF_DOC_ENCODING, ch).is_some());
    if representable {
        let bytes = string_to_bytes(&PDF_DOC_ENCODING, text);
        // "þÿ" would read back as a byte order mark.
        if !bytes.starts_with(&UTF16_BE_BOM) && !bytes.starts_with(&UTF8_BOM) {
            return (bytes, StringFormat::Literal);
        }
    }
    (encode_utf16_be(text), StringFormat::Hexadecimal)
}

/// UTF-16BE with a leading byte order mark.
pub fn encode_utf16_be(text: &str) -> Vec<u8> {
    let mut bytes = UTF16_BE_BOM.to_vec();
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    bytes
}
