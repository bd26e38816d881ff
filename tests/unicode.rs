use lopdf_graph::encodings::{PDF_DOC_ENCODING, decode_text_string, encode_text_string};
use lopdf_graph::{Document, Error, PdfName, StringFormat};

#[test]
fn byte_order_mark_selects_utf16() {
    let doc = Document::new();
    let string = doc.new_string(vec![0xFE, 0xFF, 0x00, 0x41]).unwrap();
    assert_eq!(string.as_text().unwrap(), "A");
    assert_eq!(string.as_string_bytes().unwrap(), vec![0xFE, 0xFF, 0x00, 0x41]);

    let surrogates = doc.new_string(vec![0xFE, 0xFF, 0xD8, 0x3D, 0xDE, 0x00]).unwrap();
    assert_eq!(surrogates.as_text().unwrap(), "\u{1F600}");
}

#[test]
fn plain_bytes_are_pdf_doc_encoded() {
    let doc = Document::new();
    assert_eq!(doc.new_string(b"AB".to_vec()).unwrap().as_text().unwrap(), "AB");
    // 0x80 is a bullet, 0xA0 the euro sign and 0xE9 stays Latin-1.
    let string = doc.new_string(vec![0x80, 0xA0, 0xE9]).unwrap();
    assert_eq!(string.as_text().unwrap(), "\u{2022}\u{20AC}\u{E9}");
    // Undefined codes are dropped.
    assert_eq!(decode_text_string(&[0x41, 0x7F, 0x42]), "AB");
    assert_eq!(PDF_DOC_ENCODING[0xAD], None);
}

#[test]
fn utf8_marker_is_accepted() {
    assert_eq!(decode_text_string(b"\xEF\xBB\xBFgr\xC3\xBC\xC3\x9F"), "grüß");
}

#[test]
fn text_round_trips_through_a_dictionary() {
    let doc = Document::new();
    let info = doc.new_dictionary().unwrap();
    for text in ["plain", "caf\u{E9} \u{2014} \u{201C}quoted\u{201D}", "\u{0416}\u{0443}\u{043A}", "", "\u{FE}\u{FF}"] {
        info.set(PdfName::Title, text).unwrap();
        let title = info.get(PdfName::Title).unwrap().unwrap();
        assert_eq!(title.as_text().unwrap(), text);
        let expected = encode_text_string(text);
        assert_eq!(title.as_string_bytes().unwrap(), expected.0);
        assert_eq!(title.string_format().unwrap(), expected.1);
    }
}

#[test]
fn bytes_looking_like_a_marker_are_written_as_utf16() {
    let (bytes, format) = encode_text_string("\u{FE}\u{FF}A");
    assert_eq!(format, StringFormat::Hexadecimal);
    assert_eq!(bytes, [0xFE, 0xFF, 0x00, 0xFE, 0x00, 0xFF, 0x00, 0x41]);
    assert_eq!(decode_text_string(&bytes), "\u{FE}\u{FF}A");
}

#[test]
fn raw_strings_stay_untouched() {
    let doc = Document::new();
    let raw = vec![0x00, 0xFF, 0x10, 0x7F];
    let string = doc.new_string(raw.clone()).unwrap();
    assert_eq!(string.as_string_bytes().unwrap(), raw);
    assert_eq!(string.string_format().unwrap(), StringFormat::Literal);
    assert!(matches!(string.as_name(), Err(Error::ObjectType { expected: "Name", .. })));
}

#[test]
fn names_are_bytes_not_text() {
    let doc = Document::new();
    let name = doc.new_name("A#20B").unwrap();
    assert_eq!(name.as_name().unwrap(), b"A#20B");
    assert_eq!(name.as_name_str().unwrap(), "A#20B");
    assert_eq!(doc.new_name("Type").unwrap(), lopdf_graph::PdfObject::name(PdfName::Type));
    assert!(matches!(doc.new_name(vec![0xFF]).unwrap().as_name_str(), Err(Error::UTF8)));
}
