use super::ByteToGlyphMap;

/// PDFDocEncoding (ISO 32000-1, Annex D). Bytes 0x7F, 0x9F and 0xAD are undefined.
pub const PDF_DOC_ENCODING: ByteToGlyphMap = pdf_doc_encoding();

/// Code points that differ from Latin-1, starting at 0x18 and 0x80.
const DIACRITICS: [u16; 8] = [0x02D8, 0x02C7, 0x02C6, 0x02D9, 0x02DD, 0x02DB, 0x02DA, 0x02DC];
const PUNCTUATION: [u16; 31] = [
    0x2022, 0x2020, 0x2021, 0x2026, 0x2014, 0x2013, 0x0192, 0x2044, 0x2039, 0x203A, 0x2212, 0x2030, 0x201E, 0x201C,
    0x201D, 0x2018, 0x2019, 0x201A, 0x2122, 0xFB01, 0xFB02, 0x0141, 0x0152, 0x0160, 0x0178, 0x017D, 0x0131, 0x0142,
    0x0153, 0x0161, 0x017E,
];

const fn pdf_doc_encoding() -> ByteToGlyphMap {
    let mut map = [None; 256];
    let mut byte = 0;
    while byte < 256 {
        map[byte] = Some(byte as u16);
        byte += 1;
    }
    let mut i = 0;
    while i < DIACRITICS.len() {
        map[0x18 + i] = Some(DIACRITICS[i]);
        i += 1;
    }
    let mut i = 0;
    while i < PUNCTUATION.len() {
        map[0x80 + i] = Some(PUNCTUATION[i]);
        i += 1;
    }
    map[0x7F] = None;
    map[0x9F] = None;
    map[0xA0] = Some(0x20AC);
    map[0xAD] = None;
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_landmarks() {
        assert_eq!(PDF_DOC_ENCODING[b'A' as usize], Some(0x41));
        assert_eq!(PDF_DOC_ENCODING[0x16], Some(0x16));
        assert_eq!(PDF_DOC_ENCODING[0x18], Some(0x02D8));
        assert_eq!(PDF_DOC_ENCODING[0x80], Some(0x2022));
        assert_eq!(PDF_DOC_ENCODING[0x9E], Some(0x017E));
        assert_eq!(PDF_DOC_ENCODING[0xA0], Some(0x20AC));
        assert_eq!(PDF_DOC_ENCODING[0xE9], Some(0xE9));
        for undefined in [0x7F, 0x9F, 0xAD] {
            assert_eq!(PDF_DOC_ENCODING[undefined], None);
        }
    }
}
