//! Fixed table of well-known PDF names.
//!
//! Every predefined name is an interned singleton: it never lives in a document
//! store and two occurrences compare by tag. The table is kept in byte-wise sorted
//! order so that spelling lookups can use a binary search and so that the tag order
//! agrees with the canonical dictionary key order.

use std::fmt;

macro_rules! predefined_names {
    ($( $variant:ident => $spelling:expr, )+) => {
        /// A predefined PDF name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum PdfName {
            $( $variant, )+
        }

        const NAME_TABLE: &[(PdfName, &[u8])] = &[
            $( (PdfName::$variant, $spelling), )+
        ];
    };
}

predefined_names! {
    A => b"A",
    AA => b"AA",
    AP => b"AP",
    AS => b"AS",
    AcroForm => b"AcroForm",
    ActualText => b"ActualText",
    Alternate => b"Alternate",
    Annot => b"Annot",
    Annots => b"Annots",
    Ascent => b"Ascent",
    Author => b"Author",
    BBox => b"BBox",
    BaseEncoding => b"BaseEncoding",
    BaseFont => b"BaseFont",
    BitsPerComponent => b"BitsPerComponent",
    BlackIs1 => b"BlackIs1",
    Border => b"Border",
    Bounds => b"Bounds",
    C => b"C",
    CA => b"CA",
    CF => b"CF",
    CIDSystemInfo => b"CIDSystemInfo",
    CIDToGIDMap => b"CIDToGIDMap",
    CS => b"CS",
    CapHeight => b"CapHeight",
    Catalog => b"Catalog",
    ColorSpace => b"ColorSpace",
    Colors => b"Colors",
    Columns => b"Columns",
    Contents => b"Contents",
    Count => b"Count",
    CreationDate => b"CreationDate",
    Creator => b"Creator",
    CropBox => b"CropBox",
    D => b"D",
    DA => b"DA",
    DCTDecode => b"DCTDecode",
    DL => b"DL",
    DP => b"DP",
    DR => b"DR",
    DV => b"DV",
    Decode => b"Decode",
    DecodeParms => b"DecodeParms",
    DescendantFonts => b"DescendantFonts",
    Descent => b"Descent",
    Dest => b"Dest",
    Dests => b"Dests",
    Differences => b"Differences",
    Domain => b"Domain",
    EarlyChange => b"EarlyChange",
    EmbeddedFiles => b"EmbeddedFiles",
    Encoding => b"Encoding",
    Encrypt => b"Encrypt",
    ExtGState => b"ExtGState",
    Extends => b"Extends",
    F => b"F",
    FT => b"FT",
    Ff => b"Ff",
    Fields => b"Fields",
    Filter => b"Filter",
    First => b"First",
    FirstChar => b"FirstChar",
    Flags => b"Flags",
    FlateDecode => b"FlateDecode",
    Font => b"Font",
    FontBBox => b"FontBBox",
    FontDescriptor => b"FontDescriptor",
    FontFile => b"FontFile",
    FontFile2 => b"FontFile2",
    FontFile3 => b"FontFile3",
    FontMatrix => b"FontMatrix",
    FontName => b"FontName",
    Form => b"Form",
    Functions => b"Functions",
    H => b"H",
    Height => b"Height",
    I => b"I",
    ID => b"ID",
    Identity => b"Identity",
    ImageMask => b"ImageMask",
    Index => b"Index",
    Info => b"Info",
    Interpolate => b"Interpolate",
    JBIG2Decode => b"JBIG2Decode",
    JPXDecode => b"JPXDecode",
    K => b"K",
    Keywords => b"Keywords",
    Kids => b"Kids",
    L => b"L",
    LZWDecode => b"LZWDecode",
    Last => b"Last",
    LastChar => b"LastChar",
    Length => b"Length",
    Length1 => b"Length1",
    Length2 => b"Length2",
    Length3 => b"Length3",
    Limits => b"Limits",
    Linearized => b"Linearized",
    M => b"M",
    Mask => b"Mask",
    Matrix => b"Matrix",
    MaxWidth => b"MaxWidth",
    MediaBox => b"MediaBox",
    Metadata => b"Metadata",
    ModDate => b"ModDate",
    N => b"N",
    Name => b"Name",
    Names => b"Names",
    Next => b"Next",
    Nums => b"Nums",
    O => b"O",
    OCProperties => b"OCProperties",
    Obj => b"Obj",
    ObjStm => b"ObjStm",
    OpenAction => b"OpenAction",
    Ordering => b"Ordering",
    Outlines => b"Outlines",
    P => b"P",
    Page => b"Page",
    Pages => b"Pages",
    Parent => b"Parent",
    Pattern => b"Pattern",
    Perms => b"Perms",
    Predictor => b"Predictor",
    Prev => b"Prev",
    Producer => b"Producer",
    Properties => b"Properties",
    Q => b"Q",
    R => b"R",
    Range => b"Range",
    Rect => b"Rect",
    Registry => b"Registry",
    Resources => b"Resources",
    Root => b"Root",
    Rotate => b"Rotate",
    S => b"S",
    SMask => b"SMask",
    Shading => b"Shading",
    Size => b"Size",
    Subject => b"Subject",
    Subtype => b"Subtype",
    Supplement => b"Supplement",
    T => b"T",
    TU => b"TU",
    Title => b"Title",
    ToUnicode => b"ToUnicode",
    Trapped => b"Trapped",
    TrimBox => b"TrimBox",
    Type => b"Type",
    U => b"U",
    UF => b"UF",
    URI => b"URI",
    V => b"V",
    W => b"W",
    W2 => b"W2",
    Width => b"Width",
    Widths => b"Widths",
    X => b"X",
    XObject => b"XObject",
    XRef => b"XRef",
    XRefStm => b"XRefStm",
    XStep => b"XStep",
    YStep => b"YStep",
}

impl PdfName {
    /// Number of predefined names.
    pub const COUNT: usize = NAME_TABLE.len();

    /// Exact spelling of the name, without the leading slash.
    pub fn as_bytes(self) -> &'static [u8] {
        NAME_TABLE[self as usize].1
    }

    pub fn as_str(self) -> &'static str {
        // Every spelling in the table is ASCII.
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    /// Looks up the predefined name spelled `name`.
    pub fn from_bytes(name: &[u8]) -> Option<PdfName> {
        NAME_TABLE
            .binary_search_by(|(_, spelling)| spelling.cmp(&name))
            .ok()
            .map(|index| NAME_TABLE[index].0)
    }

    pub fn iter() -> impl Iterator<Item = PdfName> {
        NAME_TABLE.iter().map(|(name, _)| *name)
    }
}

impl fmt::Display for PdfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_indexed_by_tag() {
        for (index, (name, _)) in NAME_TABLE.iter().enumerate() {
            assert_eq!(*name as usize, index);
        }
        assert!(NAME_TABLE.windows(2).all(|pair| pair[0].1 < pair[1].1));
    }

    #[test]
    fn lookup_by_spelling() {
        assert_eq!(PdfName::from_bytes(b"Type"), Some(PdfName::Type));
        assert_eq!(PdfName::from_bytes(b"DecodeParms"), Some(PdfName::DecodeParms));
        assert_eq!(PdfName::from_bytes(b"type"), None);
        assert_eq!(PdfName::from_bytes(b"NotAName"), None);
        assert_eq!(PdfName::Length.as_bytes(), b"Length");
        assert_eq!(PdfName::Filter.to_string(), "/Filter");
    }

    #[test]
    fn tag_order_matches_spelling_order() {
        assert!(PdfName::Length < PdfName::Type);
        assert!(PdfName::Type < PdfName::Width);
    }
}
