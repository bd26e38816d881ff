//! Stream filter decoding.

pub mod png;

use std::io::{self, Read};

use flate2::read::ZlibDecoder;
use log::warn;
use weezl::BitOrder;
use weezl::decode::Decoder as LzwDecoder;

use crate::error::DecompressError;
use crate::{Error, Result};

/// Values from a stream's `/DecodeParms` entry for one filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    pub predictor: i64,
    pub colors: i64,
    pub bits_per_component: i64,
    pub columns: i64,
    /// `/EarlyChange`, LZW only.
    pub early_change: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        DecodeParams {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
            early_change: true,
        }
    }
}

/// Decodes one stream filter. A document is created with a codec; the default
/// is [`StandardFilters`].
pub trait FilterCodec {
    /// Undo `filter` (a filter name such as `FlateDecode`) on `input`.
    fn decode(&self, filter: &[u8], input: &[u8], params: &DecodeParams) -> Result<Vec<u8>>;
}

/// `FlateDecode`, `LZWDecode` and `ASCIIHexDecode`, with PNG predictors.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFilters;

impl FilterCodec for StandardFilters {
    fn decode(&self, filter: &[u8], input: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
        match filter {
            b"FlateDecode" | b"Fl" => decompress_predictor(decompress_zlib(input), params),
            b"LZWDecode" | b"LZW" => decompress_predictor(decompress_lzw(input, params)?, params),
            b"ASCIIHexDecode" | b"AHx" => decode_ascii_hex(input),
            _ => Err(Error::UnsupportedFilter(String::from_utf8_lossy(filter).into_owned())),
        }
    }
}

/// Corrupt data is common; whatever was inflated before the error is kept.
fn decompress_zlib(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() * 2);
    if !input.is_empty() {
        let mut decoder = ZlibDecoder::new(input);
        decoder.read_to_end(&mut output).unwrap_or_else(|err| {
            warn!("{}", err);
            0
        });
    }
    output
}

fn decompress_lzw(input: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    const MIN_BITS: u8 = 8;
    let mut decoder = if params.early_change {
        LzwDecoder::with_tiff_size_switch(BitOrder::Msb, MIN_BITS)
    } else {
        LzwDecoder::new(BitOrder::Msb, MIN_BITS)
    };
    decoder
        .decode(input)
        .map_err(|err| Error::Decompress(DecompressError::Lzw(err)))
}

fn decompress_predictor(data: Vec<u8>, params: &DecodeParams) -> Result<Vec<u8>> {
    if !(10..=15).contains(&params.predictor) {
        return Ok(data);
    }
    let overflow = || {
        Error::Decompress(DecompressError::Predictor(io::Error::new(
            io::ErrorKind::InvalidData,
            "predictor row size overflows",
        )))
    };
    let colors = usize::try_from(params.colors.max(1)).map_err(|_| overflow())?;
    let bits = usize::try_from(params.bits_per_component.max(1)).map_err(|_| overflow())?;
    let columns = usize::try_from(params.columns.max(1)).map_err(|_| overflow())?;
    let bits_per_pixel = colors.checked_mul(bits).ok_or_else(overflow)?;
    let bits_per_row = bits_per_pixel.checked_mul(columns).ok_or_else(overflow)?;
    png::decode_frame(&data, bits_per_pixel.div_ceil(8), bits_per_row.div_ceil(8))
        .map_err(|err| Error::Decompress(DecompressError::Predictor(err)))
}

fn decode_ascii_hex(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() / 2);
    let mut high = None;
    for &byte in input {
        let digit = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            b'>' => break,
            byte if byte.is_ascii_whitespace() || byte == 0 => continue,
            byte => return Err(Error::Decompress(DecompressError::AsciiHex(byte))),
        };
        match high.take() {
            Some(high) => output.push(high << 4 | digit),
            None => high = Some(digit),
        }
    }
    // An odd final digit is followed by an implicit zero.
    if let Some(high) = high {
        output.push(high << 4);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::*;

    #[test]
    fn flate_round_trip() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"q 1 0 0 1 0 0 cm Q").unwrap();
        let compressed = encoder.finish().unwrap();
        let decoded = StandardFilters
            .decode(b"FlateDecode", &compressed, &DecodeParams::default())
            .unwrap();
        assert_eq!(decoded, b"q 1 0 0 1 0 0 cm Q");
    }

    #[test]
    fn truncated_flate_keeps_partial_output() {
        let data = vec![b'x'; 4096];
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data).unwrap();
        let compressed = encoder.finish().unwrap();
        let decoded = decompress_zlib(&compressed[..compressed.len() - 4]);
        assert!(decoded.len() <= data.len());
    }

    #[test]
    fn lzw_with_early_change() {
        let mut encoder = weezl::encode::Encoder::with_tiff_size_switch(BitOrder::Msb, 8);
        let compressed = encoder.encode(b"-----A---B").unwrap();
        let decoded = StandardFilters
            .decode(b"LZWDecode", &compressed, &DecodeParams::default())
            .unwrap();
        assert_eq!(decoded, b"-----A---B");
    }

    #[test]
    fn ascii_hex() {
        assert_eq!(decode_ascii_hex(b"48 65 6c6C 6F>").unwrap(), b"Hello");
        assert_eq!(decode_ascii_hex(b"7").unwrap(), vec![0x70]);
        assert!(decode_ascii_hex(b"4G").is_err());
    }

    #[test]
    fn png_up_predictor() {
        let params = DecodeParams {
            predictor: 12,
            columns: 2,
            ..DecodeParams::default()
        };
        let data = vec![2, 1, 2, 2, 1, 1];
        assert_eq!(decompress_predictor(data, &params).unwrap(), vec![1, 2, 2, 3]);
    }

    #[test]
    fn predictor_row_size_overflow() {
        let params = DecodeParams {
            predictor: 12,
            colors: 4,
            columns: i64::MAX / 4,
            ..DecodeParams::default()
        };
        let err = decompress_predictor(vec![2, 1, 2], &params).unwrap_err();
        assert!(matches!(err, Error::Decompress(DecompressError::Predictor(_))));
    }

    #[test]
    fn oversized_columns_decode_the_short_row() {
        let params = DecodeParams {
            predictor: 12,
            columns: 1 << 40,
            ..DecodeParams::default()
        };
        assert_eq!(decompress_predictor(vec![2, 1, 2], &params).unwrap(), vec![1, 2]);
    }

    #[test]
    fn unknown_filter() {
        let err = StandardFilters
            .decode(b"DCTDecode", b"", &DecodeParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFilter(name) if name == "DCTDecode"));
    }
}
