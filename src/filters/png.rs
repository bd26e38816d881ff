use std::io::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None,
    Sub,
    Up,
    Avg,
    Paeth,
}

impl TryFrom<u8> for FilterType {
    type Error = ();

    fn try_from(n: u8) -> std::result::Result<FilterType, ()> {
        match n {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Avg),
            4 => Ok(FilterType::Paeth),
            _ => Err(()),
        }
    }
}

fn paeth_predict(left: u8, above: u8, upper_left: u8) -> u8 {
    let (a, b, c) = (i16::from(left), i16::from(above), i16::from(upper_left));
    let estimate = a + b - c;
    let (to_left, to_above, to_upper_left) = ((estimate - a).abs(), (estimate - b).abs(), (estimate - c).abs());

    if to_left <= to_above && to_left <= to_upper_left {
        left
    } else if to_above <= to_upper_left {
        above
    } else {
        upper_left
    }
}

/// Undoes the predictor of one row in place. `bpp` is the distance in bytes to
/// the corresponding byte of the previous pixel.
pub fn decode_row(filter: FilterType, bpp: usize, previous: &[u8], current: &mut [u8]) {
    use self::FilterType::*;
    let len = current.len();
    let bpp = bpp.min(len);

    match filter {
        None => (),
        Sub => {
            for i in bpp..len {
                current[i] = current[i].wrapping_add(current[i - bpp]);
            }
        }
        Up => {
            for i in 0..len {
                current[i] = current[i].wrapping_add(previous[i]);
            }
        }
        Avg => {
            for i in 0..bpp {
                current[i] = current[i].wrapping_add(previous[i] / 2);
            }
            for i in bpp..len {
                let average = (u16::from(current[i - bpp]) + u16::from(previous[i])) / 2;
                current[i] = current[i].wrapping_add(average as u8);
            }
        }
        Paeth => {
            for i in 0..bpp {
                current[i] = current[i].wrapping_add(paeth_predict(0, previous[i], 0));
            }
            for i in bpp..len {
                current[i] = current[i].wrapping_add(paeth_predict(current[i - bpp], previous[i], previous[i - bpp]));
            }
        }
    }
}

/// Decodes PNG-predicted data: every row is one filter-type byte followed by
/// `bytes_per_row` bytes. A short final row is decoded as far as it goes.
pub fn decode_frame(content: &[u8], bytes_per_pixel: usize, bytes_per_row: usize) -> Result<Vec<u8>> {
    let chunk_len = bytes_per_row
        .checked_add(1)
        .ok_or_else(|| Error::new(ErrorKind::InvalidData, "predictor row size overflows"))?;
    // No row is longer than the input itself.
    let row_len = bytes_per_row.min(content.len());
    let mut previous = Vec::new();
    previous.try_reserve(row_len)?;
    previous.resize(row_len, 0_u8);
    let mut decoded = Vec::with_capacity(content.len());
    for row in content.chunks(chunk_len) {
        let filter = FilterType::try_from(row[0])
            .map_err(|_| Error::new(ErrorKind::InvalidData, format!("invalid PNG filter type ({})", row[0])))?;
        let mut current = row[1..].to_vec();
        decode_row(filter, bytes_per_pixel, &previous[..current.len()], &mut current);
        decoded.extend_from_slice(&current);
        previous[..current.len()].copy_from_slice(&current);
    }
    Ok(decoded)
}
