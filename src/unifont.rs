//! Packed hex glyph codec.
//!
//! Unifont-style glyphs are a hex byte stream: a big-endian bit stream,
//! most significant bit first within each byte, row height fixed at 16.
//! The width follows from the bit count, so a 16-byte glyph is 8 pixels
//! wide and a 32-byte glyph is 16 pixels wide.

use crate::error::DecodeError;
use crate::raster::RasterGlyph;

/// Row height of every hex glyph.
pub const GLYPH_HEIGHT: i32 = 16;

/// Decodes a hex glyph string into a raster.
///
/// Fails on odd-length input or non-hex digits. The caller guarantees the
/// bit count divides evenly into 16 rows.
pub fn decode(hex: &str) -> Result<RasterGlyph, DecodeError> {
    let bytes = parse_hex(hex)?;
    let width = (bytes.len() as i32 * 8) / GLYPH_HEIGHT;
    let mut data = vec![false; (width * GLYPH_HEIGHT) as usize];
    for (i, px) in data.iter_mut().enumerate() {
        *px = (bytes[i / 8] >> (7 - (i % 8))) & 1 == 1;
    }
    Ok(RasterGlyph::from_pixels(width, GLYPH_HEIGHT, data))
}

/// Re-derives the hex string for a raster, row-major MSB-first.
///
/// Inverse of [`decode`] whenever the pixel count is byte-aligned; a
/// trailing partial byte is zero-padded.
pub fn encode(glyph: &RasterGlyph) -> String {
    let mut bytes = vec![0u8; (glyph.width() * glyph.height() + 7) as usize / 8];
    let mut bit = 0usize;
    for y in 0..glyph.height() {
        for x in 0..glyph.width() {
            // In-bounds by construction.
            if glyph.get(x, y).unwrap_or(false) {
                bytes[bit / 8] |= 1 << (7 - (bit % 8));
            }
            bit += 1;
        }
    }
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

fn parse_hex(hex: &str) -> Result<Vec<u8>, DecodeError> {
    let digits: Vec<char> = hex.chars().collect();
    if digits.len() % 2 != 0 {
        return Err(DecodeError::OddLength(digits.len()));
    }
    let nibble = |offset: usize| {
        digits[offset]
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or(DecodeError::InvalidDigit {
                digit: digits[offset],
                offset,
            })
    };
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for i in (0..digits.len()).step_by(2) {
        bytes.push((nibble(i)? << 4) | nibble(i + 1)?);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT_SYMBOL: &str = "000000001C224A565252524E201E0000";
    const EMPTY_SYMBOL: &str = "00000000000000000000000000000000";
    const NUL: &str = "AAAA00018000000180004A51EA505A51C99E0001800000018000000180005555";

    #[test]
    fn decodes_single_width_glyph() {
        let glyph = decode(AT_SYMBOL).unwrap();
        assert_eq!(glyph.width(), 8);
        assert_eq!(glyph.height(), 16);
        assert_eq!(
            glyph.to_string(),
            "--------\n\
             --------\n\
             --------\n\
             --------\n\
             ---###--\n\
             --#---#-\n\
             -#--#-#-\n\
             -#-#-##-\n\
             -#-#--#-\n\
             -#-#--#-\n\
             -#-#--#-\n\
             -#--###-\n\
             --#-----\n\
             ---####-\n\
             --------\n\
             --------\n"
        );
    }

    #[test]
    fn decodes_double_width_glyph() {
        let glyph = decode(NUL).unwrap();
        assert_eq!(glyph.width(), 16);
        assert_eq!(glyph.height(), 16);
        assert_eq!(
            glyph.to_string(),
            "#-#-#-#-#-#-#-#-\n\
             ---------------#\n\
             #---------------\n\
             ---------------#\n\
             #---------------\n\
             -#--#-#--#-#---#\n\
             ###-#-#--#-#----\n\
             -#-##-#--#-#---#\n\
             ##--#--##--####-\n\
             ---------------#\n\
             #---------------\n\
             ---------------#\n\
             #---------------\n\
             ---------------#\n\
             #---------------\n\
             -#-#-#-#-#-#-#-#\n"
        );
    }

    #[test]
    fn blank_glyphs_compare_equal_regardless_of_source() {
        let mut wide = decode(NUL).unwrap();
        let mut narrow = decode(AT_SYMBOL).unwrap();
        assert_ne!(wide, narrow);
        wide.clear();
        narrow.clear();
        // Cleared glyphs of different widths still differ.
        assert_ne!(wide, narrow);
        let blank = decode(EMPTY_SYMBOL).unwrap();
        assert_eq!(narrow, blank);
        assert_ne!(wide, blank);
    }

    #[test]
    fn encode_round_trips() {
        for hex in [AT_SYMBOL, EMPTY_SYMBOL, NUL] {
            assert_eq!(encode(&decode(hex).unwrap()), hex);
        }
    }

    #[test]
    fn pbm_body_of_byte_wide_glyph_is_the_hex_bytes() {
        let glyph = decode(AT_SYMBOL).unwrap();
        let mut expected = b"P4\n8 16\n".to_vec();
        expected.extend_from_slice(&[
            0x00, 0x00, 0x00, 0x00, 0x1C, 0x22, 0x4A, 0x56, 0x52, 0x52, 0x52, 0x4E, 0x20, 0x1E,
            0x00, 0x00,
        ]);
        assert_eq!(glyph.serialize(), expected);
    }

    #[test]
    fn rejects_odd_length() {
        assert_eq!(decode("ABC"), Err(DecodeError::OddLength(3)));
    }

    #[test]
    fn rejects_non_hex_digits() {
        assert_eq!(
            decode("0G"),
            Err(DecodeError::InvalidDigit {
                digit: 'G',
                offset: 1
            })
        );
    }

    #[test]
    fn inversion_flips_every_pixel() {
        let mut glyph = decode(EMPTY_SYMBOL).unwrap();
        glyph.invert();
        assert!(glyph.to_string().chars().all(|c| c == '#' || c == '\n'));
        glyph.invert();
        let blank = decode(EMPTY_SYMBOL).unwrap();
        assert_eq!(glyph, blank);
    }
}
