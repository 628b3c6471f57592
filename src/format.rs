//! Pixel-format flag table.
//!
//! The 16-bit flags field of a TEXB header packs three things:
//!
//! ```text
//! bit  0..=2  format code
//! bit  3      payload is zlib-framed DEFLATE
//! bit  6..=7  format class (of the low byte)
//! ```
//!
//! Only the bytes-per-pixel derivation matters here; the pixel content itself
//! is never interpreted.

use std::fmt;

/// Packed pixel-format flags as stored in the container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFlags(pub u16);

impl PixelFlags {
    /// Bit 3: payload is compressed.
    pub const COMPRESSED: u16 = 1 << 3;

    #[inline]
    pub fn bits(self) -> u16 { self.0 }

    /// Low three bits.
    #[inline]
    pub fn code(self) -> u8 { (self.0 & 0x7) as u8 }

    /// Bits 6..=7 of the low byte.
    #[inline]
    pub fn class(self) -> u8 { (self.0 as u8) >> 6 }

    #[inline]
    pub fn is_compressed(self) -> bool { self.0 & Self::COMPRESSED != 0 }

    /// Same flags with the compressed bit set. Idempotent.
    #[inline]
    pub fn with_compressed(self) -> Self { Self(self.0 | Self::COMPRESSED) }

    /// Bytes per pixel for this format.
    ///
    /// Classes 0, 1 and 2 are 16-bit formats. Class 3 stores the byte count
    /// directly in the format code, except that code 0 means one byte. A
    /// return of 0 marks a format this table does not know.
    pub fn bytes_per_pixel(self) -> u8 {
        match self.class() {
            0..=2 => 2,
            3 => match self.code() {
                0 => 1,
                n => n,
            },
            _ => 0,
        }
    }

    /// Expected raw payload length for a `width` x `height` image, or `None`
    /// if the format is unknown or the product overflows `usize`.
    pub fn payload_len(self, width: u16, height: u16) -> Option<usize> {
        match self.bytes_per_pixel() {
            0 => None,
            bpp => (width as usize)
                .checked_mul(height as usize)?
                .checked_mul(bpp as usize),
        }
    }
}

impl fmt::Display for PixelFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_bit_classes() {
        for class in 0..3u16 {
            for code in 0..8u16 {
                assert_eq!(PixelFlags((class << 6) | code).bytes_per_pixel(), 2);
            }
        }
    }

    #[test]
    fn class_three_uses_code_as_byte_count() {
        assert_eq!(PixelFlags(0xC0).bytes_per_pixel(), 1);
        for code in 1..8u16 {
            assert_eq!(PixelFlags(0xC0 | code).bytes_per_pixel(), code as u8);
        }
    }

    #[test]
    fn compressed_bit_and_high_byte_do_not_affect_bpp() {
        assert_eq!(PixelFlags(0xC4).bytes_per_pixel(), 4);
        assert_eq!(PixelFlags(0xC4 | PixelFlags::COMPRESSED).bytes_per_pixel(), 4);
        assert_eq!(PixelFlags(0xFF00 | 0xC4).bytes_per_pixel(), 4);
        assert_eq!(PixelFlags(0x0100).bytes_per_pixel(), 2);
    }

    #[test]
    fn with_compressed_is_idempotent() {
        let f = PixelFlags(0xC4);
        assert!(!f.is_compressed());
        assert_eq!(f.with_compressed(), PixelFlags(0xCC));
        assert_eq!(f.with_compressed().with_compressed(), PixelFlags(0xCC));
    }

    #[test]
    fn payload_len() {
        assert_eq!(PixelFlags(0).payload_len(2, 2), Some(8));
        assert_eq!(PixelFlags(0xC4).payload_len(64, 64), Some(64 * 64 * 4));
        assert_eq!(PixelFlags(0xC0).payload_len(0, 10), Some(0));
    }
}
