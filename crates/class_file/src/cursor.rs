use byteorder::{BigEndian, ByteOrder};

use crate::{ClassFileError, Result};

type Endian = BigEndian;

/// Forward-only big-endian reader over a borrowed buffer.
///
/// A failed read leaves the position untouched, but callers are expected to
/// abort rather than retry.
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}
impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(ClassFileError::UnexpectedEndOfInput {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }

        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads a `u16` length followed by that many bytes of encoded text.
    pub fn read_text_blob(&mut self) -> Result<&'a [u8]> {
        let length = self.read_u16()?;
        self.read_bytes(length as usize)
    }

    pub fn read_u16_list(&mut self, count: u16) -> Result<Vec<u16>> {
        let bytes = self.read_bytes(count as usize * 2)?;
        let mut values = vec![0u16; count as usize];
        Endian::read_u16_into(bytes, &mut values);
        Ok(values)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(Endian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(Endian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(Endian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(Endian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(Endian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(Endian::read_i64(self.read_bytes(8)?))
    }

    // IEEE 754 single, bit-for-bit (NaN payloads and infinities included).
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(Endian::read_f32(self.read_bytes(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(Endian::read_f64(self.read_bytes(8)?))
    }
}


#[cfg(test)]
mod read_float_tests {
    use super::*;

    #[test]
    fn it_should_read_a_float() {
        let mut cursor = ByteCursor::new(&[0x3f, 0xc0, 0x00, 0x00]);

        assert_eq!(cursor.read_f32().unwrap(), 1.5);
    }

    #[test]
    fn it_should_read_infinities_and_nan() {
        let mut cursor = ByteCursor::new(&[
            0x7f, 0x80, 0x00, 0x00, 0xff, 0x80, 0x00, 0x00, 0x7f, 0xc0, 0x00, 0x00,
        ]);

        assert_eq!(cursor.read_f32().unwrap(), f32::INFINITY);
        assert_eq!(cursor.read_f32().unwrap(), f32::NEG_INFINITY);
        assert!(cursor.read_f32().unwrap().is_nan());
    }

    #[test]
    fn it_should_read_a_double() {
        let mut cursor = ByteCursor::new(&[0xc0, 0x09, 0x21, 0xfb, 0x54, 0x44, 0x2d, 0x18]);

        assert_eq!(cursor.read_f64().unwrap(), -std::f64::consts::PI);
    }
}
