//! The class-file flavour of UTF-8 (JVMS §4.4.7).
//!
//! It differs from standard UTF-8 in two ways: U+0000 is written as the
//! overlong pair `C0 80`, and characters outside the BMP are written as a
//! UTF-16 surrogate pair with each half encoded as its own 3-byte group.
//! Text is therefore held as UTF-16 code units, which also lets unpaired
//! surrogates survive a round trip.

use std::{
    char::{decode_utf16, DecodeUtf16Error},
    fmt,
    string::FromUtf16Error,
};

use thiserror::Error;

const ONE_BYTE_MASK: u8 = 0b1000_0000;
const ONE_BYTE_TEST: u8 = 0b0000_0000;

const TWO_BYTE_MASK: u8 = 0b1110_0000;
const TWO_BYTE_TEST: u8 = 0b1100_0000;

const THREE_BYTE_MASK: u8 = 0b1111_0000;
const THREE_BYTE_TEST: u8 = 0b1110_0000;

const CONTINUATION_MASK: u8 = 0b1100_0000;
const CONTINUATION_TEST: u8 = 0b1000_0000;

const SURROGATE_LEAD: u8 = 0b1110_1101;
const HIGH_SURROGATE_TEST: u8 = 0b1010_0000;
const LOW_SURROGATE_TEST: u8 = 0b1011_0000;

const HIGH_SURROGATE_START: u16 = 0xD800;
const LOW_SURROGATE_START: u16 = 0xDC00;
const SURROGATE_MASK: u16 = 0xFC00;
const SUPPLEMENTARY_START: u32 = 0x1_0000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed modified UTF-8 sequence at byte {offset}")]
pub struct MalformedTextError {
    /// Offset of the leading byte of the offending sequence.
    pub offset: usize,
}

/// Text as the class-file format sees it: a sequence of UTF-16 code units.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct JavaString {
    units: Vec<u16>,
}
impl JavaString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_units(units: Vec<u16>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn chars(&self) -> impl Iterator<Item = Result<char, DecodeUtf16Error>> + '_ {
        decode_utf16(self.units.iter().copied())
    }

    /// Fails if the text contains an unpaired surrogate.
    pub fn try_to_string(&self) -> Result<String, FromUtf16Error> {
        String::from_utf16(&self.units)
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }

    fn push_char(&mut self, c: char) {
        let mut buf = [0u16; 2];
        self.units.extend_from_slice(c.encode_utf16(&mut buf));
    }
}
impl From<&str> for JavaString {
    fn from(s: &str) -> Self {
        Self {
            units: s.encode_utf16().collect(),
        }
    }
}
impl PartialEq<str> for JavaString {
    fn eq(&self, other: &str) -> bool {
        self.units.iter().copied().eq(other.encode_utf16())
    }
}
impl PartialEq<&str> for JavaString {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
impl PartialEq<JavaString> for str {
    fn eq(&self, other: &JavaString) -> bool {
        other == self
    }
}
impl PartialEq<JavaString> for &str {
    fn eq(&self, other: &JavaString) -> bool {
        other == *self
    }
}
impl fmt::Display for JavaString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
impl fmt::Debug for JavaString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

/// Decodes modified UTF-8 into UTF-16 code units.
pub fn decode(bytes: &[u8]) -> Result<JavaString, MalformedTextError> {
    let mut out = JavaString {
        units: Vec::with_capacity(bytes.len()),
    };

    let mut i = 0;
    while i < bytes.len() {
        let lead = bytes[i];

        // 0xxx_xxxx, a literal NUL included even though the encoder never emits one
        if lead & ONE_BYTE_MASK == ONE_BYTE_TEST {
            out.units.push(lead as u16);
            i += 1;
        }
        // 110x_xxxx 10xx_xxxx
        else if lead & TWO_BYTE_MASK == TWO_BYTE_TEST {
            let b1 = continuation(bytes, i, 1)?;
            out.units
                .push(((lead as u16 & 0b0001_1111) << 6) | (b1 as u16 & 0b0011_1111));
            i += 2;
        }
        // 1110_xxxx 10xx_xxxx 10xx_xxxx
        else if lead & THREE_BYTE_MASK == THREE_BYTE_TEST {
            if let Some(c) = surrogate_pair_at(bytes, i) {
                out.push_char(c);
                i += 6;
                continue;
            }

            let b1 = continuation(bytes, i, 1)?;
            let b2 = continuation(bytes, i, 2)?;
            out.units.push(
                ((lead as u16 & 0b0000_1111) << 12)
                    | ((b1 as u16 & 0b0011_1111) << 6)
                    | (b2 as u16 & 0b0011_1111),
            );
            i += 3;
        } else {
            return Err(MalformedTextError { offset: i });
        }
    }

    Ok(out)
}

fn continuation(bytes: &[u8], lead: usize, n: usize) -> Result<u8, MalformedTextError> {
    match bytes.get(lead + n) {
        Some(&b) if b & CONTINUATION_MASK == CONTINUATION_TEST => Ok(b),
        _ => Err(MalformedTextError { offset: lead }),
    }
}

// 1110_1101 1010_xxxx 10xx_xxxx 1110_1101 1011_xxxx 10xx_xxxx
fn surrogate_pair_at(bytes: &[u8], i: usize) -> Option<char> {
    let group = bytes.get(i..i + 6)?;
    if group[0] != SURROGATE_LEAD
        || group[1] & 0b1111_0000 != HIGH_SURROGATE_TEST
        || group[2] & CONTINUATION_MASK != CONTINUATION_TEST
        || group[3] != SURROGATE_LEAD
        || group[4] & 0b1111_0000 != LOW_SURROGATE_TEST
        || group[5] & CONTINUATION_MASK != CONTINUATION_TEST
    {
        return None;
    }

    let high = ((group[1] as u32 & 0b0000_1111) << 6) | (group[2] as u32 & 0b0011_1111);
    let low = ((group[4] as u32 & 0b0000_1111) << 6) | (group[5] as u32 & 0b0011_1111);

    char::from_u32(SUPPLEMENTARY_START + ((high << 10) | low))
}

/// Encodes UTF-16 code units as modified UTF-8.
pub fn encode(units: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(units.len());

    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        match units.get(i + 1) {
            Some(&next) if is_high_surrogate(unit) && is_low_surrogate(next) => {
                let code_point = SUPPLEMENTARY_START
                    + (((unit - HIGH_SURROGATE_START) as u32) << 10)
                    + (next - LOW_SURROGATE_START) as u32;
                encode_supplementary(code_point, &mut out);
                i += 2;
            }
            _ => {
                encode_unit(unit, &mut out);
                i += 1;
            }
        }
    }

    out
}

pub fn encode_str(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        if c as u32 >= SUPPLEMENTARY_START {
            encode_supplementary(c as u32, &mut out);
        } else {
            encode_unit(c as u16, &mut out);
        }
    }
    out
}

fn encode_supplementary(code_point: u32, out: &mut Vec<u8>) {
    let offset = code_point - SUPPLEMENTARY_START;
    let high = HIGH_SURROGATE_START + (offset >> 10) as u16;
    let low = LOW_SURROGATE_START + (offset & 0x3FF) as u16;

    out.extend_from_slice(&[
        SURROGATE_LEAD,
        HIGH_SURROGATE_TEST | ((high >> 6) & 0b1111) as u8,
        CONTINUATION_TEST | (high & 0b11_1111) as u8,
        SURROGATE_LEAD,
        LOW_SURROGATE_TEST | ((low >> 6) & 0b1111) as u8,
        CONTINUATION_TEST | (low & 0b11_1111) as u8,
    ]);
}

fn encode_unit(unit: u16, out: &mut Vec<u8>) {
    match unit {
        0x0001..=0x007F => out.push(unit as u8),
        // NUL shares the 2-byte form
        0x0000..=0x07FF => out.extend_from_slice(&[
            TWO_BYTE_TEST | (unit >> 6) as u8,
            CONTINUATION_TEST | (unit & 0b11_1111) as u8,
        ]),
        _ => out.extend_from_slice(&[
            THREE_BYTE_TEST | (unit >> 12) as u8,
            CONTINUATION_TEST | ((unit >> 6) & 0b11_1111) as u8,
            CONTINUATION_TEST | (unit & 0b11_1111) as u8,
        ]),
    }
}

fn is_high_surrogate(unit: u16) -> bool {
    unit & SURROGATE_MASK == HIGH_SURROGATE_START
}

fn is_low_surrogate(unit: u16) -> bool {
    unit & SURROGATE_MASK == LOW_SURROGATE_START
}


#[cfg(test)]
mod decode_tests {
    use super::*;

    #[test]
    fn it_should_decode_the_empty_string() {
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn it_should_decode_a_surrogate_pair_into_one_character() {
        let s = decode(&[0xed, 0xa0, 0x80, 0xed, 0xbd, 0x88]).unwrap();

        assert_eq!(s, "𐍈");
        assert_eq!(s.chars().collect::<Vec<_>>(), vec![Ok('𐍈')]);
    }

    #[test]
    fn it_should_accept_an_unpaired_high_surrogate() {
        let s = decode(&[0xed, 0xa0, 0x80, 0x61]).unwrap();

        assert_eq!(s.units(), &[0xd800, 0x61]);
        assert!(s.try_to_string().is_err());
        assert_eq!(s.to_string_lossy(), "\u{fffd}a");
    }

    #[test]
    fn it_should_accept_a_low_surrogate_before_a_high_one() {
        let s = decode(&[0xed, 0xb0, 0x80, 0xed, 0xa0, 0x80]).unwrap();

        assert_eq!(s.units(), &[0xdc00, 0xd800]);
    }

    #[test]
    fn it_should_decode_overlong_nul() {
        assert_eq!(decode(&[0xc0, 0x80]).unwrap().units(), &[0]);
    }

    #[test]
    fn it_should_decode_a_literal_nul() {
        assert_eq!(decode(&[0x61, 0x00]).unwrap().units(), &[0x61, 0x00]);
        assert_eq!(decode(&[0x61, 0x00, 0x62]).unwrap(), "a\0b");
        assert_eq!(encode(&[0x61, 0x00]), vec![0x61, 0xc0, 0x80]);
    }

    #[test]
    fn it_should_reject_a_truncated_sequence() {
        assert_eq!(decode(&[0xc3]), Err(MalformedTextError { offset: 0 }));
        assert_eq!(
            decode(&[0x61, 0xe2, 0x82]),
            Err(MalformedTextError { offset: 1 })
        );
    }

    #[test]
    fn it_should_reject_a_bad_continuation_byte() {
        assert_eq!(decode(&[0xc2, 0x41]), Err(MalformedTextError { offset: 0 }));
    }

    #[test]
    fn it_should_reject_stray_and_four_byte_leads() {
        assert_eq!(decode(&[0x80]), Err(MalformedTextError { offset: 0 }));
        assert_eq!(
            decode(&[0xf0, 0x90, 0x8d, 0x88]),
            Err(MalformedTextError { offset: 0 })
        );
    }
}
