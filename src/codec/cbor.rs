//! Minimal definite-length CBOR writer (RFC 8949).
//!
//! Only the subset needed for COSE structures and Cardano transaction
//! bodies: unsigned/negative integers, byte and text strings, arrays, maps,
//! booleans and null. Callers are responsible for canonical map ordering.

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;

const SIMPLE_FALSE: u8 = 0xf4;
const SIMPLE_TRUE: u8 = 0xf5;
const SIMPLE_NULL: u8 = 0xf6;

/// Append-only CBOR encoder.
#[derive(Debug, Default, Clone)]
pub struct CborWriter {
    buf: Vec<u8>,
}

impl CborWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn head(&mut self, major: u8, value: u64) -> &mut Self {
        let m = major << 5;
        match value {
            0..=23 => self.buf.push(m | value as u8),
            24..=0xff => {
                self.buf.push(m | 24);
                self.buf.push(value as u8);
            }
            0x100..=0xffff => {
                self.buf.push(m | 25);
                self.buf.extend_from_slice(&(value as u16).to_be_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.buf.push(m | 26);
                self.buf.extend_from_slice(&(value as u32).to_be_bytes());
            }
            _ => {
                self.buf.push(m | 27);
                self.buf.extend_from_slice(&value.to_be_bytes());
            }
        }
        self
    }

    pub fn unsigned(&mut self, value: u64) -> &mut Self {
        self.head(MAJOR_UNSIGNED, value)
    }

    /// Signed integer; negative values use major type 1 (`-1 - n`).
    pub fn int(&mut self, value: i64) -> &mut Self {
        if value >= 0 {
            self.head(MAJOR_UNSIGNED, value as u64)
        } else {
            self.head(MAJOR_NEGATIVE, (-1 - value) as u64)
        }
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.head(MAJOR_BYTES, data.len() as u64);
        self.buf.extend_from_slice(data);
        self
    }

    pub fn text(&mut self, s: &str) -> &mut Self {
        self.head(MAJOR_TEXT, s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn array(&mut self, len: usize) -> &mut Self {
        self.head(MAJOR_ARRAY, len as u64)
    }

    pub fn map(&mut self, len: usize) -> &mut Self {
        self.head(MAJOR_MAP, len as u64)
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.buf.push(if value { SIMPLE_TRUE } else { SIMPLE_FALSE });
        self
    }

    pub fn null(&mut self) -> &mut Self {
        self.buf.push(SIMPLE_NULL);
        self
    }

    /// Splice already-encoded CBOR in place.
    pub fn raw(&mut self, encoded: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(encoded);
        self
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
