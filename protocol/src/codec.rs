use std::collections::{BTreeSet, HashMap};

use crate::error::DecodeError;

/// Anything [`Decode`] can pull fixed-size chunks of bytes from.
///
/// There are two implementations: [`SliceSource`], which decodes an
/// already-buffered datagram (the UDP path, where the whole message must
/// already be in memory) and `crate::framing::StreamSource`, which pulls
/// bytes directly off a TCP stream on demand. A single `Decode` impl per
/// message type works unmodified against either one.
pub trait ByteSource {
    type Error: From<DecodeError>;

    fn read_u8(&mut self) -> Result<u8, Self::Error>;
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, Self::Error>;
}

/// An in-memory cursor over a fully-received buffer (one UDP datagram).
pub struct SliceSource<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes left unconsumed; a nonzero value after a full decode is the
    /// `too-long` condition.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

impl<'a> ByteSource for SliceSource<'a> {
    type Error = DecodeError;

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.buf.get(self.pos).ok_or(DecodeError::TooShort)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DecodeError> {
        let end = self.pos.checked_add(n).ok_or(DecodeError::TooShort)?;
        let chunk = self.buf.get(self.pos..end).ok_or(DecodeError::TooShort)?;
        self.pos = end;
        Ok(chunk.to_vec())
    }
}

/// Values that can be appended to the wire as a sequence of bytes.
pub trait Encode {
    fn encode(&self, out: &mut Vec<u8>);
}

/// Values that can be read back off a [`ByteSource`].
pub trait Decode: Sized {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error>;
}

/// Sequences longer than this are rejected as `length-overflow` before any
/// allocation is attempted, so a corrupt or hostile length prefix can't
/// drive an unbounded allocation.
const MAX_SEQUENCE_LEN: u32 = 1_000_000;
/// Strings longer than this don't fit the 1-byte length prefix; callers are
/// expected to keep names within this bound, but encode truncates instead
/// of panicking if one slips through.
const MAX_STRING_LEN: usize = 255;

impl Encode for u8 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }
}

impl Decode for u8 {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        src.read_u8()
    }
}

macro_rules! impl_be_int {
    ($ty:ty, $width:expr) => {
        impl Encode for $ty {
            fn encode(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_be_bytes());
            }
        }

        impl Decode for $ty {
            fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
                let bytes = src.read_bytes($width)?;
                let mut arr = [0u8; $width];
                arr.copy_from_slice(&bytes);
                Ok(<$ty>::from_be_bytes(arr))
            }
        }
    };
}

impl_be_int!(u16, 2);
impl_be_int!(u32, 4);
impl_be_int!(u64, 8);

impl Encode for String {
    fn encode(&self, out: &mut Vec<u8>) {
        let mut bytes = self.as_bytes();
        if bytes.len() > MAX_STRING_LEN {
            let mut cut = MAX_STRING_LEN;
            while !self.is_char_boundary(cut) {
                cut -= 1;
            }
            bytes = &bytes[..cut];
        }
        (bytes.len() as u8).encode(out);
        out.extend_from_slice(bytes);
    }
}

impl Decode for String {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let len = u8::decode(src)? as usize;
        let bytes = src.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| DecodeError::Utf8.into())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        (self.len() as u32).encode(out);
        for item in self {
            item.encode(out);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let count = u32::decode(src)?;
        if count > MAX_SEQUENCE_LEN {
            return Err(DecodeError::LengthOverflow(count).into());
        }
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(T::decode(src)?);
        }
        Ok(items)
    }
}

/// Sets are framed identically to sequences (§4.1): ascending order on
/// encode (guaranteed here since the backing store is a `BTreeSet`), any
/// order tolerated on decode, duplicates merged rather than rejected.
impl<T: Encode + Ord> Encode for BTreeSet<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        (self.len() as u32).encode(out);
        for item in self {
            item.encode(out);
        }
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let count = u32::decode(src)?;
        if count > MAX_SEQUENCE_LEN {
            return Err(DecodeError::LengthOverflow(count).into());
        }
        let mut set = BTreeSet::new();
        for _ in 0..count {
            set.insert(T::decode(src)?);
        }
        Ok(set)
    }
}

impl<K: Encode, V: Encode> Encode for HashMap<K, V> {
    fn encode(&self, out: &mut Vec<u8>) {
        (self.len() as u32).encode(out);
        for (k, v) in self {
            k.encode(out);
            v.encode(out);
        }
    }
}

impl<K: Decode + std::hash::Hash + Eq, V: Decode> Decode for HashMap<K, V> {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let count = u32::decode(src)?;
        if count > MAX_SEQUENCE_LEN {
            return Err(DecodeError::LengthOverflow(count).into());
        }
        let mut map = HashMap::new();
        for _ in 0..count {
            let key = K::decode(src)?;
            let value = V::decode(src)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<A: Encode, B: Encode> Encode for (A, B) {
    fn encode(&self, out: &mut Vec<u8>) {
        self.0.encode(out);
        self.1.encode(out);
    }
}

impl<A: Decode, B: Decode> Decode for (A, B) {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let a = A::decode(src)?;
        let b = B::decode(src)?;
        Ok((a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Encode + Decode + PartialEq + std::fmt::Debug>(value: T) {
        let mut buf = Vec::new();
        value.encode(&mut buf);
        let mut src = SliceSource::new(&buf);
        let decoded = T::decode(&mut src).unwrap();
        assert_eq!(value, decoded);
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn big_endian_widths() {
        let mut out = Vec::new();
        0x0102u16.encode(&mut out);
        assert_eq!(out, vec![0x01, 0x02]);

        let mut out = Vec::new();
        0x0102_0304u32.encode(&mut out);
        assert_eq!(out, vec![0x01, 0x02, 0x03, 0x04]);

        let mut out = Vec::new();
        0x0102_0304_0506_0708u64.encode(&mut out);
        assert_eq!(out, (1..=8).collect::<Vec<u8>>());
    }

    #[test]
    fn string_round_trip() {
        let mut out = Vec::new();
        "ab".to_string().encode(&mut out);
        assert_eq!(out, vec![0x02, b'a', b'b']);

        let mut src = SliceSource::new(&[0x00]);
        let decoded = String::decode(&mut src).unwrap();
        assert_eq!(decoded, "");
    }

    #[test]
    fn sequence_and_primitive_roundtrips() {
        roundtrip(42u8);
        roundtrip(12345u16);
        roundtrip(vec![1u32, 2, 3]);
        roundtrip((7u16, "hi".to_string()));
    }

    #[test]
    fn too_short_on_truncated_buffer() {
        let mut src = SliceSource::new(&[0x00, 0x01]);
        let err = u32::decode(&mut src).unwrap_err();
        assert_eq!(err, DecodeError::TooShort);
    }

    #[test]
    fn length_overflow_rejected_before_allocating() {
        let mut buf = Vec::new();
        (MAX_SEQUENCE_LEN + 1).encode(&mut buf);
        let mut src = SliceSource::new(&buf);
        let err = Vec::<u8>::decode(&mut src).unwrap_err();
        assert_eq!(err, DecodeError::LengthOverflow(MAX_SEQUENCE_LEN + 1));
    }
}
