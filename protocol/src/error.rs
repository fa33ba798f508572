use thiserror::Error;

/// Failure modes for decoding a value from the wire.
///
/// These are the only errors the codec itself can raise; transport-level
/// failures (a closed or reset connection) are modeled separately by
/// [`crate::framing`], since a bare byte slice has no notion of "the peer
/// hung up".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not enough bytes to decode a value")]
    TooShort,
    #[error("{trailing} trailing byte(s) left after decoding")]
    TooLong { trailing: usize },
    #[error("unknown tag byte {0:#04x}")]
    UnknownTag(u8),
    #[error("sequence length {0} exceeds the sanity cap")]
    LengthOverflow(u32),
    #[error("string bytes are not valid UTF-8")]
    Utf8,
}
