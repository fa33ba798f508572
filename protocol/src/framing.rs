//! TCP and UDP framing (§4.1).
//!
//! TCP is a continuous byte stream: [`TcpFrameReader`] pulls exactly the
//! bytes each message needs as it decodes, with no length prefix at the
//! transport level. UDP is one message per datagram: [`UdpFrameReader`]
//! reads a whole datagram into a scratch buffer and rejects anything left
//! over once the message has been decoded.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::codec::{ByteSource, Decode, Encode};
use crate::error::DecodeError;

/// Datagrams larger than this never happen on this protocol; used as the
/// scratch buffer size and as the send-side safety cap (§4.1).
pub const MAX_DATAGRAM: usize = 65536;

/// Failure modes reading or writing a TCP-framed message.
#[derive(Debug, Error)]
pub enum TcpFrameError {
    /// The peer closed the connection cleanly between messages.
    #[error("connection closed")]
    Closed,
    /// The peer closed (or reset) the connection in the middle of a
    /// message (§7: "peer close mid-message signals ConnectionAborted").
    #[error("connection aborted mid-message")]
    Aborted,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Adapts a blocking [`Read`] stream to [`ByteSource`], tracking whether any
/// bytes of the in-progress message have been consumed yet so an EOF can be
/// classified as a clean close vs. a mid-message abort.
struct StreamSource<'a, R: Read> {
    reader: &'a mut R,
    consumed: usize,
}

impl<'a, R: Read> ByteSource for StreamSource<'a, R> {
    type Error = TcpFrameError;

    fn read_u8(&mut self) -> Result<u8, TcpFrameError> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, TcpFrameError> {
        let mut buf = vec![0u8; n];
        if let Err(err) = self.reader.read_exact(&mut buf) {
            return Err(if err.kind() == io::ErrorKind::UnexpectedEof {
                if self.consumed == 0 {
                    TcpFrameError::Closed
                } else {
                    TcpFrameError::Aborted
                }
            } else {
                TcpFrameError::Io(err)
            });
        }
        self.consumed += n;
        Ok(buf)
    }
}

/// Reads one length-blind message at a time off a TCP stream.
pub struct TcpFrameReader<R: Read> {
    reader: R,
}

impl<R: Read> TcpFrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn read_message<T: Decode>(&mut self) -> Result<T, TcpFrameError>
    where
        T: Decode,
    {
        let mut src = StreamSource {
            reader: &mut self.reader,
            consumed: 0,
        };
        T::decode(&mut src)
    }
}

/// Writes length-blind messages to a TCP stream, one at a time.
pub struct TcpFrameWriter<W: Write> {
    writer: W,
}

impl<W: Write> TcpFrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_message<T: Encode>(&mut self, value: &T) -> io::Result<()> {
        let mut buf = Vec::new();
        value.encode(&mut buf);
        self.writer.write_all(&buf)?;
        self.writer.flush()
    }
}

/// Failure modes reading or writing a single UDP datagram.
#[derive(Debug, Error)]
pub enum UdpFrameError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("encoded message ({0} bytes) exceeds the datagram cap")]
    TooLargeToSend(usize),
}

/// Decodes exactly one value out of a byte slice already received as a
/// single datagram, requiring every byte to be consumed (`too-long`
/// otherwise per §4.1).
pub fn decode_datagram<T: Decode>(bytes: &[u8]) -> Result<T, UdpFrameError> {
    let mut src = crate::codec::SliceSource::new(bytes);
    let value = T::decode(&mut src).map_err(UdpFrameError::Decode)?;
    let trailing = src.remaining();
    if trailing > 0 {
        return Err(UdpFrameError::Decode(DecodeError::TooLong { trailing }));
    }
    Ok(value)
}

/// Encodes a value to a standalone datagram buffer, rejecting anything that
/// wouldn't fit in [`MAX_DATAGRAM`] bytes.
pub fn encode_datagram<T: Encode>(value: &T) -> Result<Vec<u8>, UdpFrameError> {
    let mut buf = Vec::new();
    value.encode(&mut buf);
    if buf.len() > MAX_DATAGRAM {
        return Err(UdpFrameError::TooLargeToSend(buf.len()));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ClientToServer;

    #[test]
    fn tcp_reader_pulls_exact_bytes_across_two_messages() {
        let mut buf = Vec::new();
        ClientToServer::Join("a".to_string()).encode(&mut buf);
        ClientToServer::PlaceBomb.encode(&mut buf);

        let mut reader = TcpFrameReader::new(&buf[..]);
        assert_eq!(
            reader.read_message::<ClientToServer>().unwrap(),
            ClientToServer::Join("a".to_string())
        );
        assert_eq!(
            reader.read_message::<ClientToServer>().unwrap(),
            ClientToServer::PlaceBomb
        );
    }

    #[test]
    fn tcp_reader_reports_clean_close_between_messages() {
        let mut reader = TcpFrameReader::new(&b""[..]);
        let err = reader.read_message::<ClientToServer>().unwrap_err();
        assert!(matches!(err, TcpFrameError::Closed));
    }

    #[test]
    fn tcp_reader_reports_abort_mid_message() {
        // A Join tag plus a string length byte, but the socket closes
        // before the name bytes arrive.
        let partial = [0x00u8, 0x03];
        let mut reader = TcpFrameReader::new(&partial[..]);
        let err = reader.read_message::<ClientToServer>().unwrap_err();
        assert!(matches!(err, TcpFrameError::Aborted));
    }

    #[test]
    fn udp_datagram_rejects_trailing_bytes() {
        let mut buf = Vec::new();
        ClientToServer::PlaceBomb.encode(&mut buf);
        buf.push(0xFF);
        let err = decode_datagram::<ClientToServer>(&buf).unwrap_err();
        assert!(matches!(
            err,
            UdpFrameError::Decode(DecodeError::TooLong { trailing: 1 })
        ));
    }

    #[test]
    fn udp_datagram_round_trip() {
        let msg = ClientToServer::Move(crate::Direction::Down);
        let buf = encode_datagram(&msg).unwrap();
        let decoded: ClientToServer = decode_datagram(&buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
