//! Length-prefixed message framing.
//!
//! The codec is deliberately stream-agnostic: both halves are generic over
//! [`Read`]/[`Write`] so they run against a [`TcpStream`](std::net::TcpStream)
//! in production and a `Cursor` in tests.

use std::io::{ErrorKind, Read, Write};

use crate::protocol::error::{FarcallError, Result};

/// Default cap on a declared frame length (16 MiB).
///
/// The length header is attacker-controlled, so it is checked against this
/// limit before any allocation happens. Envelopes in this protocol are small;
/// the cap is a config knob for callers that need more.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Writes one frame: the 4-byte big-endian length header, then the payload.
///
/// One logical write for the header, one for the payload, then a flush.
/// Partial OS-level writes are the stream's concern (`write_all`), not the
/// codec's.
///
/// # Errors
///
/// Returns [`FarcallError::FrameTooLarge`] if the payload cannot be described
/// by a `u32` header, or a mapped IO error if the stream fails.
pub fn write_frame<W: Write>(stream: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FarcallError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;

    stream
        .write_all(&len.to_be_bytes())
        .map_err(|e| map_io_error(e, "writing length prefix"))?;
    stream
        .write_all(payload)
        .map_err(|e| map_io_error(e, "writing payload"))?;
    stream
        .flush()
        .map_err(|e| map_io_error(e, "flushing stream"))?;

    Ok(())
}

/// Reads one frame: exactly 4 header bytes, then exactly the declared number
/// of payload bytes, accumulating across short reads as needed.
///
/// # Errors
///
/// - [`FarcallError::ConnectionClosed`] if the stream ends before the header
///   or payload is complete — a short read is never padded or truncated
/// - [`FarcallError::FrameTooLarge`] if the header declares more than
///   `max_len` bytes; nothing is allocated in that case
/// - [`FarcallError::Timeout`] if the stream's read deadline expires
pub fn read_frame<R: Read>(stream: &mut R, max_len: usize) -> Result<Vec<u8>> {
    let mut header = [0u8; 4];
    read_full(stream, &mut header, "reading length prefix")?;

    let len = u32::from_be_bytes(header) as usize;
    if len > max_len {
        return Err(FarcallError::FrameTooLarge { len, max: max_len });
    }

    let mut payload = vec![0u8; len];
    read_full(stream, &mut payload, "reading payload")?;

    Ok(payload)
}

/// Fills `buf` completely, looping over short reads.
fn read_full<R: Read>(stream: &mut R, buf: &mut [u8], context: &str) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return Err(FarcallError::ConnectionClosed(buf.len() - filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(map_io_error(e, context)),
        }
    }
    Ok(())
}

/// Maps IO errors onto the protocol taxonomy: deadline misses become
/// `Timeout`, torn connections become `Connection`, the rest stay `Io`.
pub(crate) fn map_io_error(err: std::io::Error, context: &str) -> FarcallError {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => FarcallError::Timeout(context.to_string()),
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::NotConnected => {
            FarcallError::Connection(format!("{}: connection lost", context))
        }
        ErrorKind::UnexpectedEof => FarcallError::Connection(format!("{}: unexpected EOF", context)),
        _ => FarcallError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn round_trip(payload: &[u8]) -> Vec<u8> {
        let mut wire = Vec::new();
        write_frame(&mut wire, payload).unwrap();
        read_frame(&mut Cursor::new(wire), DEFAULT_MAX_FRAME_LEN).unwrap()
    }

    #[test]
    fn frame_round_trip() {
        assert_eq!(round_trip(b"hello"), b"hello");
        assert_eq!(round_trip(br#"{"procedure":"add","args":[2,3]}"#).len(), 32);
    }

    #[test]
    fn empty_frame_is_legal() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"").unwrap();

        assert_eq!(wire, [0, 0, 0, 0]);
        assert_eq!(round_trip(b""), b"");
    }

    #[test]
    fn binary_payload_survives() {
        let payload: Vec<u8> = (0..=255).collect();
        assert_eq!(round_trip(&payload), payload);
    }

    #[test]
    fn header_is_big_endian() {
        let mut wire = Vec::new();
        write_frame(&mut wire, &[0xAB; 5]).unwrap();

        assert_eq!(&wire[..4], &[0, 0, 0, 5]);
    }

    #[test]
    fn short_read_in_header_fails() {
        let err = read_frame(&mut Cursor::new(vec![0, 0]), DEFAULT_MAX_FRAME_LEN).unwrap_err();

        match err {
            FarcallError::ConnectionClosed(left) => assert_eq!(left, 2),
            other => panic!("expected ConnectionClosed, got {other:?}"),
        }
    }

    #[test]
    fn short_read_in_payload_fails() {
        // Header declares 10 bytes, stream carries 3.
        let mut wire = vec![0, 0, 0, 10];
        wire.extend_from_slice(b"abc");

        let err = read_frame(&mut Cursor::new(wire), DEFAULT_MAX_FRAME_LEN).unwrap_err();

        match err {
            FarcallError::ConnectionClosed(left) => assert_eq!(left, 7),
            other => panic!("expected ConnectionClosed, got {other:?}"),
        }
    }

    #[test]
    fn oversized_header_is_rejected_before_allocation() {
        let wire = u32::MAX.to_be_bytes().to_vec();

        let err = read_frame(&mut Cursor::new(wire), 1024).unwrap_err();

        match err {
            FarcallError::FrameTooLarge { len, max } => {
                assert_eq!(len, u32::MAX as usize);
                assert_eq!(max, 1024);
            }
            other => panic!("expected FrameTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn frame_at_the_limit_is_accepted() {
        let mut wire = Vec::new();
        write_frame(&mut wire, &[7u8; 16]).unwrap();

        let payload = read_frame(&mut Cursor::new(wire), 16).unwrap();
        assert_eq!(payload, [7u8; 16]);
    }
}
