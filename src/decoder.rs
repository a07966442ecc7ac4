//! Streaming Beast frame decoder.
//!
//! Scans a blocking byte source for frame boundaries, performs escape
//! processing, and hands complete frames to [`Frame::unmarshal`]. A frame
//! boundary is an unescaped `0x1A` that is not the first half of an escape
//! pair; frame lengths are fixed per type, so the body is read by counting
//! unescaped bytes.

use std::io::{ErrorKind, Read};

use crate::frame::{frame_length, Frame, ESCAPE};
use crate::types::{BeastError, Result};

/// Chunk size for reads from the byte source.
const RECEIVE_BUFFER_SIZE: usize = 512;

/// Longest frame on the wire: marker + 22 unescaped bytes, at most doubled
/// by escape pairs.
const FRAME_BUFFER_CAPACITY: usize = 46;

/// Incremental decoder over a blocking byte source.
///
/// The decoder owns the source and its internal buffers; it is not safe to
/// share one instance across threads without external synchronization. Each
/// [`Decoder::decode`] call yields exactly one frame or one error. After any
/// error other than [`BeastError::StreamEnd`] the stream position is
/// undefined: bytes up to the next frame marker may be lost.
#[derive(Debug)]
pub struct Decoder<R> {
    source: R,
    receive: ReceiveBuffer,
    frame_buf: Vec<u8>,
}

impl<R: Read> Decoder<R> {
    /// Create a decoder owning `source`.
    pub fn new(source: R) -> Decoder<R> {
        Decoder {
            source,
            receive: ReceiveBuffer::default(),
            frame_buf: Vec::with_capacity(FRAME_BUFFER_CAPACITY),
        }
    }

    /// Decode the next frame from the stream into `frame`.
    ///
    /// Blocks while the underlying source blocks. Partial reads are fine;
    /// frame boundaries are preserved across arbitrary chunking.
    pub fn decode(&mut self, frame: &mut Frame) -> Result<()> {
        self.frame_buf.clear();

        // A frame must start right here; anything else is garbage.
        match self.next_byte()? {
            None => return Err(BeastError::StreamEnd),
            Some(ESCAPE) => {}
            Some(byte) => {
                tracing::debug!(byte, "expected frame marker");
                return Err(BeastError::StreamCorrupt);
            }
        }

        let frame_type = self.next_byte()?.ok_or(BeastError::UnexpectedEof)?;
        let expected = frame_length(frame_type).ok_or(BeastError::UnsupportedFrameType(frame_type))?;

        self.frame_buf.push(ESCAPE);
        self.frame_buf.push(frame_type);

        // Collect raw body bytes, escape pairs intact, until the unescaped
        // count completes the frame; the one and only escape collapse
        // happens in Frame::unmarshal. An unescaped marker followed by
        // anything but a second marker means the next frame started early.
        let mut body_count = 0;
        while body_count < expected - 1 {
            let byte = self.next_byte()?.ok_or(BeastError::UnexpectedEof)?;
            if byte != ESCAPE {
                self.frame_buf.push(byte);
                body_count += 1;
                continue;
            }
            match self.next_byte()?.ok_or(BeastError::UnexpectedEof)? {
                ESCAPE => {
                    self.frame_buf.push(ESCAPE);
                    self.frame_buf.push(ESCAPE);
                    body_count += 1;
                }
                _ => return Err(BeastError::Truncated),
            }
        }

        tracing::trace!(
            frame_type,
            len = self.frame_buf.len(),
            "frame assembled"
        );
        *frame = Frame::unmarshal(&self.frame_buf)?;
        Ok(())
    }

    /// Next byte from the source, refilling the receive buffer as needed.
    /// `None` means the source is exhausted.
    fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.receive.is_empty() {
            loop {
                match self.source.read(&mut self.receive.buf) {
                    Ok(0) => return Ok(None),
                    Ok(n) => {
                        self.receive.read_pos = 0;
                        self.receive.write_pos = n;
                        break;
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(Some(self.receive.take()))
    }
}

#[derive(Debug)]
struct ReceiveBuffer {
    buf: [u8; RECEIVE_BUFFER_SIZE],
    read_pos: usize,
    write_pos: usize,
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        ReceiveBuffer {
            buf: [0; RECEIVE_BUFFER_SIZE],
            read_pos: 0,
            write_pos: 0,
        }
    }
}

impl ReceiveBuffer {
    fn is_empty(&self) -> bool {
        self.read_pos >= self.write_pos
    }

    fn take(&mut self) -> u8 {
        let byte = self.buf[self.read_pos];
        self.read_pos += 1;
        byte
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::message::Message;
    use crate::types::{hex_decode, hex_encode, icao_to_string};

    fn decoder_for(hex: &str) -> Decoder<Cursor<Vec<u8>>> {
        Decoder::new(Cursor::new(hex_decode(hex).unwrap()))
    }

    fn decode_err(hex: &str) -> BeastError {
        let mut decoder = decoder_for(hex);
        let mut frame = Frame::default();
        decoder.decode(&mut frame).unwrap_err()
    }

    /// Hands out one byte per read call, exercising chunked-read handling.
    struct OneByteReader {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for OneByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    // -- complete frames --

    #[test]
    fn test_decode_short_frame() {
        let mut decoder = decoder_for("1a3216f933baf325c45da99adad95ff6");
        let mut frame = Frame::default();
        decoder.decode(&mut frame).unwrap();

        assert_eq!(frame.format(), 2);
        assert_eq!(frame.mlat_ticks(), 25259570557733);
        assert_eq!(frame.signal(), 196);

        let msg = Message::unmarshal(frame.adsb_bytes()).unwrap();
        assert_eq!(msg.raw().df(), 11);
        assert_eq!(icao_to_string(msg.icao().unwrap()), "a99ada");
        assert!(matches!(msg.raw().tc(), Err(BeastError::NotAvailable)));
    }

    #[test]
    fn test_decode_long_frame() {
        let mut decoder = decoder_for("1a3316f933bbc63ec68da99ada58b98446e703357e2417");
        let mut frame = Frame::default();
        decoder.decode(&mut frame).unwrap();

        assert_eq!(frame.format(), 3);
        assert_eq!(frame.mlat_ticks(), 25259570611774);
        assert_eq!(frame.signal(), 198);

        let msg = Message::unmarshal(frame.adsb_bytes()).unwrap();
        assert_eq!(msg.raw().df(), 17);
        assert_eq!(msg.raw().tc().unwrap(), 11);
        assert_eq!(icao_to_string(msg.icao().unwrap()), "a99ada");
    }

    #[test]
    fn test_decode_consecutive_frames() {
        let mut decoder = decoder_for(concat!(
            "1a3216f933baf325c45da99adad95ff6",
            "1a3316f933bbc63ec68da99ada58b98446e703357e2417"
        ));
        let mut frame = Frame::default();

        decoder.decode(&mut frame).unwrap();
        assert_eq!(frame.format(), 2);
        decoder.decode(&mut frame).unwrap();
        assert_eq!(frame.format(), 3);
        assert!(matches!(
            decoder.decode(&mut frame),
            Err(BeastError::StreamEnd)
        ));
    }

    #[test]
    fn test_decode_escaped_frame() {
        let mut decoder = decoder_for("1a3200001a1a00001a1a1a1a5d1a1a99da1a1ad95f");
        let mut frame = Frame::default();
        decoder.decode(&mut frame).unwrap();

        assert_eq!(frame.signal(), 0x1A);
        assert_eq!(frame.mlat_ticks(), 436207642);
        assert_eq!(hex_encode(frame.adsb_bytes()), "5d1a99da1ad95f");
    }

    #[test]
    fn test_decode_single_byte_reads() {
        let data = hex_decode("1a3316f933bbc63ec68da99ada58b98446e703357e2417").unwrap();
        let mut decoder = Decoder::new(OneByteReader { data, pos: 0 });
        let mut frame = Frame::default();
        decoder.decode(&mut frame).unwrap();
        assert_eq!(frame.format(), 3);
        assert_eq!(hex_encode(frame.adsb_bytes()), "8da99ada58b98446e703357e2417");
    }

    // -- stream errors --

    #[test]
    fn test_decode_empty_stream() {
        assert!(matches!(decode_err(""), BeastError::StreamEnd));
    }

    #[test]
    fn test_decode_eof_variants() {
        for hex in ["1a", "1a31", "1a331a", "1a331a1a"] {
            let err = decode_err(hex);
            assert_eq!(err.to_string(), "error reading stream: EOF", "input {hex}");
        }
    }

    #[test]
    fn test_decode_corrupt_start() {
        let err = decode_err("ff00");
        assert_eq!(err.to_string(), "data stream corrupt");
    }

    #[test]
    fn test_decode_truncated_frame() {
        let err = decode_err("1a32ffff1a33ff");
        assert_eq!(err.to_string(), "frame truncated");
    }

    #[test]
    fn test_decode_unknown_frame_type() {
        let err = decode_err("1affffff");
        assert_eq!(err.to_string(), "unsupported frame type: ff");
    }

    #[test]
    fn test_decode_mode_ac_frame_rejected() {
        // the frame body is consumed before the type is rejected
        let err = decode_err("1a31ffffffffffffffffff");
        assert_eq!(err.to_string(), "format not supported: 31");
    }

    #[test]
    fn test_decode_io_error_is_wrapped() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(ErrorKind::ConnectionReset, "reset"))
            }
        }

        let mut decoder = Decoder::new(FailingReader);
        let mut frame = Frame::default();
        let err = decoder.decode(&mut frame).unwrap_err();
        assert!(matches!(err, BeastError::Stream(_)));
    }
}
