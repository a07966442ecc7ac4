//! Beast wire frames.
//!
//! A frame on the wire is `0x1A <type> <body>`, with any `0x1A` in the body
//! escaped as `0x1A 0x1A`. Type 2 carries a short Mode S message, type 3 a
//! long one; both prefix the message with a 48-bit MLAT timestamp and a
//! signal level byte. Types 1 (Mode A/C) and 4 (configuration) are
//! recognized but not decoded.

use std::time::Duration;

use crate::message::RawMessage;
use crate::types::{BeastError, Result};

/// Escape / frame marker byte.
pub const ESCAPE: u8 = 0x1A;

pub(crate) const TYPE_MODE_AC: u8 = 0x31;
pub(crate) const TYPE_MODE_S_SHORT: u8 = 0x32;
pub(crate) const TYPE_MODE_S_LONG: u8 = 0x33;
pub(crate) const TYPE_CONFIG: u8 = 0x34;

/// Unescaped frame length by type byte, counting the type byte itself but
/// not the leading marker. `None` for bytes that are not a Beast frame type.
pub(crate) fn frame_length(frame_type: u8) -> Option<usize> {
    match frame_type {
        TYPE_MODE_AC => Some(8),
        TYPE_MODE_S_SHORT => Some(15),
        TYPE_MODE_S_LONG => Some(22),
        TYPE_CONFIG => Some(2),
        _ => None,
    }
}

/// Collapse escape pairs: `0x1A 0x1A` becomes a single `0x1A`.
///
/// Input without escape pairs passes through unchanged, so applying the
/// operation twice is the same as applying it once.
pub fn unescape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        out.push(data[i]);
        if data[i] == ESCAPE && i + 1 < data.len() && data[i + 1] == ESCAPE {
            i += 1;
        }
        i += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One Beast-encapsulated Mode S message.
///
/// Created empty, populated by a single call to [`Frame::unmarshal`] or
/// [`crate::Decoder::decode`], then read-only.
#[derive(Debug, Default, Clone)]
pub struct Frame {
    format: u8,
    timestamp: u64,
    signal: u8,
    msg: RawMessage,
}

impl Frame {
    /// Parse one wire frame, including the leading `0x1A` marker.
    ///
    /// The input may still contain escape pairs: this path is also reachable
    /// without the streaming decoder, so the frame performs its own escape
    /// collapse before validating lengths.
    pub fn unmarshal(data: &[u8]) -> Result<Frame> {
        if data.first() != Some(&ESCAPE) {
            return Err(BeastError::FormatMissing);
        }
        let data = unescape(data);
        let Some(&frame_type) = data.get(1) else {
            return Err(BeastError::FormatMissing);
        };

        let expected = match frame_type {
            TYPE_MODE_S_SHORT | TYPE_MODE_S_LONG => {
                // marker + type + body
                frame_length(frame_type).unwrap_or(0) + 1
            }
            TYPE_MODE_AC | TYPE_CONFIG => {
                return Err(BeastError::FormatNotSupported(frame_type))
            }
            _ => return Err(BeastError::FormatInvalid),
        };
        if data.len() != expected {
            return Err(BeastError::LengthMismatch {
                expected,
                received: data.len(),
            });
        }

        let mut timestamp = 0u64;
        for &byte in &data[2..8] {
            timestamp = (timestamp << 8) | u64::from(byte);
        }

        Ok(Frame {
            format: frame_type - 0x30,
            timestamp,
            signal: data[8],
            msg: RawMessage::unmarshal(&data[9..])?,
        })
    }

    /// Frame format: 2 for short Mode S, 3 for long.
    pub fn format(&self) -> u8 {
        self.format
    }

    /// Signal level (RSSI) byte reported by the receiver.
    pub fn signal(&self) -> u8 {
        self.signal
    }

    /// Raw 48-bit MLAT counter value, in 1/12 µs ticks.
    pub fn mlat_ticks(&self) -> u64 {
        self.timestamp
    }

    /// The MLAT counter as elapsed time since the counter's own epoch,
    /// usually receiver power-on. Not anchored to UTC.
    pub fn timestamp(&self) -> Duration {
        Duration::from_nanos(self.timestamp * 1000 / 12)
    }

    /// The enclosed Mode S message bytes (7 or 14).
    pub fn adsb_bytes(&self) -> &[u8] {
        self.msg.bytes()
    }

    /// The enclosed Mode S message.
    pub fn message(&self) -> &RawMessage {
        &self.msg
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{hex_decode, hex_encode};

    fn unmarshal(hex: &str) -> Result<Frame> {
        Frame::unmarshal(&hex_decode(hex).unwrap())
    }

    // -- unescape --

    #[test]
    fn test_unescape_collapses_pairs() {
        assert_eq!(unescape(&[0x1A, 0x1A]), vec![0x1A]);
        assert_eq!(
            unescape(&[0x01, 0x1A, 0x1A, 0x02, 0x1A, 0x1A]),
            vec![0x01, 0x1A, 0x02, 0x1A]
        );
    }

    #[test]
    fn test_unescape_leaves_clean_input_alone() {
        let clean = [0x1A, 0x32, 0x00, 0x01, 0x02];
        assert_eq!(unescape(&clean), clean.to_vec());
    }

    #[test]
    fn test_unescape_idempotent() {
        let escaped = hex_decode("1a3200001a1a00001a1a1a1a5d1a1a99da1a1ad95f").unwrap();
        let once = unescape(&escaped);
        assert_eq!(unescape(&once), once);
    }

    // -- unmarshal validation --

    #[test]
    fn test_unmarshal_missing_marker() {
        let err = unmarshal("ff0000ff").unwrap_err();
        assert_eq!(err.to_string(), "format identifier not found");
    }

    #[test]
    fn test_unmarshal_short_length() {
        let err = unmarshal("1a32ffff").unwrap_err();
        assert_eq!(err.to_string(), "expected 16 bytes, received 4");
        let err = unmarshal("1a33ffff").unwrap_err();
        assert_eq!(err.to_string(), "expected 23 bytes, received 4");
    }

    #[test]
    fn test_unmarshal_unsupported_types() {
        let err = unmarshal("1a31ffff").unwrap_err();
        assert_eq!(err.to_string(), "format not supported: 31");
        let err = unmarshal("1a34ffff").unwrap_err();
        assert_eq!(err.to_string(), "format not supported: 34");
    }

    #[test]
    fn test_unmarshal_invalid_type() {
        let err = unmarshal("1affffff").unwrap_err();
        assert_eq!(err.to_string(), "invalid format identifier");
    }

    // -- unmarshal success --

    #[test]
    fn test_unmarshal_short_frame() {
        let frame = unmarshal("1a3216f933baf325c45da99adad95ff6").unwrap();
        assert_eq!(frame.format(), 2);
        assert_eq!(frame.mlat_ticks(), 25259570557733);
        assert_eq!(frame.signal(), 196);
        assert_eq!(hex_encode(frame.adsb_bytes()), "5da99adad95ff6");
    }

    #[test]
    fn test_unmarshal_long_frame() {
        let frame = unmarshal("1a3316f933bbc63ec68da99ada58b98446e703357e2417").unwrap();
        assert_eq!(frame.format(), 3);
        assert_eq!(frame.mlat_ticks(), 25259570611774);
        assert_eq!(frame.signal(), 198);
        assert_eq!(hex_encode(frame.adsb_bytes()), "8da99ada58b98446e703357e2417");
    }

    #[test]
    fn test_unmarshal_escaped_frame() {
        let frame = unmarshal("1a3200001a1a00001a1a1a1a5d1a1a99da1a1ad95f").unwrap();
        assert_eq!(frame.format(), 2);
        assert_eq!(frame.mlat_ticks(), 436207642);
        assert_eq!(frame.signal(), 0x1A);
        assert_eq!(hex_encode(frame.adsb_bytes()), "5d1a99da1ad95f");
    }

    #[test]
    fn test_timestamp_tick_conversion() {
        let frame = unmarshal("1a3216f933baf325c45da99adad95ff6").unwrap();
        assert_eq!(frame.timestamp(), Duration::from_nanos(2104964213144416));
        let frame = unmarshal("1a3316f933bbc63ec68da99ada58b98446e703357e2417").unwrap();
        assert_eq!(frame.timestamp(), Duration::from_nanos(2104964217647833));
    }

    #[test]
    fn test_unmarshal_copies_input() {
        let mut data = hex_decode("1a3216f933baf325c45da99adad95ff6").unwrap();
        let frame = Frame::unmarshal(&data).unwrap();
        data.fill(0);
        assert_eq!(hex_encode(frame.adsb_bytes()), "5da99adad95ff6");
    }
}
