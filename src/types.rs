//! Shared types, error enum, and helpers for beast-decode.

use thiserror::Error;

/// All errors produced by beast-decode.
///
/// The wire-level variants carry the exact context a caller needs to decide
/// whether to resynchronize (`StreamCorrupt`, `Truncated`) or give up
/// (`Stream`, `UnexpectedEof`). `UnsupportedDf` and `NotAvailable` are fully
/// recoverable: they describe the message, not the stream.
#[derive(Debug, Error)]
pub enum BeastError {
    /// The byte source ended cleanly at a frame boundary.
    #[error("end of stream")]
    StreamEnd,
    /// The byte source ran dry while a frame was still being read.
    #[error("error reading stream: EOF")]
    UnexpectedEof,
    /// I/O failure on the underlying byte source.
    #[error("error reading stream: {0}")]
    Stream(#[from] std::io::Error),
    /// A byte other than the escape marker appeared where a frame had to
    /// start.
    #[error("data stream corrupt")]
    StreamCorrupt,
    /// A new frame started before the current body was complete.
    #[error("frame truncated")]
    Truncated,
    /// The byte following the escape marker is not a known Beast frame type.
    #[error("unsupported frame type: {0:02x}")]
    UnsupportedFrameType(u8),
    /// A valid Beast frame type that this library does not decode
    /// (Mode A/C and configuration frames).
    #[error("format not supported: {0:02x}")]
    FormatNotSupported(u8),
    /// The leading escape marker is missing entirely.
    #[error("format identifier not found")]
    FormatMissing,
    /// The type byte is not a valid Beast frame type.
    #[error("invalid format identifier")]
    FormatInvalid,
    /// Structural length does not match the declared frame type.
    #[error("expected {expected} bytes, received {received}")]
    LengthMismatch { expected: usize, received: usize },
    /// A Mode S message must be exactly 7 or 14 bytes.
    #[error("expected 7 or 14 bytes, received {0}")]
    InvalidMessageLength(usize),
    /// Downlink format outside the accepted set. The raw message itself is
    /// intact and may still be inspected field by field.
    #[error("unsupported downlink format: {0}")]
    UnsupportedDf(u8),
    /// The requested field is not defined for this DF/TC combination.
    #[error("field not available")]
    NotAvailable,
    /// Position reconstruction failed.
    #[error("CPR decode failed: {0}")]
    CprFailed(String),
}

pub type Result<T> = std::result::Result<T, BeastError>;

// ---------------------------------------------------------------------------
// Unit conversions
// ---------------------------------------------------------------------------

/// Knots to meters per second.
pub const KNOT_TO_MPS: f64 = 0.514444444;

/// Feet per minute to meters per second.
pub const FEET_PER_MIN_TO_MPS: f64 = 0.00508;

// ---------------------------------------------------------------------------
// ICAO address helpers
// ---------------------------------------------------------------------------

/// Format a 24-bit ICAO address as 6-char lowercase hex.
pub fn icao_to_string(icao: u32) -> String {
    format!("{icao:06x}")
}

/// Parse a 6-char hex string into a 24-bit ICAO address.
pub fn icao_from_hex(hex: &str) -> Option<u32> {
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

/// Encode bytes as a lowercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for &b in data {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
    }
    s
}

const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// ADS-B callsign character set
// ---------------------------------------------------------------------------

/// Callsign character set, 6 bits per character. Slots that do not encode a
/// printable character map to `?`.
pub const CALLSIGN_CHARSET: &[u8; 64] =
    b"?ABCDEFGHIJKLMNOPQRSTUVWXYZ????? ???????????????0123456789??????";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icao_roundtrip() {
        let icao = icao_from_hex("a99ada").unwrap();
        assert_eq!(icao, 0xA99ADA);
        assert_eq!(icao_to_string(icao), "a99ada");
    }

    #[test]
    fn test_icao_from_hex_rejects_bad_input() {
        assert!(icao_from_hex("a99ad").is_none());
        assert!(icao_from_hex("zzzzzz").is_none());
    }

    #[test]
    fn test_hex_decode() {
        assert_eq!(hex_decode("a99ada"), Some(vec![0xA9, 0x9A, 0xDA]));
        assert_eq!(hex_decode("odd"), None); // odd length
        assert_eq!(hex_decode("zzzz"), None); // invalid chars
    }

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode(&[0x5D, 0xA9, 0x9A]), "5da99a");
    }

    #[test]
    fn test_wire_error_messages() {
        assert_eq!(
            BeastError::UnsupportedFrameType(0xFF).to_string(),
            "unsupported frame type: ff"
        );
        assert_eq!(
            BeastError::FormatNotSupported(0x31).to_string(),
            "format not supported: 31"
        );
        assert_eq!(
            BeastError::LengthMismatch {
                expected: 16,
                received: 4
            }
            .to_string(),
            "expected 16 bytes, received 4"
        );
        assert_eq!(BeastError::Truncated.to_string(), "frame truncated");
        assert_eq!(BeastError::StreamCorrupt.to_string(), "data stream corrupt");
    }

    #[test]
    fn test_stream_error_preserves_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = BeastError::from(io);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_callsign_charset_roundtrip() {
        // encode "BAW123" with the charset, then map the indices back
        let call = "BAW123";
        let indices: Vec<usize> = call
            .bytes()
            .map(|c| CALLSIGN_CHARSET.iter().position(|&x| x == c).unwrap())
            .collect();
        let decoded: String = indices
            .iter()
            .map(|&i| CALLSIGN_CHARSET[i] as char)
            .collect();
        assert_eq!(decoded, call);
    }
}
