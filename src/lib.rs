//! beast-decode: Pure decoding library for Mode S Beast receiver streams.
//!
//! Consumes the escaped byte stream emitted by a Mode S "Beast" receiver and
//! turns it into structured aircraft surveillance data: identity, altitude,
//! callsign, squawk, velocity, and position.
//!
//! No I/O policy and no tracking — the caller supplies a blocking byte
//! source and keeps whatever state it needs across messages (most notably
//! the even/odd report pairing for global position decoding).
//!
//! Pipeline: bytes → [`Decoder`] → [`Frame`] → [`Message`] accessors, with
//! [`decode_global_position`] / [`Cpr::decode_local`] recovering coordinates
//! from compact position reports.

pub mod bits;
pub mod cpr;
mod crc;
pub mod decoder;
pub mod frame;
pub mod message;
pub mod types;

// Re-export the working surface at the crate root
pub use cpr::{decode_global_position, nl, Cpr, Position};
pub use decoder::Decoder;
pub use frame::Frame;
pub use message::{Message, RawMessage};
pub use types::{BeastError, Result};
