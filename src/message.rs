//! Mode S messages: raw field access and semantic decoding.
//!
//! [`RawMessage`] holds the 56- or 112-bit message and exposes the fields
//! defined for its downlink format. [`Message`] constrains the DF to the
//! accepted set and decodes semantic values: ICAO address, altitude,
//! callsign, squawk, position report, and velocity.

use crate::bits::BitView;
use crate::cpr::Cpr;
use crate::crc;
use crate::types::{BeastError, Result, CALLSIGN_CHARSET, FEET_PER_MIN_TO_MPS, KNOT_TO_MPS};

/// Length of a short Mode S message in bytes.
pub const LENGTH_SHORT: usize = 7;

/// Length of a long Mode S message in bytes.
pub const LENGTH_LONG: usize = 14;

// ---------------------------------------------------------------------------
// RawMessage
// ---------------------------------------------------------------------------

/// A Mode S message of 56 or 112 bits.
///
/// Field accessors return [`BeastError::NotAvailable`] when the field is not
/// defined for the message's downlink format. Bit positions are 1-based
/// across the whole message, MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage {
    data: [u8; LENGTH_LONG],
    len: usize,
}

impl Default for RawMessage {
    /// A zeroed short message; real content arrives via [`RawMessage::unmarshal`].
    fn default() -> Self {
        RawMessage {
            data: [0; LENGTH_LONG],
            len: LENGTH_SHORT,
        }
    }
}

impl RawMessage {
    /// Store a 7- or 14-byte Mode S message. Any other length fails with
    /// [`BeastError::InvalidMessageLength`].
    pub fn unmarshal(data: &[u8]) -> Result<RawMessage> {
        match data.len() {
            LENGTH_SHORT | LENGTH_LONG => {
                let mut msg = RawMessage {
                    data: [0; LENGTH_LONG],
                    len: data.len(),
                };
                msg.data[..data.len()].copy_from_slice(data);
                Ok(msg)
            }
            n => Err(BeastError::InvalidMessageLength(n)),
        }
    }

    /// The message bytes (7 or 14).
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Number of bits in the message (56 or 112).
    pub fn num_bits(&self) -> usize {
        self.len * 8
    }

    /// The bit at 1-based position `n`.
    pub fn bit(&self, n: usize) -> u8 {
        BitView::new(self.bytes()).bit(n)
    }

    /// The unsigned value of bits `a` through `b` inclusive, MSB at `a`.
    pub fn bits(&self, a: usize, b: usize) -> u64 {
        BitView::new(self.bytes()).bits(a, b)
    }

    /// Downlink format, bits 1..5.
    pub fn df(&self) -> u8 {
        self.bits(1, 5) as u8
    }

    /// Transponder capability, bits 6..8 (DF 11, 17).
    pub fn ca(&self) -> Result<u8> {
        match self.df() {
            11 | 17 => Ok(self.bits(6, 8) as u8),
            _ => Err(BeastError::NotAvailable),
        }
    }

    /// Announced ICAO address, bits 9..32 (DF 11, 17, 18).
    pub fn aa(&self) -> Result<u32> {
        match self.df() {
            11 | 17 | 18 => Ok(self.bits(9, 32) as u32),
            _ => Err(BeastError::NotAvailable),
        }
    }

    /// Address/parity field: the last 24 bits of the formats that overlay
    /// the aircraft address on the parity (DF 0, 4, 5, 16, 20, 21, 24).
    pub fn ap(&self) -> Result<u32> {
        match self.df() {
            0 | 4 | 5 | 16 | 20 | 21 | 24 => {
                let n = self.num_bits();
                Ok(self.bits(n - 23, n) as u32)
            }
            _ => Err(BeastError::NotAvailable),
        }
    }

    /// 13-bit altitude code, bits 20..32 (DF 0, 4, 16, 20).
    pub fn ac(&self) -> Result<u16> {
        match self.df() {
            0 | 4 | 16 | 20 => Ok(self.bits(20, 32) as u16),
            _ => Err(BeastError::NotAvailable),
        }
    }

    /// 13-bit identity code, bits 20..32 (DF 5, 21).
    pub fn id(&self) -> Result<u16> {
        match self.df() {
            5 | 21 => Ok(self.bits(20, 32) as u16),
            _ => Err(BeastError::NotAvailable),
        }
    }

    /// Extended squitter type code, bits 33..37 (DF 17, 18).
    ///
    /// Extended squitters are long messages; a short message claiming DF
    /// 17/18 has no ME field to read from.
    pub fn tc(&self) -> Result<u8> {
        match self.df() {
            17 | 18 if self.len == LENGTH_LONG => Ok(self.bits(33, 37) as u8),
            _ => Err(BeastError::NotAvailable),
        }
    }

    /// Emitter category, bits 38..40, for identification squitters
    /// (DF 17/18, TC 1..4).
    pub fn cat(&self) -> Result<u8> {
        match self.tc()? {
            1..=4 => Ok(self.bits(38, 40) as u8),
            _ => Err(BeastError::NotAvailable),
        }
    }

    /// 12-bit extended squitter altitude code, bits 41..52 (DF 17/18
    /// airborne position squitters, TC 9..18 and 20..22).
    pub fn es_altitude(&self) -> Result<u16> {
        match self.tc()? {
            9..=18 | 20..=22 => Ok(self.bits(41, 52) as u16),
            _ => Err(BeastError::NotAvailable),
        }
    }

    /// CRC-24 remainder over the message bits ahead of the parity field.
    pub fn parity(&self) -> u32 {
        crc::remainder(&self.data[..self.len - 3])
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Downlink formats this library decodes.
const ACCEPTED_DF: &[u8] = &[0, 4, 5, 11, 16, 17, 18, 20, 21, 24];

/// A Mode S message with an accepted downlink format.
///
/// Construction fails with [`BeastError::UnsupportedDf`] for any other DF;
/// [`RawMessage`] is `Copy`, so the rejected message stays in the caller's
/// hands for field-by-field inspection.
#[derive(Debug, Clone, Copy)]
pub struct Message {
    raw: RawMessage,
}

impl Message {
    /// Wrap a raw message, validating the downlink format.
    pub fn new(raw: RawMessage) -> Result<Message> {
        let df = raw.df();
        if ACCEPTED_DF.contains(&df) {
            Ok(Message { raw })
        } else {
            Err(BeastError::UnsupportedDf(df))
        }
    }

    /// Parse 7 or 14 message bytes and validate the downlink format.
    pub fn unmarshal(data: &[u8]) -> Result<Message> {
        Message::new(RawMessage::unmarshal(data)?)
    }

    /// The underlying raw message.
    pub fn raw(&self) -> &RawMessage {
        &self.raw
    }

    /// The 24-bit ICAO aircraft address.
    ///
    /// Taken from the announced-address field when present, otherwise
    /// recovered from the address/parity overlay. Addresses recovered from
    /// the overlay are only as trustworthy as the parity bits they rode in
    /// on; validating them against recently seen aircraft is the caller's
    /// concern.
    pub fn icao(&self) -> Result<u32> {
        match self.raw.aa() {
            Ok(aa) => Ok(aa),
            Err(BeastError::NotAvailable) => Ok(self.raw.ap()? ^ self.raw.parity()),
            Err(e) => Err(e),
        }
    }

    /// Altitude in feet.
    ///
    /// DF 0/4/16/20 carry the 13-bit altitude code; DF 17/18 airborne
    /// position squitters carry the 12-bit code. Metric altitudes and
    /// invalid Gillham codes are reported as unavailable.
    pub fn alt(&self) -> Result<i32> {
        match self.raw.df() {
            0 | 4 | 16 | 20 => decode_ac13(self.raw.ac()?),
            17 | 18 => decode_ac12(self.raw.es_altitude()?),
            _ => Err(BeastError::NotAvailable),
        }
    }

    /// Callsign, trailing spaces trimmed.
    ///
    /// Defined for identification squitters (DF 17/18, TC 1..4) and for
    /// Comm-B replies carrying BDS 2,0 (DF 20/21 with the first BDS byte
    /// equal to 0x20).
    pub fn call(&self) -> Result<String> {
        match self.raw.df() {
            17 | 18 => {
                if !(1..=4).contains(&self.raw.tc()?) {
                    return Err(BeastError::NotAvailable);
                }
            }
            20 | 21 => {
                if self.raw.len != LENGTH_LONG || self.raw.bits(33, 40) != 0x20 {
                    return Err(BeastError::NotAvailable);
                }
            }
            _ => return Err(BeastError::NotAvailable),
        }

        let bits = self.raw.bits(41, 88);
        let mut call = String::with_capacity(8);
        for i in 0..8 {
            let idx = ((bits >> (42 - i * 6)) & 0x3F) as usize;
            call.push(CALLSIGN_CHARSET[idx] as char);
        }
        call.truncate(call.trim_end_matches(' ').len());
        Ok(call)
    }

    /// Mode A squawk code as four octal digits (DF 5, 21).
    pub fn squawk(&self) -> Result<[u8; 4]> {
        match self.raw.df() {
            5 | 21 => {}
            _ => return Err(BeastError::NotAvailable),
        }

        let mut sqk = [0u8; 4];
        for (digit, positions) in sqk.iter_mut().zip(SQUAWK_BITS) {
            for n in positions {
                *digit = (*digit << 1) | self.raw.bit(n);
            }
        }
        Ok(sqk)
    }

    /// The compact position report and whether it came from the airborne
    /// band (DF 17/18, TC 5..8 surface or TC 9..18 airborne).
    pub fn cpr(&self) -> Result<(Cpr, bool)> {
        match self.raw.df() {
            17 | 18 => {}
            _ => return Err(BeastError::NotAvailable),
        }
        let tc = self.raw.tc()?;
        if !(5..=18).contains(&tc) {
            return Err(BeastError::NotAvailable);
        }

        let cpr = Cpr {
            nb: 17,
            t: self.raw.bit(53),
            f: self.raw.bit(54),
            lat: self.raw.bits(55, 71) as u32,
            lon: self.raw.bits(72, 88) as u32,
        };
        Ok((cpr, (9..=18).contains(&tc)))
    }

    /// Ground speed in m/s and track angle in degrees (DF 17/18, TC 19,
    /// subtypes 1 and 2).
    ///
    /// Track range is (−180, 180] with 0 = north and 90 = east. Subtype 2
    /// is the supersonic encoding with four times the velocity resolution.
    pub fn ground_speed(&self) -> Result<(f64, f64)> {
        if self.es_tc()? != 19 {
            return Err(BeastError::NotAvailable);
        }
        let subtype = self.raw.bits(38, 40);
        if subtype != 1 && subtype != 2 {
            return Err(BeastError::NotAvailable);
        }

        let vew = self.raw.bits(47, 56);
        let vns = self.raw.bits(58, 67);
        if vew == 0 || vns == 0 {
            return Err(BeastError::NotAvailable);
        }

        let mut v_ew = (vew - 1) as f64;
        let mut v_ns = (vns - 1) as f64;
        if subtype == 2 {
            v_ew *= 4.0;
            v_ns *= 4.0;
        }
        if self.raw.bit(46) == 1 {
            v_ew = -v_ew;
        }
        if self.raw.bit(57) == 1 {
            v_ns = -v_ns;
        }

        let velocity = (v_ew * v_ew + v_ns * v_ns).sqrt() * KNOT_TO_MPS;
        let track = v_ew.atan2(v_ns).to_degrees();
        Ok((velocity, track))
    }

    /// Vertical rate in m/s, negative when descending (DF 17/18, TC 19).
    pub fn vertical_speed(&self) -> Result<f64> {
        if self.es_tc()? != 19 {
            return Err(BeastError::NotAvailable);
        }
        let vr = self.raw.bits(70, 78);
        if vr == 0 {
            return Err(BeastError::NotAvailable);
        }

        let mut v = 64 * (vr as i64 - 1);
        if self.raw.bit(69) == 1 {
            v = -v;
        }
        Ok(v as f64 * FEET_PER_MIN_TO_MPS)
    }

    /// Ground movement speed in m/s and track angle in degrees for surface
    /// position squitters (DF 17/18, TC 5..8).
    pub fn surface_speed(&self) -> Result<(f64, f64)> {
        let tc = self.es_tc()?;
        if !(5..=8).contains(&tc) {
            return Err(BeastError::NotAvailable);
        }

        let velocity = decode_movement(self.raw.bits(38, 44))?;
        if self.raw.bit(45) != 1 {
            return Err(BeastError::NotAvailable);
        }
        let track = self.raw.bits(46, 52) as f64 * (360.0 / 128.0);
        Ok((velocity * KNOT_TO_MPS, track))
    }

    /// Aircraft type description from the emitter category of an
    /// identification squitter (DF 17/18, TC 1..4).
    pub fn aircraft_details(&self) -> Result<&'static str> {
        let tc = self.raw.tc()?;
        let cat = self.raw.cat()?;
        emitter_category(tc, cat).ok_or(BeastError::NotAvailable)
    }

    /// Type code of an extended squitter, or `NotAvailable` for other DFs.
    fn es_tc(&self) -> Result<u8> {
        match self.raw.df() {
            17 | 18 => self.raw.tc(),
            _ => Err(BeastError::NotAvailable),
        }
    }
}

/// Bit positions assembling the four octal squawk digits, MSB first.
const SQUAWK_BITS: [[usize; 3]; 4] = [[25, 23, 21], [31, 29, 27], [24, 22, 20], [32, 30, 28]];

// ---------------------------------------------------------------------------
// Altitude decoding
// ---------------------------------------------------------------------------

/// Decode the 13-bit altitude code of DF 0/4/16/20 into feet.
///
/// Bit order: C1 A1 C2 A2 C4 A4 M B1 Q B2 D2 B4 D4. The M bit selects
/// metric altitude (unsupported), the Q bit selects 25 ft resolution,
/// otherwise the code is a Gillham gray code with 100 ft resolution.
fn decode_ac13(ac: u16) -> Result<i32> {
    if ac & 0x0040 != 0 {
        return Err(BeastError::NotAvailable); // metric altitude
    }
    if ac & 0x0010 != 0 {
        let n = ((ac & 0x1F80) >> 2) | ((ac & 0x0020) >> 1) | (ac & 0x000F);
        return Ok(i32::from(n) * 25 - 1000);
    }
    decode_gillham(ac)
}

/// Decode the 12-bit extended squitter altitude code into feet.
///
/// Same layout as the 13-bit code with the M bit removed; re-insert a zero
/// M bit and reuse the 13-bit decode.
fn decode_ac12(ac: u16) -> Result<i32> {
    decode_ac13(((ac & 0x0FC0) << 1) | (ac & 0x003F))
}

/// Gillham gray-code altitude, 100 ft resolution.
fn decode_gillham(ac: u16) -> Result<i32> {
    if ac & 0x1500 == 0 {
        return Err(BeastError::NotAvailable); // illegal C bits
    }

    let mut h: i32 = 0;
    if ac & 0x1000 != 0 {
        h ^= 7; // C1
    }
    if ac & 0x0400 != 0 {
        h ^= 3; // C2
    }
    if ac & 0x0100 != 0 {
        h ^= 1; // C4
    }
    if h & 5 != 0 {
        h ^= 5;
    }
    if h > 5 {
        return Err(BeastError::NotAvailable); // illegal C bits
    }

    let mut f: i32 = 0;
    if ac & 0x0010 != 0 {
        f ^= 0x1FF; // D1, shares the Q bit position and is never set here
    }
    if ac & 0x0004 != 0 {
        f ^= 0x0FF; // D2
    }
    if ac & 0x0001 != 0 {
        f ^= 0x07F; // D4
    }
    if ac & 0x0800 != 0 {
        f ^= 0x03F; // A1
    }
    if ac & 0x0200 != 0 {
        f ^= 0x01F; // A2
    }
    if ac & 0x0080 != 0 {
        f ^= 0x00F; // A4
    }
    if ac & 0x0020 != 0 {
        f ^= 0x007; // B1
    }
    if ac & 0x0008 != 0 {
        f ^= 0x003; // B2
    }
    if ac & 0x0002 != 0 {
        f ^= 0x001; // B4
    }

    if f & 1 != 0 {
        h = 6 - h;
    }

    let altitude = 500 * f + 100 * h - 1300;
    if altitude < -1200 {
        return Err(BeastError::NotAvailable);
    }
    Ok(altitude)
}

// ---------------------------------------------------------------------------
// Surface movement
// ---------------------------------------------------------------------------

/// Decode the 7-bit surface movement field into knots.
///
/// The encoding is piecewise linear with resolution growing from 0.125 kt
/// near standstill to 5 kt at the top of the scale.
fn decode_movement(movement: u64) -> Result<f64> {
    match movement {
        0 => Err(BeastError::NotAvailable),
        1 => Ok(0.0), // stopped
        2..=8 => Ok(0.125 + 0.125 * (movement - 2) as f64),
        9..=12 => Ok(1.0 + 0.25 * (movement - 9) as f64),
        13..=38 => Ok(2.0 + 0.5 * (movement - 13) as f64),
        39..=93 => Ok(15.0 + (movement - 39) as f64),
        94..=108 => Ok(70.0 + 2.0 * (movement - 94) as f64),
        109..=123 => Ok(100.0 + 5.0 * (movement - 109) as f64),
        124 => Ok(175.0),
        _ => Err(BeastError::NotAvailable),
    }
}

// ---------------------------------------------------------------------------
// Emitter categories
// ---------------------------------------------------------------------------

/// Aircraft category description, keyed by (TC, CAT). TC 1 is reserved, as
/// are a handful of category values in the other sets.
fn emitter_category(tc: u8, cat: u8) -> Option<&'static str> {
    match (tc, cat) {
        (2..=4, 0) => Some("No category information"),
        (2, 1) => Some("Surface emergency vehicle"),
        (2, 3) => Some("Surface service vehicle"),
        (2, 4..=7) => Some("Ground obstruction"),
        (3, 1) => Some("Glider or sailplane"),
        (3, 2) => Some("Lighter-than-air"),
        (3, 3) => Some("Parachutist or skydiver"),
        (3, 4) => Some("Ultralight, hang-glider or paraglider"),
        (3, 6) => Some("Unmanned aerial vehicle"),
        (3, 7) => Some("Space or transatmospheric vehicle"),
        (4, 1) => Some("Light (< 7000 kg)"),
        (4, 2) => Some("Medium 1 (7000 to 34000 kg)"),
        (4, 3) => Some("Medium 2 (34000 to 136000 kg)"),
        (4, 4) => Some("High vortex aircraft"),
        (4, 5) => Some("Heavy (> 136000 kg)"),
        (4, 6) => Some("High performance, high speed"),
        (4, 7) => Some("Rotorcraft"),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
