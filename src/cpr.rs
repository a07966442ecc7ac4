//! Compact Position Reporting — recover latitude/longitude from CPR fields.
//!
//! Two decode modes:
//! - Local: single report + reference position within ~180 NM (airborne) or
//!   ~45 NM (surface) of the true position.
//! - Global: even/odd report pair; the caller tracks which arrived last.
//!
//! Airborne reports span 360° latitude zones, surface reports span 90°, so a
//! globally decoded surface position still needs a reference point to select
//! among the zone candidates.

use serde::Serialize;

use crate::types::{BeastError, Result};

/// An extended squitter compact position report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cpr {
    /// Number of encoded bits per coordinate.
    pub nb: u8,
    /// Time flag.
    pub t: u8,
    /// Format flag: 0 = even frame, 1 = odd frame.
    pub f: u8,
    /// Encoded latitude.
    pub lat: u32,
    /// Encoded longitude.
    pub lon: u32,
}

/// A decoded geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Position {
        Position {
            latitude,
            longitude,
        }
    }
}

/// 2^17, the CPR coordinate scale.
const CPR_MAX: f64 = 131072.0;

impl Cpr {
    /// Decode to a global position by comparison with a reference point
    /// assumed within one latitude zone of the true position.
    pub fn decode_local(&self, reference: Position, airborne: bool) -> Result<Position> {
        if !(-90.0..=90.0).contains(&reference.latitude) {
            return Err(BeastError::CprFailed(
                "latitude out of range (-90 to 90)".into(),
            ));
        }
        if !(-180.0..=190.0).contains(&reference.longitude) {
            return Err(BeastError::CprFailed(
                "longitude out of range (-180 to 180)".into(),
            ));
        }

        let latc = f64::from(self.lat) / CPR_MAX;
        let lonc = f64::from(self.lon) / CPR_MAX;
        let f = f64::from(self.f);
        let zone = if airborne { 360.0 } else { 90.0 };

        let dlat = zone / (60.0 - f);
        let j = (reference.latitude / dlat).floor()
            + (mod_floor(reference.latitude, dlat) / dlat - latc + 0.5).floor();
        let latitude = dlat * (j + latc);

        let zones = f64::from(nl(latitude)) - f;
        let dlon = if zones == 0.0 { zone } else { zone / zones };
        let m = (reference.longitude / dlon).floor()
            + (mod_floor(reference.longitude, dlon) / dlon - lonc + 0.5).floor();
        let longitude = dlon * (m + lonc);

        Ok(Position::new(latitude, longitude))
    }
}

/// Decode a global position from an even/odd pair of reports.
///
/// `c1` and `c2` are in reception order: `c2` arrived last and anchors the
/// decoded position (recency cannot be derived from the reports themselves).
/// The reports must share the same bit width and differ in format flag.
/// Surface pairs additionally need `reference` to pick among the 90° zone
/// candidates; without it the decode fails.
pub fn decode_global_position(
    c1: &Cpr,
    c2: &Cpr,
    airborne: bool,
    reference: Option<Position>,
) -> Result<Position> {
    if c1.nb != c2.nb {
        return Err(BeastError::CprFailed("bit encoding must be equal".into()));
    }
    if c1.f == c2.f {
        return Err(BeastError::CprFailed("format must be different".into()));
    }

    // even_last: the even-format report is the more recent of the pair
    let (even, odd, even_last) = if c1.f == 0 {
        (c1, c2, false)
    } else {
        (c2, c1, true)
    };

    let lat0 = f64::from(even.lat) / CPR_MAX;
    let lon0 = f64::from(even.lon) / CPR_MAX;
    let lat1 = f64::from(odd.lat) / CPR_MAX;
    let lon1 = f64::from(odd.lon) / CPR_MAX;

    let zone = if airborne { 360.0 } else { 90.0 };
    let dlat0 = zone / 60.0;
    let dlat1 = zone / 59.0;

    let j = (59.0 * lat0 - 60.0 * lat1 + 0.5).floor();

    let mut rlat0 = dlat0 * (mod_floor(j, 60.0) + lat0);
    if rlat0 >= 270.0 {
        rlat0 -= 360.0;
    }
    let mut rlat1 = dlat1 * (mod_floor(j, 59.0) + lat1);
    if rlat1 >= 270.0 {
        rlat1 -= 360.0;
    }

    if nl(rlat0) != nl(rlat1) {
        return Err(BeastError::CprFailed(
            "positions cross latitude boundary".into(),
        ));
    }

    let (latitude, zones, lonc) = if even_last {
        (rlat0, f64::from(nl(rlat0)), lon0)
    } else {
        (rlat1, f64::from(nl(rlat1)), lon1)
    };
    let ni = if even_last {
        zones.max(1.0)
    } else {
        (zones - 1.0).max(1.0)
    };
    let dlon = zone / ni;

    let m = (lon0 * (zones - 1.0) - lon1 * zones).round();
    let mut longitude = dlon * (mod_floor(m, ni) + lonc);
    if longitude >= 180.0 {
        longitude -= 360.0;
    }

    let position = Position::new(latitude, longitude);
    if airborne {
        return Ok(position);
    }
    let Some(reference) = reference else {
        return Err(BeastError::CprFailed(
            "surface decoding requires a reference position".into(),
        ));
    };
    Ok(adjust_surface(position, reference))
}

/// A surface report pins each coordinate only within a 90° zone. Pick the
/// candidate closest to the reference, weighting longitude differences by
/// the latitude circle radius.
fn adjust_surface(position: Position, reference: Position) -> Position {
    let weight = (reference.latitude * std::f64::consts::PI / 180.0).cos();

    let mut longitude = position.longitude;
    let mut best = f64::INFINITY;
    for k in -4i32..=4 {
        let mut cand = position.longitude + f64::from(k) * 90.0;
        if cand > 180.0 {
            cand -= 360.0;
        } else if cand < -180.0 {
            cand += 360.0;
        }
        let diff = ((reference.longitude - cand) * weight).abs();
        if diff < best {
            best = diff;
            longitude = cand;
        }
    }

    let mut latitude = position.latitude;
    let mut best = f64::INFINITY;
    for k in -2i32..=2 {
        let cand = (position.latitude + f64::from(k) * 90.0).clamp(-90.0, 90.0);
        let diff = (reference.latitude - cand).abs();
        if diff < best {
            best = diff;
            latitude = cand;
        }
    }

    Position::new(latitude, longitude)
}

/// Floor modulo: non-negative for positive divisors regardless of the sign
/// of the dividend.
fn mod_floor(a: f64, b: f64) -> f64 {
    a - b * (a / b).floor()
}

// ---------------------------------------------------------------------------
// Longitude zone table
// ---------------------------------------------------------------------------

/// Latitude thresholds of the longitude zone table, indexed by NL − 2.
///
/// Fixed constants rather than the closed-form expression: recomputing them
/// at runtime can shift a latitude sitting exactly on a threshold into the
/// neighboring zone.
const NL_THRESHOLDS: [f64; 58] = [
    87.0,        // NL 2
    86.53536998, // NL 3
    85.75541621, // NL 4
    84.89166191, // NL 5
    83.99173563, // NL 6
    83.07199445, // NL 7
    82.13956981, // NL 8
    81.19801349, // NL 9
    80.24923213, // NL 10
    79.29428225, // NL 11
    78.33374083, // NL 12
    77.36789461, // NL 13
    76.39684391, // NL 14
    75.42056257, // NL 15
    74.43893416, // NL 16
    73.45177442, // NL 17
    72.45884545, // NL 18
    71.45986473, // NL 19
    70.45451075, // NL 20
    69.44242631, // NL 21
    68.42322022, // NL 22
    67.39646774, // NL 23
    66.36171008, // NL 24
    65.3184531,  // NL 25
    64.26616523, // NL 26
    63.20427479, // NL 27
    62.13216659, // NL 28
    61.04917774, // NL 29
    59.95459277, // NL 30
    58.84763776, // NL 31
    57.72747354, // NL 32
    56.59318756, // NL 33
    55.44378444, // NL 34
    54.27817472, // NL 35
    53.09516153, // NL 36
    51.89342469, // NL 37
    50.67150166, // NL 38
    49.42776439, // NL 39
    48.16039128, // NL 40
    46.86733252, // NL 41
    45.54626723, // NL 42
    44.19454951, // NL 43
    42.80914012, // NL 44
    41.38651832, // NL 45
    39.92256684, // NL 46
    38.41241892, // NL 47
    36.85025108, // NL 48
    35.22899598, // NL 49
    33.53993436, // NL 50
    31.77209708, // NL 51
    29.91135686, // NL 52
    27.9389871,  // NL 53
    25.82924707, // NL 54
    23.54504487, // NL 55
    21.02939493, // NL 56
    18.18626357, // NL 57
    14.82817437, // NL 58
    10.4704713,  // NL 59
];

/// Longitude zone count at a latitude, 1 at the poles to 59 at the equator.
pub fn nl(lat: f64) -> u8 {
    let lat = lat.abs();
    let mut zone: u8 = 59;
    while zone > 1 {
        if lat <= NL_THRESHOLDS[usize::from(zone) - 2] {
            return zone;
        }
        zone -= 1;
    }
    1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
