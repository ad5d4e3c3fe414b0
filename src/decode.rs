//! Field extraction from downlink formats 11, 17 and 18.
//!
//! Everything the aggregation layer needs from a message goes through the
//! [`Decoder`] trait. Each call answers with a value or a [`DecodeError`] and
//! the caller decides whether the record is still worth anything without it.
//! [`ModeS`] is the bit-level implementation used by the binary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::cpr::decode_cpr;
use crate::crc;

/// Message bytes after the hex payload of a log line has been decoded.
#[derive(Clone, PartialEq, Eq)]
pub struct RawMessage(Vec<u8>);

impl RawMessage {
    pub fn new(bytes: Vec<u8>) -> Self {
        RawMessage(bytes)
    }

    /// Parse an even number of hex digits, any case.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.is_empty() || hex.len() % 2 != 0 || !hex.is_ascii() {
            return None;
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
            .collect::<Option<Vec<u8>>>()
            .map(RawMessage::new)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `len` bits starting at bit `start`, most significant bit first.
    pub fn bits(&self, start: usize, len: usize) -> u64 {
        let mut v = 0u64;
        for i in start..start + len {
            let byte = self.0.get(i / 8).copied().unwrap_or(0);
            v = (v << 1) | ((byte >> (7 - i % 8)) & 1) as u64;
        }
        v
    }
}

impl fmt::Display for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RawMessage({})", self)
    }
}

/// 24-bit transponder address, six uppercase hex digits.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn from_u32(addr: u32) -> Self {
        Address(format!("{:06X}", addr & 0xffffff))
    }

    /// Accepts exactly six hex digits in any case.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Address(s.to_ascii_uppercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a field could not be extracted from a message.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("unexpected message length of {0} bytes")]
    Length(usize),
    #[error("downlink format {0} does not carry this field")]
    Format(u8),
    #[error("parity check failed, syndrome {0:06x}")]
    Parity(u32),
    #[error("type code {0} does not carry this field")]
    TypeCode(u8),
    #[error("subtype {0} does not carry this field")]
    Subtype(u8),
    #[error("field not available")]
    NotAvailable,
    #[error("unsupported encoding: {0}")]
    Unsupported(&'static str),
}

pub type Decoded<T> = Result<T, DecodeError>;

/// CPR format bit of a position message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CprParity {
    Even,
    Odd,
}

impl CprParity {
    pub fn index(self) -> usize {
        match self {
            CprParity::Even => 0,
            CprParity::Odd => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SpeedType {
    Ground,
    Indicated,
    True,
}

/// Airborne velocity message content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity {
    pub subtype: u8,
    /// Knots.
    pub speed: Option<f64>,
    /// Track angle for ground speed, magnetic heading for airspeed. Degrees.
    pub angle: Option<f64>,
    /// Feet per minute.
    pub vertical_rate: Option<i32>,
    pub speed_type: SpeedType,
}

/// Target state selected altitude plus the raw autopilot mode codes.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedAltitude {
    pub altitude: f64,
    pub modes: Vec<char>,
}

/// What the aggregation layer asks of a message decoder.
pub trait Decoder {
    fn downlink_format(&self, msg: &RawMessage) -> Decoded<u8>;
    fn address(&self, msg: &RawMessage) -> Decoded<Address>;
    fn type_code(&self, msg: &RawMessage) -> Decoded<u8>;
    fn subtype(&self, msg: &RawMessage) -> Decoded<u8>;
    fn parity(&self, msg: &RawMessage) -> Decoded<CprParity>;
    /// Feet, barometric or GNSS depending on the type code.
    fn altitude(&self, msg: &RawMessage) -> Decoded<f64>;
    fn velocity(&self, msg: &RawMessage) -> Decoded<Velocity>;
    fn selected_altitude(&self, msg: &RawMessage) -> Decoded<SelectedAltitude>;
    fn altitude_difference(&self, msg: &RawMessage) -> Decoded<f64>;
    fn baro_pressure_setting(&self, msg: &RawMessage) -> Decoded<f64>;
    fn callsign(&self, msg: &RawMessage) -> Decoded<String>;
    fn resolve_position(
        &self,
        even: &RawMessage,
        t_even: f64,
        odd: &RawMessage,
        t_odd: f64,
    ) -> Option<(f64, f64)>;
    fn is_emergency(&self, msg: &RawMessage) -> Decoded<bool>;
    fn squawk(&self, msg: &RawMessage) -> Decoded<String>;
    fn is_tcas_ra(&self, msg: &RawMessage) -> Decoded<bool>;

    fn ground_speed(&self, msg: &RawMessage) -> Decoded<f64> {
        self.velocity(msg)?.speed.ok_or(DecodeError::NotAvailable)
    }
}

/// Decodes real 56 and 112 bit Mode-S frames.
#[derive(Clone, Copy, Debug)]
pub struct ModeS {
    verify_crc: bool,
}

impl Default for ModeS {
    fn default() -> Self {
        ModeS::new(true)
    }
}

fn is_airborne_position(tc: u8) -> bool {
    (9..=18).contains(&tc) || (20..=22).contains(&tc)
}

/// Four octal digits out of a 13-bit identity field laid out
/// C1 A1 C2 A2 C4 A4 X B1 D1 B2 D2 B4 D4.
fn squawk_digits(id13: u64) -> String {
    let bit = |i: u32| ((id13 >> (12 - i)) & 1) as u32;
    let a = bit(5) * 4 + bit(3) * 2 + bit(1);
    let b = bit(11) * 4 + bit(9) * 2 + bit(7);
    let c = bit(4) * 4 + bit(2) * 2 + bit(0);
    let d = bit(12) * 4 + bit(10) * 2 + bit(8);
    format!("{}{}{}{}", a, b, c, d)
}

impl ModeS {
    pub fn new(verify_crc: bool) -> Self {
        ModeS { verify_crc }
    }

    /// Checks the message is a full extended squitter and returns its type code.
    fn extended(&self, msg: &RawMessage) -> Decoded<u8> {
        let df = self.downlink_format(msg)?;
        if df != 17 && df != 18 {
            return Err(DecodeError::Format(df));
        }
        if msg.len() != constants::MODES_LONG_MSG_BYTES {
            return Err(DecodeError::Length(msg.len()));
        }
        Ok(msg.bits(32, 5) as u8)
    }

    fn expect_type(&self, msg: &RawMessage, accept: impl Fn(u8) -> bool) -> Decoded<u8> {
        let tc = self.extended(msg)?;
        if accept(tc) { Ok(tc) } else { Err(DecodeError::TypeCode(tc)) }
    }

    /// Target state and status, version 2 layout only.
    fn target_state(&self, msg: &RawMessage) -> Decoded<()> {
        self.expect_type(msg, |tc| tc == 29)?;
        match msg.bits(37, 2) as u8 {
            1 => Ok(()),
            sub => Err(DecodeError::Subtype(sub)),
        }
    }

    fn raw_position(&self, msg: &RawMessage, want: CprParity) -> Option<(u32, u32)> {
        if self.parity(msg).ok()? != want {
            return None;
        }
        Some((msg.bits(54, 17) as u32, msg.bits(71, 17) as u32))
    }
}

impl Decoder for ModeS {
    fn downlink_format(&self, msg: &RawMessage) -> Decoded<u8> {
        match msg.len() {
            constants::MODES_SHORT_MSG_BYTES | constants::MODES_LONG_MSG_BYTES => {
                Ok((msg.bits(0, 5) as u8).min(24))
            }
            n => Err(DecodeError::Length(n)),
        }
    }

    fn address(&self, msg: &RawMessage) -> Decoded<Address> {
        let df = self.downlink_format(msg)?;
        let expected = match df {
            11 => constants::MODES_SHORT_MSG_BYTES,
            17 | 18 => constants::MODES_LONG_MSG_BYTES,
            _ => return Err(DecodeError::Format(df)),
        };
        if msg.len() != expected {
            return Err(DecodeError::Length(msg.len()));
        }

        if self.verify_crc {
            let syndrome = crc::syndrome(msg.as_bytes());
            // DF11 parity carries the interrogator code on top of the CRC.
            let ok = if df == 11 { syndrome < 80 } else { syndrome == 0 };
            if !ok {
                return Err(DecodeError::Parity(syndrome));
            }
        }

        Ok(Address::from_u32(msg.bits(8, 24) as u32))
    }

    fn type_code(&self, msg: &RawMessage) -> Decoded<u8> {
        self.extended(msg)
    }

    fn subtype(&self, msg: &RawMessage) -> Decoded<u8> {
        self.extended(msg)?;
        Ok(msg.bits(37, 3) as u8)
    }

    fn parity(&self, msg: &RawMessage) -> Decoded<CprParity> {
        self.expect_type(msg, is_airborne_position)?;
        if msg.bits(53, 1) == 1 {
            Ok(CprParity::Odd)
        } else {
            Ok(CprParity::Even)
        }
    }

    fn altitude(&self, msg: &RawMessage) -> Decoded<f64> {
        let tc = self.expect_type(msg, is_airborne_position)?;
        let field = msg.bits(40, 12);
        if field == 0 {
            return Err(DecodeError::NotAvailable);
        }

        if tc >= 20 {
            return Ok(field as f64 * constants::FEET_PER_METER);
        }

        if msg.bits(47, 1) == 0 {
            return Err(DecodeError::Unsupported("gillham coded altitude"));
        }
        let n = (msg.bits(40, 7) << 4) | msg.bits(48, 4);
        Ok(n as f64 * 25.0 - 1000.0)
    }

    fn velocity(&self, msg: &RawMessage) -> Decoded<Velocity> {
        self.expect_type(msg, |tc| tc == 19)?;
        let subtype = msg.bits(37, 3) as u8;
        let factor = if subtype == 2 || subtype == 4 { 4.0 } else { 1.0 };

        let vr_raw = msg.bits(69, 9) as i32;
        let vertical_rate = if vr_raw == 0 {
            None
        } else {
            let sign = if msg.bits(68, 1) == 1 { -1 } else { 1 };
            Some(sign * (vr_raw - 1) * 64)
        };

        match subtype {
            1 | 2 => {
                let ew_raw = msg.bits(46, 10);
                let ns_raw = msg.bits(57, 10);
                if ew_raw == 0 || ns_raw == 0 {
                    return Err(DecodeError::NotAvailable);
                }

                let mut v_we = (ew_raw - 1) as f64 * factor;
                let mut v_sn = (ns_raw - 1) as f64 * factor;
                if msg.bits(45, 1) == 1 {
                    v_we = -v_we;
                }
                if msg.bits(56, 1) == 1 {
                    v_sn = -v_sn;
                }

                let mut track = v_we.atan2(v_sn).to_degrees();
                if track < 0.0 {
                    track += 360.0;
                }

                Ok(Velocity {
                    subtype,
                    speed: Some(v_we.hypot(v_sn)),
                    angle: Some(track),
                    vertical_rate,
                    speed_type: SpeedType::Ground,
                })
            }
            3 | 4 => {
                let heading = if msg.bits(45, 1) == 1 {
                    Some(msg.bits(46, 10) as f64 * 360.0 / 1024.0)
                } else {
                    None
                };
                let as_raw = msg.bits(57, 10);
                let speed = if as_raw == 0 {
                    None
                } else {
                    Some((as_raw - 1) as f64 * factor)
                };
                let speed_type = if msg.bits(56, 1) == 1 {
                    SpeedType::True
                } else {
                    SpeedType::Indicated
                };

                Ok(Velocity {
                    subtype,
                    speed,
                    angle: heading,
                    vertical_rate,
                    speed_type,
                })
            }
            _ => Err(DecodeError::Subtype(subtype)),
        }
    }

    fn selected_altitude(&self, msg: &RawMessage) -> Decoded<SelectedAltitude> {
        self.target_state(msg)?;
        let raw = msg.bits(41, 11);
        if raw == 0 {
            return Err(DecodeError::NotAvailable);
        }

        let mut modes = Vec::new();
        if msg.bits(78, 1) == 1 {
            let flags = [(79, 'U'), (80, 'M'), (81, '/'), (83, 'P'), (84, 'T'), (85, 'F')];
            for (bit, code) in flags {
                if msg.bits(bit, 1) == 1 {
                    modes.push(code);
                }
            }
        }
        if msg.bits(61, 1) == 1 {
            modes.push('C');
        }

        Ok(SelectedAltitude {
            altitude: (raw - 1) as f64 * 32.0,
            modes,
        })
    }

    fn altitude_difference(&self, msg: &RawMessage) -> Decoded<f64> {
        self.expect_type(msg, |tc| tc == 19)?;
        let raw = msg.bits(81, 7);
        if raw == 0 || raw == 127 {
            return Err(DecodeError::NotAvailable);
        }
        let sign = if msg.bits(80, 1) == 1 { -1.0 } else { 1.0 };
        Ok(sign * (raw - 1) as f64 * 25.0)
    }

    fn baro_pressure_setting(&self, msg: &RawMessage) -> Decoded<f64> {
        self.target_state(msg)?;
        let raw = msg.bits(52, 9);
        if raw == 0 {
            return Err(DecodeError::NotAvailable);
        }
        Ok(800.0 + (raw - 1) as f64 * 0.8)
    }

    fn callsign(&self, msg: &RawMessage) -> Decoded<String> {
        self.expect_type(msg, |tc| (1..=4).contains(&tc))?;
        let charset = constants::AIS_CHARSET.as_bytes();
        Ok((0..8)
            .map(|i| charset[msg.bits(40 + 6 * i, 6) as usize] as char)
            .collect())
    }

    fn resolve_position(
        &self,
        even: &RawMessage,
        t_even: f64,
        odd: &RawMessage,
        t_odd: f64,
    ) -> Option<(f64, f64)> {
        let (lat0, lon0) = self.raw_position(even, CprParity::Even)?;
        let (lat1, lon1) = self.raw_position(odd, CprParity::Odd)?;
        decode_cpr((lat0, lon0, t_even), (lat1, lon1, t_odd))
    }

    fn is_emergency(&self, msg: &RawMessage) -> Decoded<bool> {
        self.expect_type(msg, |tc| tc == 28)?;
        match msg.bits(37, 3) as u8 {
            1 => Ok(msg.bits(40, 3) == 1),
            sub => Err(DecodeError::Subtype(sub)),
        }
    }

    fn squawk(&self, msg: &RawMessage) -> Decoded<String> {
        self.expect_type(msg, |tc| tc == 28)?;
        match msg.bits(37, 3) as u8 {
            1 => Ok(squawk_digits(msg.bits(43, 13))),
            sub => Err(DecodeError::Subtype(sub)),
        }
    }

    fn is_tcas_ra(&self, msg: &RawMessage) -> Decoded<bool> {
        self.expect_type(msg, |tc| tc == 28)?;
        Ok(msg.bits(37, 3) == 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn msg(hex: &str) -> RawMessage {
        RawMessage::from_hex(hex).unwrap()
    }

    #[test]
    fn test_getbits() {
        let m = msg("8D4840D6");
        assert_eq!(m.bits(0, 5), 17);
        assert_eq!(m.bits(5, 3), 5);
        assert_eq!(m.bits(8, 24), 0x4840D6);
        assert_eq!(m.bits(28, 4), 6);
    }

    #[rstest]
    #[case("")]
    #[case("8D4")]
    #[case("8D4G")]
    fn test_from_hex_rejects(#[case] hex: &str) {
        assert!(RawMessage::from_hex(hex).is_none());
    }

    #[test]
    fn test_from_hex_any_case() {
        assert_eq!(msg("8d4840d6"), msg("8D4840D6"));
        assert_eq!(msg("8d4840d6").to_string(), "8D4840D6");
    }

    #[rstest]
    #[case("4840d6", Some("4840D6"))]
    #[case(" ABC123 ", Some("ABC123"))]
    #[case("ABC12", None)]
    #[case("ABC12Z", None)]
    fn test_address_parse(#[case] inp: &str, #[case] out: Option<&str>) {
        assert_eq!(Address::parse(inp).as_ref().map(Address::as_str), out);
    }

    #[rstest]
    #[case("8D4840D6202CC371C32CE0576098", 17, "4840D6", Some(4))]
    #[case("8D40621D58C382D690C8AC2863A7", 17, "40621D", Some(11))]
    #[case("8DABC123F80000000000004180CE", 17, "ABC123", Some(31))]
    #[case("5D40621D4F94D0", 11, "40621D", None)]
    fn test_header(
        #[case] hex: &str,
        #[case] df: u8,
        #[case] addr: &str,
        #[case] tc: Option<u8>,
    ) {
        let d = ModeS::default();
        let m = msg(hex);
        assert_eq!(d.downlink_format(&m), Ok(df));
        assert_eq!(d.address(&m).unwrap().as_str(), addr);
        assert_eq!(d.type_code(&m).ok(), tc);
    }

    #[test]
    fn test_short_df17_is_rejected() {
        let d = ModeS::default();
        let m = msg("8D4840D6202CC3");
        assert_eq!(d.address(&m), Err(DecodeError::Length(7)));
        assert_eq!(d.downlink_format(&msg("8D4840")), Err(DecodeError::Length(3)));
    }

    #[test]
    fn test_parity_failure() {
        let m = msg("8D4840D6202CC371C32CE0576099");
        assert!(matches!(ModeS::default().address(&m), Err(DecodeError::Parity(_))));
        assert_eq!(ModeS::new(false).address(&m).unwrap().as_str(), "4840D6");
    }

    #[test]
    fn test_callsign() {
        let d = ModeS::default();
        assert_eq!(d.callsign(&msg("8D4840D6202CC371C32CE0576098")).unwrap(), "KLM1023 ");
        assert_eq!(
            d.callsign(&msg("8D40621D58C382D690C8AC2863A7")),
            Err(DecodeError::TypeCode(11))
        );
    }

    #[test]
    fn test_position_fields() {
        let d = ModeS::default();
        let even = msg("8D40621D58C382D690C8AC2863A7");
        let odd = msg("8D40621D58C386435CC412692AD6");
        assert_eq!(d.altitude(&even), Ok(38000.0));
        assert_eq!(d.parity(&even), Ok(CprParity::Even));
        assert_eq!(d.parity(&odd), Ok(CprParity::Odd));

        let (lat, lon) = d.resolve_position(&even, 1.0, &odd, 2.0).unwrap();
        assert!((lat - 52.26578).abs() < 1e-4);
        assert!((lon - 3.93891).abs() < 1e-4);

        // Halves handed over in the wrong slots.
        assert!(d.resolve_position(&odd, 1.0, &even, 2.0).is_none());
    }

    #[rstest]
    #[case("8DABC12358010000000000FBED8B", -1000.0)]
    #[case("8DABC123580340000000002CE626", -500.0)]
    #[case("8DABC12358FF8000000000C63F34", 50000.0)]
    #[case("8DABC12358B5000000000048ED1F", 35000.0)]
    fn test_baro_altitude(#[case] hex: &str, #[case] ft: f64) {
        assert_eq!(ModeS::default().altitude(&msg(hex)), Ok(ft));
    }

    #[test]
    fn test_gnss_altitude() {
        let alt = ModeS::default().altitude(&msg("8DABC123A0BB80000000002EB1B8")).unwrap();
        assert!((alt - 9842.52).abs() < 0.01);
    }

    #[test]
    fn test_ground_speed_velocity() {
        let d = ModeS::default();
        let m = msg("8D485020994409940838175B284F");
        let v = d.velocity(&m).unwrap();
        assert_eq!(v.subtype, 1);
        assert_eq!(v.speed_type, SpeedType::Ground);
        assert!((v.speed.unwrap() - 159.20).abs() < 0.01);
        assert!((v.angle.unwrap() - 182.88).abs() < 0.01);
        assert_eq!(v.vertical_rate, Some(-832));
        assert!((d.ground_speed(&m).unwrap() - 159.20).abs() < 0.01);
        assert_eq!(d.altitude_difference(&m), Ok(550.0));
    }

    #[test]
    fn test_airspeed_velocity() {
        let d = ModeS::default();
        let m = msg("8DA05F219B06B6AF189400CBC33F");
        let v = d.velocity(&m).unwrap();
        assert_eq!(v.subtype, 3);
        assert_eq!(v.speed_type, SpeedType::True);
        assert_eq!(v.speed, Some(375.0));
        assert!((v.angle.unwrap() - 243.984375).abs() < 1e-9);
        assert_eq!(v.vertical_rate, Some(-2304));
        assert_eq!(d.altitude_difference(&m), Err(DecodeError::NotAvailable));
    }

    #[test]
    fn test_altitude_difference() {
        let d = ModeS::default();
        assert_eq!(d.altitude_difference(&msg("8DA0B59D990849B660043ED519F7")), Ok(1525.0));
    }

    #[rstest]
    #[case("8DAC04C5E11A1A00000000A82488", "3611", false)]
    #[case("8DABC123E108080000000008AC4B", "1200", false)]
    #[case("8DABC123E10818000000003800AB", "1201", false)]
    #[case("8DABC123E10AAA0000000000CB33", "7700", false)]
    #[case("8DABC123E12AAA00000000A4BDEA", "7700", true)]
    fn test_status(#[case] hex: &str, #[case] squawk: &str, #[case] emergency: bool) {
        let d = ModeS::default();
        let m = msg(hex);
        assert_eq!(d.squawk(&m).unwrap(), squawk);
        assert_eq!(d.is_emergency(&m), Ok(emergency));
        assert_eq!(d.is_tcas_ra(&m), Ok(false));
    }

    #[test]
    fn test_tcas_ra() {
        let d = ModeS::default();
        let m = msg("8DABC123E2000000000000DD619F");
        assert_eq!(d.is_tcas_ra(&m), Ok(true));
        assert_eq!(d.squawk(&m), Err(DecodeError::Subtype(2)));
    }

    #[rstest]
    #[case("8DA682EFEA4A5867A95C080D2065", 1013.6, vec!['C'])]
    #[case("8DABC123EA4A5858000340D1E0D5", 1012.8, vec!['U', '/'])]
    #[case("8DABC123EA4A585C00028C74D5E3", 1012.8, vec!['M', 'T', 'F', 'C'])]
    fn test_target_state(#[case] hex: &str, #[case] baro: f64, #[case] modes: Vec<char>) {
        let d = ModeS::default();
        let m = msg(hex);
        let sel = d.selected_altitude(&m).unwrap();
        assert_eq!(sel.altitude, 38016.0);
        assert_eq!(sel.modes, modes);
        assert!((d.baro_pressure_setting(&m).unwrap() - baro).abs() < 1e-6);
    }

    #[test]
    fn test_df11_has_no_type_code() {
        let d = ModeS::default();
        assert_eq!(d.type_code(&msg("5D40621D4F94D0")), Err(DecodeError::Format(11)));
    }
}
