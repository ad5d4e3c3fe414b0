//! Fixed values shared by the decoder and the accumulators.

use std::ops::RangeInclusive;

pub const MODES_SHORT_MSG_BYTES: usize = 7;
pub const MODES_LONG_MSG_BYTES: usize = 14;
pub const MODES_LONG_MSG_BITS: usize = 112;

/// Maximum gap between the even and odd CPR halves of one position.
pub const CPR_PAIR_WINDOW_SECS: f64 = 10.0;

/// How long a squawk transition keeps classifying status messages as mode-change.
pub const SQUAWK_CHANGE_WINDOW_SECS: f64 = 24.5;

/// Normal, hijack, radio failure and emergency codes. A switch to one of these
/// never opens a mode-change episode.
pub const RESERVED_SQUAWKS: [&str; 4] = ["1000", "7500", "7600", "7700"];

// Validity filters, all bounds inclusive.
pub const ALTITUDE_RANGE: RangeInclusive<f64> = -1000.0..=50000.0;
pub const GROUND_SPEED_RANGE: RangeInclusive<f64> = 0.0..=1000.0;
pub const SELECTED_ALTITUDE_RANGE: RangeInclusive<f64> = -2000.0..=50000.0;
pub const ALTITUDE_DIFFERENCE_RANGE: RangeInclusive<f64> = -2500.0..=2500.0;
pub const BARO_CORRECTION_RANGE: RangeInclusive<f64> = 800.0..=1100.0;

/// Autopilot mode codes as emitted by the decoder and their display names.
pub const MODE_SYMBOLS: [(char, &str); 7] = [
    ('U', "AP"),
    ('/', "ALT"),
    ('M', "VNAV"),
    ('F', "LNAV"),
    ('P', "APP"),
    ('T', "TCAS"),
    ('C', "HDG"),
];

/// Number of equal-width bins the middle bucket of an interval histogram is split into.
pub const HISTOGRAM_BINS: usize = 15;

/// 6-bit character set of the identification message.
pub const AIS_CHARSET: &str = "?ABCDEFGHIJKLMNOPQRSTUVWXYZ????? ???????????????0123456789??????";

pub const FEET_PER_METER: f64 = 3.28084;
