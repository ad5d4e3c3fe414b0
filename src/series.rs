//! Per-signal series and the validity filters applied before a value is kept.
//!
//! Every accumulator returns whether the value was stored. A rejected value is
//! simply dropped, it is not an error.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::constants::{
    ALTITUDE_DIFFERENCE_RANGE, ALTITUDE_RANGE, BARO_CORRECTION_RANGE, GROUND_SPEED_RANGE,
    MODE_SYMBOLS, SELECTED_ALTITUDE_RANGE,
};
use crate::decode::SelectedAltitude;
use crate::entity::AircraftEntry;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub t: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AltitudeSource {
    Baro,
    Gnss,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AltitudeSample {
    pub t: f64,
    /// Feet.
    pub value: f64,
    pub source: AltitudeSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub t: f64,
    pub lat: f64,
    pub lon: f64,
}

fn within(range: &RangeInclusive<f64>, value: f64) -> bool {
    range.contains(&value)
}

/// Display name of an autopilot mode code, unknown codes pass through.
pub fn mode_name(code: char) -> String {
    MODE_SYMBOLS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_string())
}

impl AircraftEntry {
    pub fn add_altitude(&mut self, t: f64, value: f64, source: AltitudeSource) -> bool {
        if !within(&ALTITUDE_RANGE, value) {
            return false;
        }
        self.altitude.push(AltitudeSample { t, value, source });
        if source == AltitudeSource::Gnss {
            self.has_gnss_altitude = true;
        }
        true
    }

    pub fn add_speed(&mut self, t: f64, value: f64) -> bool {
        if !within(&GROUND_SPEED_RANGE, value) {
            return false;
        }
        self.speed.push(Sample { t, value });
        true
    }

    /// Store the selected altitude and merge its modes into `autopilot_modes`.
    ///
    /// Modes of an out of range selection are ignored as well.
    pub fn add_selected_altitude(&mut self, t: f64, selected: &SelectedAltitude) -> bool {
        if !within(&SELECTED_ALTITUDE_RANGE, selected.altitude) {
            return false;
        }
        self.selected_altitude.push(Sample {
            t,
            value: selected.altitude,
        });
        self.has_selected_altitude = true;
        self.autopilot_modes
            .extend(selected.modes.iter().copied().map(mode_name));
        true
    }

    /// GNSS minus barometric altitude. Its presence implies a GNSS fix.
    pub fn add_altitude_difference(&mut self, t: f64, value: f64) -> bool {
        if !within(&ALTITUDE_DIFFERENCE_RANGE, value) {
            return false;
        }
        self.altitude_difference.push(Sample { t, value });
        self.has_gnss_altitude = true;
        true
    }

    pub fn add_baro_correction(&mut self, t: f64, value: f64) -> bool {
        if !within(&BARO_CORRECTION_RANGE, value) {
            return false;
        }
        self.baro_correction.push(Sample { t, value });
        true
    }

    pub fn add_course(&mut self, t: f64, value: f64) {
        self.course.push(Sample { t, value });
    }

    pub fn add_track_angle(&mut self, t: f64, value: f64) {
        self.track_angle.push(Sample { t, value });
    }

    pub fn add_ground_track(&mut self, t: f64, angle: f64) {
        self.ground_track.push(Sample { t, value: angle });
    }

    pub fn add_air_heading(&mut self, t: f64, angle: f64) {
        self.air_heading.push(Sample { t, value: angle });
    }

    pub fn add_position(&mut self, t: f64, lat: f64, lon: f64) {
        self.positions.push(Position { t, lat, lon });
    }

    /// Keep the alphanumeric characters of `raw`. Last write wins, an empty
    /// result leaves the previous callsign alone.
    pub fn set_callsign(&mut self, raw: &str) -> bool {
        let cleaned: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if cleaned.is_empty() {
            return false;
        }
        self.callsign = Some(cleaned);
        true
    }
}
