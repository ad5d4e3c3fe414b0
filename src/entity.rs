use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::EnumIter;
use tracing::debug;

use crate::decode::Address;
use crate::episode::SquawkWindow;
use crate::pairing::CprPairSlots;
use crate::series::{AltitudeSample, Position, Sample};

/// Message categories whose arrival times are kept for periodicity analysis.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Category {
    AirbornePosition,
    SurfacePosition,
    Identification,
    Velocity,
    Status,
    Emergency,
    ModeChange,
    TcasRa,
    TargetState,
    OperationalStatusAir,
    OperationalStatusSurface,
    /// DF11 all-call replies.
    Acquisition,
}

/// Everything observed for one transponder address during a run.
#[derive(Debug, Clone, Serialize)]
pub struct AircraftEntry {
    pub address: Address,
    /// First extended squitter seen. DF11 replies alone leave this unset.
    pub first_seen: Option<f64>,
    pub last_seen: Option<f64>,
    /// Extended squitters accepted for this address.
    pub message_count: u64,
    /// Last identification received, alphanumeric characters only.
    pub callsign: Option<String>,
    /// Display names of every autopilot mode ever reported. Never shrinks.
    pub autopilot_modes: BTreeSet<String>,

    // Series in arrival order. Sort before use.
    pub altitude: Vec<AltitudeSample>,
    pub speed: Vec<Sample>,
    pub positions: Vec<Position>,
    pub course: Vec<Sample>,
    pub track_angle: Vec<Sample>,
    pub selected_altitude: Vec<Sample>,
    pub altitude_difference: Vec<Sample>,
    pub baro_correction: Vec<Sample>,
    /// Track angle from ground speed velocity messages.
    pub ground_track: Vec<Sample>,
    /// Heading from airspeed velocity messages.
    pub air_heading: Vec<Sample>,

    pub arrivals: BTreeMap<Category, Vec<f64>>,

    pub has_selected_altitude: bool,
    pub has_gnss_altitude: bool,

    #[serde(skip)]
    pub(crate) cpr: CprPairSlots,
    #[serde(skip)]
    pub(crate) squawk: SquawkWindow,
}

impl AircraftEntry {
    pub fn new(address: Address) -> Self {
        AircraftEntry {
            address,
            first_seen: None,
            last_seen: None,
            message_count: 0,
            callsign: None,
            autopilot_modes: BTreeSet::new(),
            altitude: Vec::new(),
            speed: Vec::new(),
            positions: Vec::new(),
            course: Vec::new(),
            track_angle: Vec::new(),
            selected_altitude: Vec::new(),
            altitude_difference: Vec::new(),
            baro_correction: Vec::new(),
            ground_track: Vec::new(),
            air_heading: Vec::new(),
            arrivals: BTreeMap::new(),
            has_selected_altitude: false,
            has_gnss_altitude: false,
            cpr: CprPairSlots::default(),
            squawk: SquawkWindow::default(),
        }
    }

    /// Account for one extended squitter at time `t`.
    pub fn touch(&mut self, t: f64) {
        if self.first_seen.is_none() {
            self.first_seen = Some(t);
        }
        self.last_seen = Some(match self.last_seen {
            Some(last) => last.max(t),
            None => t,
        });
        self.message_count += 1;
    }

    pub fn record_arrival(&mut self, category: Category, t: f64) {
        self.arrivals.entry(category).or_default().push(t);
    }

    /// Arrival times of `category`, empty when none were seen.
    pub fn arrivals(&self, category: Category) -> &[f64] {
        self.arrivals.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One entry per address seen during the run, ordered by address.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct EntityStore {
    entries: BTreeMap<Address, AircraftEntry>,
}

impl EntityStore {
    pub fn new() -> Self {
        EntityStore::default()
    }

    /// Initialize a new entry if none is found.
    pub fn get_or_create(&mut self, address: &Address) -> &mut AircraftEntry {
        self.entries.entry(address.clone()).or_insert_with(|| {
            debug!("new aircraft {}", address);
            AircraftEntry::new(address.clone())
        })
    }

    /// `get_or_create` followed by [`AircraftEntry::touch`].
    pub fn touch(&mut self, address: &Address, t: f64) -> &mut AircraftEntry {
        let entry = self.get_or_create(address);
        entry.touch(t);
        entry
    }

    pub fn get(&self, address: &Address) -> Option<&AircraftEntry> {
        self.entries.get(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AircraftEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut store = EntityStore::new();
        store.get_or_create(&addr("40621D")).record_arrival(Category::Acquisition, 1.0);
        store.get_or_create(&addr("40621d")).record_arrival(Category::Acquisition, 2.0);

        assert_eq!(store.len(), 1);
        let entry = store.get(&addr("40621D")).unwrap();
        assert_eq!(entry.arrivals(Category::Acquisition), &[1.0, 2.0]);
        assert_eq!(entry.first_seen, None);
        assert_eq!(entry.message_count, 0);
    }

    #[test]
    fn test_touch() {
        let mut store = EntityStore::new();
        let a = addr("ABC123");
        store.touch(&a, 10.0);
        store.touch(&a, 12.5);
        store.touch(&a, 11.0);

        let entry = store.get(&a).unwrap();
        assert_eq!(entry.first_seen, Some(10.0));
        assert_eq!(entry.last_seen, Some(12.5));
        assert_eq!(entry.message_count, 3);
    }

    #[test]
    fn test_missing_category_is_empty() {
        let entry = AircraftEntry::new(addr("ABC123"));
        assert!(entry.arrivals(Category::TcasRa).is_empty());
    }

    #[test]
    fn test_iter_sorted_by_address() {
        let mut store = EntityStore::new();
        for a in ["C00001", "A00001", "B00001"] {
            store.get_or_create(&addr(a));
        }
        let order: Vec<&str> = store.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(order, vec!["A00001", "B00001", "C00001"]);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::OperationalStatusAir.to_string(), "operational-status-air");
        assert_eq!(Category::TcasRa.to_string(), "tcas-ra");
    }
}
