//! Routing of decoded records to the accumulators of their aircraft.
//!
//! Only downlink formats 11, 17 and 18 are used. DF11 replies only feed the
//! acquisition series, everything else comes from the extended squitter type
//! code. A field the decoder cannot provide is skipped, the rest of the record
//! is still processed.

use std::collections::BTreeMap;

use tracing::{debug, info, trace};

use crate::config::Config;
use crate::decode::{Address, Decoder, RawMessage, SpeedType};
use crate::entity::{AircraftEntry, Category, EntityStore};
use crate::episode::StatusClass;
use crate::pairing::PairOutcome;
use crate::series::AltitudeSource;

/// Counters kept over a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RouterStats {
    pub records: u64,
    /// Not DF 11, 17 or 18.
    pub wrong_format: u64,
    /// Dropped because the format, address or type code could not be decoded.
    pub rejected: u64,
    /// Extended squitters of other aircraft than the target.
    pub filtered: u64,
    /// Single fields the decoder could not provide.
    pub missing_fields: u64,
    pub positions: u64,
    pub stale_pairs: u64,
    pub arrivals: BTreeMap<Category, u64>,
}

impl RouterStats {
    fn arrival(&mut self, entry: &mut AircraftEntry, category: Category, t: f64) {
        entry.record_arrival(category, t);
        *self.arrivals.entry(category).or_default() += 1;
    }

    pub fn log(&self) {
        info!(
            "{} records, {} other formats, {} rejected, {} filtered, {} missing fields",
            self.records, self.wrong_format, self.rejected, self.filtered, self.missing_fields
        );
        info!("{} positions resolved, {} stale pairs", self.positions, self.stale_pairs);
        for (category, count) in &self.arrivals {
            info!("{}: {}", category, count);
        }
    }
}

pub struct Router<D: Decoder> {
    decoder: D,
    config: Config,
    target: Option<Address>,
    target_seen: bool,
    stats: RouterStats,
}

impl<D: Decoder> Router<D> {
    pub fn new(decoder: D, config: Config, target: Option<Address>) -> Self {
        Router {
            decoder,
            config,
            target,
            target_seen: false,
            stats: RouterStats::default(),
        }
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    /// Whether any extended squitter of the target was routed. Always true without a target.
    pub fn target_seen(&self) -> bool {
        self.target.is_none() || self.target_seen
    }

    /// Process one record.
    pub fn route(&mut self, store: &mut EntityStore, t: f64, msg: &RawMessage) {
        self.stats.records += 1;

        let df = match self.decoder.downlink_format(msg) {
            Ok(df) => df,
            Err(e) => {
                trace!("{}: {}", msg, e);
                self.stats.rejected += 1;
                return;
            }
        };

        match df {
            11 => match self.decoder.address(msg) {
                Ok(addr) => {
                    let entry = store.get_or_create(&addr);
                    self.stats.arrival(entry, Category::Acquisition, t);
                }
                Err(e) => {
                    trace!("DF11 {}: {}", msg, e);
                    self.stats.rejected += 1;
                }
            },
            17 | 18 => self.route_extended(store, t, msg),
            _ => self.stats.wrong_format += 1,
        }
    }

    fn route_extended(&mut self, store: &mut EntityStore, t: f64, msg: &RawMessage) {
        let addr = match self.decoder.address(msg) {
            Ok(addr) => addr,
            Err(e) => {
                trace!("{}: {}", msg, e);
                self.stats.rejected += 1;
                return;
            }
        };

        if let Some(target) = &self.target {
            if *target != addr {
                self.stats.filtered += 1;
                return;
            }
            self.target_seen = true;
        }

        let entry = store.touch(&addr, t);

        let tc = match self.decoder.type_code(msg) {
            Ok(tc) => tc,
            Err(e) => {
                trace!("{} {}: {}", addr, msg, e);
                self.stats.rejected += 1;
                return;
            }
        };
        trace!("{} tc {} at {}", addr, tc, t);

        match tc {
            1..=4 => {
                self.stats.arrival(entry, Category::Identification, t);
                match self.decoder.callsign(msg) {
                    Ok(cs) => {
                        entry.set_callsign(&cs);
                    }
                    Err(_) => self.stats.missing_fields += 1,
                }
            }
            5..=8 => self.stats.arrival(entry, Category::SurfacePosition, t),
            9..=18 => {
                self.stats.arrival(entry, Category::AirbornePosition, t);
                self.altitude(entry, t, msg, AltitudeSource::Baro);
                self.pair_position(entry, t, msg);
            }
            19 => self.velocity(entry, t, msg),
            20..=22 => {
                self.stats.arrival(entry, Category::AirbornePosition, t);
                self.altitude(entry, t, msg, AltitudeSource::Gnss);
            }
            28 => self.status(entry, t, msg),
            29 => {
                self.stats.arrival(entry, Category::TargetState, t);
                match self.decoder.selected_altitude(msg) {
                    Ok(sel) => {
                        entry.add_selected_altitude(t, &sel);
                    }
                    Err(_) => self.stats.missing_fields += 1,
                }
                match self.decoder.baro_pressure_setting(msg) {
                    Ok(qnh) => {
                        entry.add_baro_correction(t, qnh);
                    }
                    Err(_) => self.stats.missing_fields += 1,
                }
            }
            31 => match self.decoder.subtype(msg) {
                Ok(0) => self.stats.arrival(entry, Category::OperationalStatusAir, t),
                Ok(1) => self.stats.arrival(entry, Category::OperationalStatusSurface, t),
                _ => self.stats.missing_fields += 1,
            },
            _ => (),
        }
    }

    fn altitude(&mut self, entry: &mut AircraftEntry, t: f64, msg: &RawMessage, source: AltitudeSource) {
        match self.decoder.altitude(msg) {
            Ok(alt) => {
                entry.add_altitude(t, alt, source);
            }
            Err(_) => self.stats.missing_fields += 1,
        }
    }

    fn pair_position(&mut self, entry: &mut AircraftEntry, t: f64, msg: &RawMessage) {
        let parity = match self.decoder.parity(msg) {
            Ok(p) => p,
            Err(_) => {
                self.stats.missing_fields += 1;
                return;
            }
        };

        let decoder = &self.decoder;
        let outcome = entry.cpr.offer(
            parity,
            msg.clone(),
            t,
            self.config.cpr_pair_window,
            |even, t_even, odd, t_odd| decoder.resolve_position(even, t_even, odd, t_odd),
        );

        match outcome {
            PairOutcome::Resolved { lat, lon } => {
                debug!("{} position {:.5} {:.5} at {}", entry.address, lat, lon, t);
                entry.add_position(t, lat, lon);
                self.stats.positions += 1;
            }
            PairOutcome::Stale(gap) => {
                trace!("{} CPR halves {:.1}s apart", entry.address, gap);
                self.stats.stale_pairs += 1;
            }
            PairOutcome::Unresolved => trace!("{} CPR pair not resolved", entry.address),
            PairOutcome::Waiting => (),
        }
    }

    fn velocity(&mut self, entry: &mut AircraftEntry, t: f64, msg: &RawMessage) {
        self.stats.arrival(entry, Category::Velocity, t);

        match self.decoder.velocity(msg) {
            Ok(v) => {
                trace!("{} {:?} vertical rate {:?}", entry.address, v.speed_type, v.vertical_rate);
                if let Some(angle) = v.angle {
                    match v.subtype {
                        1 | 2 => entry.add_ground_track(t, angle),
                        3 | 4 => entry.add_air_heading(t, angle),
                        _ => (),
                    }
                    if v.speed_type == SpeedType::Ground {
                        entry.add_track_angle(t, angle);
                    }
                    entry.add_course(t, angle);
                }
            }
            Err(_) => self.stats.missing_fields += 1,
        }

        if let Ok(speed) = self.decoder.ground_speed(msg) {
            entry.add_speed(t, speed);
        }

        match self.decoder.altitude_difference(msg) {
            Ok(diff) => {
                entry.add_altitude_difference(t, diff);
            }
            Err(_) => self.stats.missing_fields += 1,
        }
    }

    fn status(&mut self, entry: &mut AircraftEntry, t: f64, msg: &RawMessage) {
        if let Ok(true) = self.decoder.is_tcas_ra(msg) {
            self.stats.arrival(entry, Category::TcasRa, t);
            return;
        }

        let code = match self.decoder.squawk(msg) {
            Ok(code) => code,
            Err(_) => {
                self.stats.missing_fields += 1;
                return;
            }
        };
        let emergency = self.decoder.is_emergency(msg).unwrap_or(false);

        let class = entry.squawk.observe(
            t,
            &code,
            emergency,
            self.config.squawk_change_window,
            &self.config.reserved_squawks,
        );

        match class {
            StatusClass::Emergency => self.stats.arrival(entry, Category::Emergency, t),
            StatusClass::Status { mode_change } => {
                self.stats.arrival(entry, Category::Status, t);
                if mode_change {
                    self.stats.arrival(entry, Category::ModeChange, t);
                }
            }
        }
    }
}
