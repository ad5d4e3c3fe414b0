//! Text views over a finished [`EntityStore`].

use chrono::DateTime;
use tabled::{builder::Builder, settings::Style};

use crate::entity::{AircraftEntry, EntityStore};
use crate::interval::{analyze, IntervalProfile};

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub address: String,
    pub callsign: Option<String>,
    pub first_seen: f64,
    pub last_seen: f64,
    pub messages: u64,
    pub coordinates: bool,
    pub course: bool,
    pub selected_altitude: bool,
    pub altitude_difference: bool,
    pub baro_correction: bool,
    pub gnss: bool,
}

impl SummaryRow {
    /// `None` for addresses only heard through DF11 replies.
    pub fn from_entry(e: &AircraftEntry) -> Option<Self> {
        Some(SummaryRow {
            address: e.address.as_str().to_string(),
            callsign: e.callsign.clone(),
            first_seen: e.first_seen?,
            last_seen: e.last_seen?,
            messages: e.message_count,
            coordinates: !e.positions.is_empty(),
            course: !e.course.is_empty(),
            selected_altitude: e.has_selected_altitude,
            altitude_difference: !e.altitude_difference.is_empty(),
            baro_correction: !e.baro_correction.is_empty(),
            gnss: e.has_gnss_altitude,
        })
    }
}

pub fn summary_rows(store: &EntityStore) -> Vec<SummaryRow> {
    store.iter().filter_map(SummaryRow::from_entry).collect()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// `YYYY-MM-DD HH:MM:SS.nnnnnnnnn` in UTC.
pub fn format_utc_nanos(ts: f64) -> String {
    let mut secs = ts.floor();
    let mut nanos = ((ts - secs) * 1e9).round();
    if nanos >= 1e9 {
        secs += 1.0;
        nanos = 0.0;
    }

    match DateTime::from_timestamp(secs as i64, nanos as u32) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.9f").to_string(),
        None => "N/A".to_string(),
    }
}

pub fn render_summary(rows: &[SummaryRow]) -> String {
    let header = vec![
        "Address",
        "Callsign",
        "First (UTC)",
        "Last (UTC)",
        "Messages",
        "Coordinates",
        "Course",
        "Sel. altitude",
        "Alt. difference",
        "Baro corr.",
        "GNSS",
    ];

    let mut builder = Builder::default();
    builder.push_record(header);

    for r in rows {
        let row = vec![
            r.address.clone(),
            r.callsign.clone().unwrap_or_else(|| "N/A".to_string()),
            format_utc_nanos(r.first_seen),
            format_utc_nanos(r.last_seen),
            r.messages.to_string(),
            yes_no(r.coordinates).to_string(),
            yes_no(r.course).to_string(),
            yes_no(r.selected_altitude).to_string(),
            yes_no(r.altitude_difference).to_string(),
            yes_no(r.baro_correction).to_string(),
            yes_no(r.gnss).to_string(),
        ];
        builder.push_record(row);
    }

    let table = builder.build().with(Style::modern()).to_string();
    format!("{}\nTotal aircraft: {}\n", table, rows.len())
}

/// Interval distribution of every profile for one aircraft.
pub fn render_intervals(entry: &AircraftEntry, profiles: &[IntervalProfile]) -> String {
    let header = vec!["Profile", "Band (ms)", "Count", "Min (ms)", "Max (ms)", "Low", "In band", "High", "Bins"];

    let mut builder = Builder::default();
    builder.push_record(header);

    for p in profiles {
        let band = format!("{:.0}..={:.0}", p.lower(), p.upper());
        let row = match analyze(entry.arrivals(p.category), p) {
            Some(d) => vec![
                p.name.clone(),
                band,
                d.count.to_string(),
                format!("{:.1}", d.min_ms),
                format!("{:.1}", d.max_ms),
                d.low.to_string(),
                d.in_band().to_string(),
                d.high.to_string(),
                d.middle
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
            ],
            None => {
                let mut row = vec![p.name.clone(), band, "no data".to_string()];
                row.resize(9, String::new());
                row
            }
        };
        builder.push_record(row);
    }

    let callsign = entry.callsign.as_deref().unwrap_or("N/A");
    let table = builder.build().with(Style::rounded()).to_string();
    format!("{} ({})\n{}\n", entry.address, callsign, table)
}
