//! Voice-announcement sessions.
//!
//! The announcement controller in the station hall keeps two feeds
//! open per station. The edit feed receives a payload only when an
//! operator edits a stop there, waking on the keepalive interval so a
//! dead transport is noticed within a minute. The data feed pushes the
//! current train list on a fixed cadence; the controller schedules its
//! scripted arrival and departure announcements from that list itself.

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::{StationId, Stop, StopId};
use crate::error::CoreError;
use crate::hub::VoiceHub;
use crate::overlay;
use crate::session::SessionConfig;
use crate::store::TimetableStore;

/// What the announcement controller needs to read a train out loud.
#[derive(Debug, Serialize)]
pub struct Announcement {
    pub id: StopId,
    pub train_type: String,
    pub train_number: String,
    pub origin_station: Option<String>,
    pub final_station: String,
    pub arrival_time: Option<String>,
    pub arrival_delay: i32,
    pub departure_time: Option<String>,
    pub is_cancelled: bool,
    pub bus: bool,
}

fn hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// The spoken part of a train number: the words after the leading
/// numeric designation ("1001 Bałtyk" is announced as "Bałtyk"), or
/// the whole number when that is all there is.
pub fn train_display_name(train_number: &str) -> String {
    let mut parts = train_number.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(_), Some(second)) => {
            let mut name = second.to_string();
            for part in parts {
                name.push(' ');
                name.push_str(part);
            }
            name
        }
        (Some(only), None) => only.to_string(),
        (None, _) => String::new(),
    }
}

/// Build the announcement for an edited stop, or `None` when the trip
/// does not run on `date` (no point announcing a train that is not
/// due today).
pub fn announcement(
    store: &dyn TimetableStore,
    stop_id: StopId,
    date: NaiveDate,
) -> Result<Option<Announcement>, CoreError> {
    let stop = store.stop(stop_id)?;
    if !overlay::trip_runs(store, &stop.trip_id, date)? {
        return Ok(None);
    }
    let resolved = overlay::resolve_for_date(store, &stop, date)?;
    let trip = store.trip(&stop.trip_id)?;
    let route = store.route(&trip.route_id)?;

    Ok(Some(Announcement {
        id: stop.id,
        train_type: route.kind.name,
        train_number: train_display_name(&route.train_number),
        origin_station: overlay::origin_name(store, &stop.trip_id)?,
        final_station: store.station(route.final_station)?.name,
        arrival_time: stop.arrival.map(hhmm),
        arrival_delay: resolved.arrival_delay,
        departure_time: stop.departure.map(hhmm),
        is_cancelled: resolved.cancelled,
        bus: resolved.bus,
    }))
}

/// How many minutes behind `now` the data feed still lists a train.
const LOOKBACK_MINUTES: i64 = 15;

/// Row cap of one data-feed payload.
const DATA_ROWS: usize = 20;

/// One row of the periodic data feed: everything the controller needs
/// to schedule a scripted announcement for the train.
#[derive(Debug, Serialize)]
pub struct VoiceDataRow {
    pub id: StopId,
    pub train_type: String,
    pub train_number: String,
    pub origin_station: Option<String>,
    pub final_station: String,
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_delay: i32,
    pub departure_delay: i32,
    pub platform: u32,
    pub track: String,
    pub stop_duration: i64,
    pub changed_track: bool,
    pub is_cancelled: bool,
    pub bus: bool,
}

/// Platform labels are Roman numerals on signage; announcements speak
/// them as plain numbers. Unknown characters count as zero.
pub fn roman_to_arabic(roman: &str) -> u32 {
    let value = |c: char| -> i64 {
        match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => 0,
        }
    };
    let mut total = 0i64;
    let mut prev = 0i64;
    for c in roman.chars().rev() {
        let v = value(c);
        if v < prev {
            total -= v;
        } else {
            total += v;
        }
        prev = v;
    }
    total.max(0) as u32
}

/// Planned dwell in minutes. A departure before the arrival means the
/// train stands over midnight.
fn dwell_minutes(stop: &Stop) -> i64 {
    match (stop.arrival, stop.departure) {
        (Some(arr), Some(dep)) => {
            let minutes = (dep - arr).num_minutes();
            if minutes < 0 { minutes + 24 * 60 } else { minutes }
        }
        _ => 0,
    }
}

/// Trains at `station` for the data feed: today's calendar-filtered
/// stops whose estimated arrival or departure is no further than the
/// lookback behind `now`, soonest first. Cancelled and bus-replaced
/// trains stay in the list with their flags set.
pub fn voice_data_rows(
    store: &dyn TimetableStore,
    station: StationId,
    now: NaiveDateTime,
) -> Result<Vec<VoiceDataRow>, CoreError> {
    let today = now.date();
    let horizon = now - chrono::Duration::minutes(LOOKBACK_MINUTES);

    let mut resolved = Vec::new();
    for stop in store.station_stops(station)? {
        if !overlay::trip_runs(store, &stop.trip_id, today)? {
            continue;
        }
        let r = overlay::resolve_for_date(store, &stop, today)?;
        if r.estimated_arrival.is_some_and(|t| t >= horizon)
            || r.estimated_departure.is_some_and(|t| t >= horizon)
        {
            resolved.push(r);
        }
    }
    resolved.sort_by_key(|r| r.estimated_arrival.or(r.estimated_departure));
    resolved.truncate(DATA_ROWS);

    let mut rows = Vec::with_capacity(resolved.len());
    for r in resolved {
        let trip = store.trip(&r.stop.trip_id)?;
        let route = store.route(&trip.route_id)?;
        let track = store.track(r.actual_track)?;
        let platform = store.platform(track.platform_id)?;
        rows.push(VoiceDataRow {
            id: r.stop.id,
            train_type: route.kind.name,
            train_number: train_display_name(&route.train_number),
            origin_station: overlay::origin_name(store, &r.stop.trip_id)?,
            final_station: store.station(route.final_station)?.name,
            arrival_time: r.stop.arrival.map(hhmm),
            departure_time: r.stop.departure.map(hhmm),
            arrival_delay: r.arrival_delay,
            departure_delay: r.departure_delay,
            platform: roman_to_arabic(&platform.number),
            track: track.number,
            stop_duration: dwell_minutes(&r.stop),
            changed_track: r.actual_track != r.stop.track_id,
            is_cancelled: r.cancelled,
            bus: r.bus,
        });
    }
    Ok(rows)
}

/// Drive one data-feed connection until its transport closes.
///
/// Read failures inside a cycle degrade to an empty list; the feed
/// retries on the next cycle rather than dying.
pub async fn run_voice_data_session(
    store: Arc<dyn TimetableStore>,
    config: SessionConfig,
    station: StationId,
    out: mpsc::Sender<String>,
) -> Result<(), CoreError> {
    // Fail fast on an unknown station rather than pushing forever.
    store.station(station)?;
    info!(%station, "voice data feed connected");

    loop {
        let now = Local::now().naive_local();
        let rows = match voice_data_rows(store.as_ref(), station, now) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(%station, error = %e, "voice data refresh failed");
                Vec::new()
            }
        };
        let text = serde_json::to_string(&rows)
            .map_err(|e| CoreError::Store(format!("payload: {e}")))?;
        if out.send(text).await.is_err() {
            info!(%station, "voice data feed disconnected");
            return Ok(());
        }
        tokio::time::sleep(config.data_refresh).await;
    }
}

/// Drive one announcement connection until its transport closes.
pub async fn run_voice_session(
    store: Arc<dyn TimetableStore>,
    voice: Arc<VoiceHub>,
    config: SessionConfig,
    station: StationId,
    out: mpsc::Sender<String>,
) -> Result<(), CoreError> {
    // Fail fast on an unknown station rather than listening forever.
    store.station(station)?;
    let mut subscription = voice.subscribe(station);
    info!(%station, "voice controller connected");

    loop {
        let stop_id = match tokio::time::timeout(config.keepalive, subscription.recv()).await {
            Ok(Some(stop_id)) => stop_id,
            Ok(None) => return Ok(()),
            // Keepalive tick; nothing to announce.
            Err(_) => continue,
        };
        debug!(%station, %stop_id, "announcing edited stop");

        let today = Local::now().date_naive();
        match announcement(store.as_ref(), stop_id, today) {
            Ok(Some(payload)) => {
                let text = serde_json::to_string(&payload)
                    .map_err(|e| CoreError::Store(format!("payload: {e}")))?;
                if out.send(text).await.is_err() {
                    info!(%station, "voice controller disconnected");
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(e) => warn!(%station, %stop_id, error = %e, "announcement failed"),
        }
    }
}
