//! Per-display-kind board queries.
//!
//! A display's kind is fixed when it connects; the kinds form a closed
//! set and each owns its candidate query, filter and row shape. The
//! session loop stays identical across kinds, it only calls
//! [`BoardKind::compute`] each cycle.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{PlatformId, StationId, TrackId};
use crate::error::CoreError;
use crate::overlay::{self, ResolvedStop};
use crate::store::{self, TimetableStore};

/// Lookahead for the entrance and edge displays: a train is only worth
/// announcing at the platform entrance once it is nearly due.
const LOOKAHEAD_MINUTES: i64 = 20;

/// Rows shown on the platform-aggregate display.
const PLATFORM_ROWS: usize = 3;

/// Rows shown on the station-wide boards.
const STATION_ROWS: usize = 10;

/// What a display shows, selected once at connection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardKind {
    /// Departures from all tracks of one platform.
    Platform(PlatformId),
    /// Next train per track, shown at the platform entrance.
    Entrance(PlatformId),
    /// Station-wide departure board.
    Departures(StationId),
    /// Station-wide arrival board.
    Arrivals(StationId),
    /// Single-track edge display at the platform edge.
    Edge(TrackId),
}

/// One computed refresh: the payload to send and the soonest estimated
/// event among the displayed rows (drives the next wait).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub payload: Value,
    pub next_event: Option<NaiveDateTime>,
}

impl BoardSnapshot {
    /// The payload that blanks a display.
    pub fn empty() -> Self {
        Self {
            payload: Value::Array(Vec::new()),
            next_event: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct PlatformRow {
    station: Option<String>,
    departure_time: Option<String>,
    departure_delay: i32,
    track: String,
    train_type: String,
    intermediate: Vec<String>,
    train_number: String,
    is_cancelled: bool,
    bus: bool,
}

#[derive(Debug, Serialize)]
struct EntranceRow {
    station: Option<String>,
    departure_time: Option<String>,
    departure_delay: i32,
    track: String,
    train_type: String,
    train_number: String,
    intermediate: Vec<String>,
}

#[derive(Debug, Serialize)]
struct StationRow {
    station: Option<String>,
    time: Option<String>,
    delay: i32,
    #[serde(rename = "platform/track")]
    location: String,
    train_type: String,
    intermediate: Vec<String>,
    train_number: String,
    carrier: String,
    is_cancelled: bool,
    bus: bool,
}

#[derive(Debug, Serialize)]
struct EdgeRow {
    station: Option<String>,
    departure_time: Option<String>,
    departure_delay: i32,
    train_type: String,
    train_number: String,
    carrier: String,
    intermediate: Vec<String>,
}

fn hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

fn to_snapshot<T: Serialize>(rows: &T, next_event: Option<NaiveDateTime>) -> Result<BoardSnapshot, CoreError> {
    let payload =
        serde_json::to_value(rows).map_err(|e| CoreError::Store(format!("payload: {e}")))?;
    Ok(BoardSnapshot {
        payload,
        next_event,
    })
}

/// `"{platform}/{track}"` label for the actual track of a row.
fn location_label(store: &dyn TimetableStore, track: TrackId) -> Result<String, CoreError> {
    let track = store.track(track)?;
    let platform = store.platform(track.platform_id)?;
    Ok(format!("{}/{}", platform.number, track.number))
}

impl BoardKind {
    /// The station whose updates this display must listen for.
    pub fn station(&self, store: &dyn TimetableStore) -> Result<StationId, CoreError> {
        match *self {
            BoardKind::Platform(p) | BoardKind::Entrance(p) => store::platform_station(store, p),
            BoardKind::Departures(s) | BoardKind::Arrivals(s) => {
                // Validate early so a bad id closes the connection
                // instead of looping on an empty board.
                store.station(s)?;
                Ok(s)
            }
            BoardKind::Edge(t) => store::track_station(store, t),
        }
    }

    /// Compute one refresh of this board from fresh store reads.
    pub fn compute(
        &self,
        store: &dyn TimetableStore,
        now: NaiveDateTime,
    ) -> Result<BoardSnapshot, CoreError> {
        match *self {
            BoardKind::Platform(p) => platform_board(store, p, now),
            BoardKind::Entrance(p) => entrance_board(store, p, now),
            BoardKind::Departures(s) => departures_board(store, s, now),
            BoardKind::Arrivals(s) => arrivals_board(store, s, now),
            BoardKind::Edge(t) => edge_board(store, t, now),
        }
    }
}

fn final_station_name(
    store: &dyn TimetableStore,
    row: &ResolvedStop,
) -> Result<Option<String>, CoreError> {
    let trip = store.trip(&row.stop.trip_id)?;
    let route = store.route(&trip.route_id)?;
    Ok(Some(store.station(route.final_station)?.name))
}

/// Departures whose actual track lies on the platform, first three.
/// Cancelled and bus-substituted trains stay on the board with their
/// flags set; travellers should see the cancellation, not a blank row.
fn platform_board(
    store: &dyn TimetableStore,
    platform: PlatformId,
    now: NaiveDateTime,
) -> Result<BoardSnapshot, CoreError> {
    let station = store::platform_station(store, platform)?;
    let candidates = overlay::upcoming_departures(store, station, now)?;

    let mut rows = Vec::new();
    let mut next_event = None;
    for r in candidates {
        if store.track(r.actual_track)?.platform_id != platform {
            continue;
        }
        let trip = store.trip(&r.stop.trip_id)?;
        let route = store.route(&trip.route_id)?;
        if next_event.is_none() {
            next_event = r.estimated_departure;
        }
        rows.push(PlatformRow {
            station: Some(store.station(route.final_station)?.name),
            departure_time: r.stop.departure.map(hhmm),
            departure_delay: r.departure_delay,
            track: store.track(r.actual_track)?.number,
            train_type: route.kind.code,
            intermediate: overlay::downstream_names(store, &r.stop)?,
            train_number: route.train_number,
            is_cancelled: r.cancelled,
            bus: r.bus,
        });
        if rows.len() >= PLATFORM_ROWS {
            break;
        }
    }
    to_snapshot(&rows, next_event)
}

/// Next train per track of the platform within the lookahead window.
fn entrance_board(
    store: &dyn TimetableStore,
    platform: PlatformId,
    now: NaiveDateTime,
) -> Result<BoardSnapshot, CoreError> {
    let station = store::platform_station(store, platform)?;
    let limit = now + Duration::minutes(LOOKAHEAD_MINUTES);
    let candidates = overlay::upcoming_departures(store, station, now)?;

    let mut rows = Vec::new();
    let mut next_event: Option<NaiveDateTime> = None;
    for track in store.station_tracks(station)? {
        if track.platform_id != platform {
            continue;
        }
        let next = candidates.iter().find(|r| {
            r.actual_track == track.id
                && !r.cancelled
                && !r.bus
                && r.estimated_departure.is_some_and(|t| t <= limit)
        });
        let Some(r) = next else { continue };
        let trip = store.trip(&r.stop.trip_id)?;
        let route = store.route(&trip.route_id)?;
        next_event = match (next_event, r.estimated_departure) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        rows.push(EntranceRow {
            station: Some(store.station(route.final_station)?.name),
            departure_time: r.stop.departure.map(hhmm),
            departure_delay: r.departure_delay,
            track: track.number,
            train_type: route.kind.code,
            train_number: route.train_number,
            intermediate: Vec::new(),
        });
    }
    to_snapshot(&rows, next_event)
}

/// Station-wide departures with next-day carry-over, first ten.
fn departures_board(
    store: &dyn TimetableStore,
    station: StationId,
    now: NaiveDateTime,
) -> Result<BoardSnapshot, CoreError> {
    let candidates = overlay::departures_with_carryover(store, station, now)?;

    let mut rows = Vec::new();
    let mut next_event = None;
    for r in candidates.iter().take(STATION_ROWS) {
        let trip = store.trip(&r.stop.trip_id)?;
        let route = store.route(&trip.route_id)?;
        if next_event.is_none() {
            next_event = r.estimated_departure;
        }
        rows.push(StationRow {
            station: final_station_name(store, r)?,
            time: r.stop.departure.map(hhmm),
            delay: r.departure_delay,
            location: location_label(store, r.actual_track)?,
            train_type: route.kind.code,
            intermediate: overlay::downstream_names(store, &r.stop)?,
            train_number: route.train_number,
            carrier: route.carrier.code,
            is_cancelled: r.cancelled,
            bus: r.bus,
        });
    }
    to_snapshot(&rows, next_event)
}

/// Station-wide arrivals with carry-over; the headline name is the
/// trip's origin, not its destination.
fn arrivals_board(
    store: &dyn TimetableStore,
    station: StationId,
    now: NaiveDateTime,
) -> Result<BoardSnapshot, CoreError> {
    let candidates = overlay::arrivals_with_carryover(store, station, now)?;

    let mut rows = Vec::new();
    let mut next_event = None;
    for r in candidates.iter().take(STATION_ROWS) {
        let trip = store.trip(&r.stop.trip_id)?;
        let route = store.route(&trip.route_id)?;
        if next_event.is_none() {
            next_event = r.estimated_arrival;
        }
        rows.push(StationRow {
            station: overlay::origin_name(store, &r.stop.trip_id)?,
            time: r.stop.arrival.map(hhmm),
            delay: r.arrival_delay,
            location: location_label(store, r.actual_track)?,
            train_type: route.kind.code,
            intermediate: overlay::upstream_names(store, &r.stop)?,
            train_number: route.train_number,
            carrier: route.carrier.code,
            is_cancelled: r.cancelled,
            bus: r.bus,
        });
    }
    to_snapshot(&rows, next_event)
}

/// The one next departure on this track within the lookahead window.
/// Full kind and carrier names; the edge display has room for them.
fn edge_board(
    store: &dyn TimetableStore,
    track: TrackId,
    now: NaiveDateTime,
) -> Result<BoardSnapshot, CoreError> {
    let station = store::track_station(store, track)?;
    let limit = now + Duration::minutes(LOOKAHEAD_MINUTES);
    let candidates = overlay::upcoming_departures(store, station, now)?;

    let next = candidates.into_iter().find(|r| {
        r.actual_track == track
            && !r.cancelled
            && !r.bus
            && r.estimated_departure.is_some_and(|t| t <= limit)
    });
    let Some(r) = next else {
        return Ok(BoardSnapshot::empty());
    };

    let trip = store.trip(&r.stop.trip_id)?;
    let route = store.route(&trip.route_id)?;
    let row = EdgeRow {
        station: Some(store.station(route.final_station)?.name),
        departure_time: r.stop.departure.map(hhmm),
        departure_delay: r.departure_delay,
        train_type: route.kind.name,
        train_number: route.train_number,
        carrier: route.carrier.name,
        intermediate: overlay::downstream_names(store, &r.stop)?,
    };
    to_snapshot(&row, r.estimated_departure)
}
