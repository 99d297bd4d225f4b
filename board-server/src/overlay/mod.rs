//! Status overlay and estimated-time calculation.
//!
//! The static plan never changes per date; everything date-specific is
//! expressed through the sparse [`StopStatus`] overlay. This module
//! combines the two: given a stop and a target date it produces the
//! estimated times, the actual track and the cancellation flags, and
//! on top of that the candidate selection every live board uses
//! (calendar filter, "still ahead of now" filter, next-day carry-over,
//! intermediate-station enrichment).

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::{StationId, Stop, StopStatus, TrackId, TripId};
use crate::error::CoreError;
use crate::store::TimetableStore;

/// A stop with the overlay for one service date applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStop {
    pub stop: Stop,
    /// The service date this resolution is for.
    pub date: NaiveDate,
    /// Planned arrival plus active arrival delay, if the stop arrives.
    pub estimated_arrival: Option<NaiveDateTime>,
    /// Planned departure plus active departure delay, if it departs.
    pub estimated_departure: Option<NaiveDateTime>,
    /// Overlay's reassigned track if present, else the original.
    pub actual_track: TrackId,
    pub cancelled: bool,
    pub bus: bool,
    /// The delay minutes actually applied (arrival, departure).
    pub arrival_delay: i32,
    pub departure_delay: i32,
}

/// Combine a planned time-of-day with the service date and a delay.
///
/// The delay is pure timestamp arithmetic: a negative delay moves the
/// estimate earlier, a large one may cross midnight, and no calendar
/// date correction is applied beyond that.
fn estimate(date: NaiveDate, planned: Option<NaiveTime>, delay_minutes: i32) -> Option<NaiveDateTime> {
    planned.map(|t| date.and_time(t) + Duration::minutes(delay_minutes as i64))
}

/// Apply the overlay for `date` to a stop. Missing status means zero
/// deltas: the stop runs exactly as planned.
pub fn resolve(stop: &Stop, status: Option<&StopStatus>, date: NaiveDate) -> ResolvedStop {
    let arrival_delay = status.map_or(0, |s| s.arrival_delay);
    let departure_delay = status.map_or(0, |s| s.departure_delay);
    ResolvedStop {
        estimated_arrival: estimate(date, stop.arrival, arrival_delay),
        estimated_departure: estimate(date, stop.departure, departure_delay),
        actual_track: status.and_then(|s| s.track_id).unwrap_or(stop.track_id),
        cancelled: status.is_some_and(|s| s.cancelled),
        bus: status.is_some_and(|s| s.bus),
        arrival_delay,
        departure_delay,
        stop: stop.clone(),
        date,
    }
}

/// Whether the trip owning a stop operates on `date`, per its calendar.
pub fn trip_runs(
    store: &dyn TimetableStore,
    trip_id: &TripId,
    date: NaiveDate,
) -> Result<bool, CoreError> {
    let trip = store.trip(trip_id)?;
    let calendar = store.calendar(trip.service_id)?;
    Ok(calendar.runs_on_date(date))
}

/// Resolve the overlay for one stop on one date, fetching the status.
pub fn resolve_for_date(
    store: &dyn TimetableStore,
    stop: &Stop,
    date: NaiveDate,
) -> Result<ResolvedStop, CoreError> {
    let status = store.status(stop.id, date)?;
    Ok(resolve(stop, status.as_ref(), date))
}

/// All departing stops at a station on `date`: calendar-filtered,
/// overlay applied, sorted by estimated departure.
pub fn departures_for_date(
    store: &dyn TimetableStore,
    station: StationId,
    date: NaiveDate,
) -> Result<Vec<ResolvedStop>, CoreError> {
    let mut out = Vec::new();
    for stop in store.station_stops(station)? {
        if stop.departure.is_none() || !trip_runs(store, &stop.trip_id, date)? {
            continue;
        }
        out.push(resolve_for_date(store, &stop, date)?);
    }
    out.sort_by_key(|r| r.estimated_departure);
    Ok(out)
}

/// All arriving stops at a station on `date`, sorted by estimated arrival.
pub fn arrivals_for_date(
    store: &dyn TimetableStore,
    station: StationId,
    date: NaiveDate,
) -> Result<Vec<ResolvedStop>, CoreError> {
    let mut out = Vec::new();
    for stop in store.station_stops(station)? {
        if stop.arrival.is_none() || !trip_runs(store, &stop.trip_id, date)? {
            continue;
        }
        out.push(resolve_for_date(store, &stop, date)?);
    }
    out.sort_by_key(|r| r.estimated_arrival);
    Ok(out)
}

/// Today's departures whose estimated time has not yet passed.
///
/// A stop is a display candidate for departures only while
/// `estimated_departure >= now`; a 08:00 departure running 15 minutes
/// late stays on the board until 08:15.
pub fn upcoming_departures(
    store: &dyn TimetableStore,
    station: StationId,
    now: NaiveDateTime,
) -> Result<Vec<ResolvedStop>, CoreError> {
    let mut rows = departures_for_date(store, station, now.date())?;
    rows.retain(|r| r.estimated_departure.is_some_and(|t| t >= now));
    Ok(rows)
}

/// Today's arrivals whose estimated time has not yet passed.
pub fn upcoming_arrivals(
    store: &dyn TimetableStore,
    station: StationId,
    now: NaiveDateTime,
) -> Result<Vec<ResolvedStop>, CoreError> {
    let mut rows = arrivals_for_date(store, station, now.date())?;
    rows.retain(|r| r.estimated_arrival.is_some_and(|t| t >= now));
    Ok(rows)
}

/// End-of-day cutoff used when today has no remaining candidates.
fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).expect("valid time")
}

/// Station-wide departures with next-day carry-over.
///
/// Today's remaining candidates first; then tomorrow's occurrences
/// whose planned time-of-day is strictly earlier than the earliest
/// planned time still remaining today, so the board rolls over into
/// the next morning without a gap. Sorted by estimated time.
pub fn departures_with_carryover(
    store: &dyn TimetableStore,
    station: StationId,
    now: NaiveDateTime,
) -> Result<Vec<ResolvedStop>, CoreError> {
    let mut rows = upcoming_departures(store, station, now)?;
    let cutoff = rows
        .iter()
        .filter_map(|r| r.stop.departure)
        .min()
        .unwrap_or_else(end_of_day);

    let tomorrow = now.date() + Days::new(1);
    for row in departures_for_date(store, station, tomorrow)? {
        if row.stop.departure.is_some_and(|t| t < cutoff) {
            rows.push(row);
        }
    }
    rows.sort_by_key(|r| r.estimated_departure);
    Ok(rows)
}

/// Station-wide arrivals with next-day carry-over.
pub fn arrivals_with_carryover(
    store: &dyn TimetableStore,
    station: StationId,
    now: NaiveDateTime,
) -> Result<Vec<ResolvedStop>, CoreError> {
    let mut rows = upcoming_arrivals(store, station, now)?;
    let cutoff = rows
        .iter()
        .filter_map(|r| r.stop.arrival)
        .min()
        .unwrap_or_else(end_of_day);

    let tomorrow = now.date() + Days::new(1);
    for row in arrivals_for_date(store, station, tomorrow)? {
        if row.stop.arrival.is_some_and(|t| t < cutoff) {
            rows.push(row);
        }
    }
    rows.sort_by_key(|r| r.estimated_arrival);
    Ok(rows)
}

/// Station a stop's originally assigned track belongs to.
pub fn stop_station(store: &dyn TimetableStore, stop: &Stop) -> Result<StationId, CoreError> {
    crate::store::track_station(store, stop.track_id)
}

fn stop_station_name(store: &dyn TimetableStore, stop: &Stop) -> Result<String, CoreError> {
    let station = stop_station(store, stop)?;
    Ok(store.station(station)?.name)
}

/// Names of the stations called at after this stop on the same trip,
/// in sequence order, excluding the final destination (it headlines
/// the board row already).
pub fn downstream_names(
    store: &dyn TimetableStore,
    stop: &Stop,
) -> Result<Vec<String>, CoreError> {
    let trip = store.trip(&stop.trip_id)?;
    let route = store.route(&trip.route_id)?;
    let mut names = Vec::new();
    for later in store.trip_stops(&stop.trip_id)? {
        if later.sequence <= stop.sequence {
            continue;
        }
        let station = stop_station(store, &later)?;
        if station == route.final_station {
            continue;
        }
        names.push(store.station(station)?.name);
    }
    Ok(names)
}

/// Names of the stations called at before this stop, in sequence
/// order, excluding the origin (arrival boards headline it separately).
pub fn upstream_names(store: &dyn TimetableStore, stop: &Stop) -> Result<Vec<String>, CoreError> {
    let mut earlier: Vec<Stop> = store
        .trip_stops(&stop.trip_id)?
        .into_iter()
        .filter(|s| s.sequence < stop.sequence)
        .collect();
    if earlier.is_empty() {
        return Ok(Vec::new());
    }
    earlier.remove(0); // the origin
    earlier
        .iter()
        .map(|s| stop_station_name(store, s))
        .collect()
}

/// Name of the trip's origin station (first stop by sequence).
pub fn origin_name(
    store: &dyn TimetableStore,
    trip_id: &TripId,
) -> Result<Option<String>, CoreError> {
    let stops = store.trip_stops(trip_id)?;
    match stops.first() {
        Some(first) => Ok(Some(stop_station_name(store, first)?)),
        None => Ok(None),
    }
}
