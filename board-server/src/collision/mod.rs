//! Track occupancy and collision detection.
//!
//! Works on minute-of-day integers (0–1439). Each train occupies its
//! track for a half-open window: `[arrival, departure)` when both
//! times are known, a fixed 5-minute dwell when only one is. Windows
//! spanning midnight are split at the day boundary. The edit path and
//! the track-availability query both go through [`eligible_tracks`]
//! before a reassignment is committed.

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::domain::{StopId, Track, TrackId};
use crate::error::CoreError;
use crate::overlay;
use crate::store::TimetableStore;

/// Minutes in a day; windows never extend past this after splitting.
const MINUTES_PER_DAY: u16 = 1440;

/// Dwell assumed when only one of arrival/departure is known.
const DEFAULT_DWELL_MINUTES: u16 = 5;

/// Half-open occupancy window `[start, end)` in minutes-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: u16,
    end: u16,
}

impl Window {
    fn overlaps(self, other: Window) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }
}

/// Occupancy windows for one train on one track.
///
/// No times → no windows (the side occupies nothing). A window whose
/// end is numerically before its start spans midnight and is split
/// into `[start, 1440)` and `[0, end)`.
fn occupancy(arrival: Option<u16>, departure: Option<u16>) -> Vec<Window> {
    let (start, end) = match (arrival, departure) {
        (None, None) => return Vec::new(),
        (Some(arr), Some(dep)) => (arr, dep),
        (Some(arr), None) => (arr, arr + DEFAULT_DWELL_MINUTES),
        (None, Some(dep)) => (dep, dep + DEFAULT_DWELL_MINUTES),
    };

    if end < start {
        vec![
            Window {
                start,
                end: MINUTES_PER_DAY,
            },
            Window { start: 0, end },
        ]
    } else {
        vec![Window { start, end }]
    }
}

/// Do two trains' occupancy windows on the same track collide?
///
/// Symmetric; a side without any window never collides with anything.
pub fn is_collision(
    a_arrival: Option<u16>,
    a_departure: Option<u16>,
    b_arrival: Option<u16>,
    b_departure: Option<u16>,
) -> bool {
    let a = occupancy(a_arrival, a_departure);
    let b = occupancy(b_arrival, b_departure);
    a.iter().any(|wa| b.iter().any(|wb| wa.overlaps(*wb)))
}

/// Planned time plus delay, wrapped into a minute-of-day.
pub fn minute_of_day(planned: NaiveTime, delay_minutes: i32) -> u16 {
    let minutes = (planned.hour() * 60 + planned.minute()) as i32 + delay_minutes;
    minutes.rem_euclid(MINUTES_PER_DAY as i32) as u16
}

/// A track the target stop could be reassigned to without conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleTrack {
    pub track: Track,
    pub platform_number: String,
    /// Minute-of-day of the next train arriving on this track at or
    /// after the target's departure, if any; how long the track stays
    /// yours after you leave.
    pub next_arrival: Option<u16>,
}

/// All tracks at the stop's station on which the stop could stand on
/// `date` without colliding with another live train.
///
/// Occupancy is evaluated against each train's *actual* track (overlay
/// applied) with delays folded into the minutes; cancelled and
/// bus-substituted trains do not occupy rail track capacity and are
/// skipped, as are trips not running on `date`.
pub fn eligible_tracks(
    store: &dyn TimetableStore,
    stop_id: StopId,
    date: NaiveDate,
) -> Result<Vec<EligibleTrack>, CoreError> {
    let target = store.stop(stop_id)?;
    let station = overlay::stop_station(store, &target)?;

    let my_status = store.status(stop_id, date)?;
    let (my_arr_delay, my_dep_delay) = my_status
        .as_ref()
        .map_or((0, 0), |s| (s.arrival_delay, s.departure_delay));
    let my_arr = target.arrival.map(|t| minute_of_day(t, my_arr_delay));
    let my_dep = target.departure.map(|t| minute_of_day(t, my_dep_delay));

    // Occupants per actual track, with delays applied.
    let mut occupants: std::collections::HashMap<TrackId, Vec<(Option<u16>, Option<u16>)>> =
        std::collections::HashMap::new();
    for other in store.station_stops(station)? {
        if other.id == stop_id || !overlay::trip_runs(store, &other.trip_id, date)? {
            continue;
        }
        let resolved = overlay::resolve_for_date(store, &other, date)?;
        if resolved.cancelled || resolved.bus {
            continue;
        }
        let arr = other.arrival.map(|t| minute_of_day(t, resolved.arrival_delay));
        let dep = other
            .departure
            .map(|t| minute_of_day(t, resolved.departure_delay));
        occupants
            .entry(resolved.actual_track)
            .or_default()
            .push((arr, dep));
    }

    let mut eligible = Vec::new();
    for track in store.station_tracks(station)? {
        let on_track = occupants.get(&track.id).map_or(&[][..], |v| v.as_slice());
        let collides = on_track
            .iter()
            .any(|&(arr, dep)| is_collision(my_arr, my_dep, arr, dep));
        if collides {
            continue;
        }

        let next_arrival = my_dep.and_then(|dep| {
            on_track
                .iter()
                .filter_map(|&(arr, _)| arr)
                .filter(|&arr| arr >= dep)
                .min()
        });

        let platform_number = store.platform(track.platform_id)?.number;
        eligible.push(EligibleTrack {
            track,
            platform_number,
            next_arrival,
        });
    }
    Ok(eligible)
}

/// Format a minute-of-day as `HH:MM` for operator-facing payloads.
pub fn format_minute(minute: u16) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}
