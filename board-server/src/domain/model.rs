//! Timetable entities.
//!
//! The static plan (stations, platforms, tracks, routes, trips, stops)
//! is configuration data: created by out-of-scope administrative flows
//! and read-only to this server. The only mutable record is
//! [`StopStatus`], the sparse per-day overlay written by the edit path.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::ids::{PlatformId, RouteId, ServiceId, StationId, StopId, TrackId, TripId};

/// A station in the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
}

/// A platform; belongs to exactly one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub station_id: StationId,
    /// Platform label as printed on signage (often a Roman numeral).
    pub number: String,
}

/// A track edge; belongs to exactly one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub platform_id: PlatformId,
    pub number: String,
}

/// Operating carrier of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub name: String,
    pub code: String,
}

/// Train category (express, regional, ...); boards show the code,
/// voice announcements the full name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainKind {
    pub name: String,
    pub code: String,
}

/// Immutable definition of a train service. Does not vary by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub train_number: String,
    pub carrier: Carrier,
    pub kind: TrainKind,
    pub final_station: StationId,
}

/// One dated instantiation of a route, governed by exactly one calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub route_id: RouteId,
    pub service_id: ServiceId,
}

/// A planned event within a trip.
///
/// A stop with only an arrival is a terminus; one with only a departure
/// is an origin. Times are time-of-day; the service date comes from the
/// calendar resolution, and delays are applied as plain timestamp
/// arithmetic on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub trip_id: TripId,
    /// The originally assigned track. The overlay may reassign it.
    pub track_id: TrackId,
    pub arrival: Option<NaiveTime>,
    pub departure: Option<NaiveTime>,
    pub sequence: u32,
}

/// Sparse per-day override for one stop: the overlay.
///
/// Absence of a record for a date means "runs exactly as planned".
/// At most one exists per `(stop, date)`; it is created lazily on the
/// first edit for that date and accumulates as per-day history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopStatus {
    pub stop_id: StopId,
    pub date: NaiveDate,
    /// Arrival delay in minutes; may be negative (running early).
    #[serde(default)]
    pub arrival_delay: i32,
    /// Departure delay in minutes; may be negative.
    #[serde(default)]
    pub departure_delay: i32,
    /// Reassigned track, or `None` to keep the original.
    #[serde(default)]
    pub track_id: Option<TrackId>,
    #[serde(default)]
    pub cancelled: bool,
    /// Replaced by a bus; does not occupy rail track capacity.
    #[serde(default)]
    pub bus: bool,
}

impl StopStatus {
    /// A fresh all-default status for `(stop, date)`.
    pub fn blank(stop_id: StopId, date: NaiveDate) -> Self {
        Self {
            stop_id,
            date,
            arrival_delay: 0,
            departure_delay: 0,
            track_id: None,
            cancelled: false,
            bus: false,
        }
    }
}

/// Edit request for a stop's status on the current operating date.
///
/// Field absence means "leave at default", not "keep previous": the
/// edit path replaces the whole `(stop, today)` record so the form
/// always submits the full picture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEdit {
    #[serde(default)]
    pub track_id: Option<TrackId>,
    #[serde(default)]
    pub bus: Option<bool>,
    #[serde(default)]
    pub is_cancelled: Option<bool>,
    #[serde(default)]
    pub arrival_delay: Option<i32>,
    #[serde(default)]
    pub departure_delay: Option<i32>,
}

impl StatusEdit {
    /// Materialize this edit as the full status record for `(stop, date)`.
    pub fn into_status(&self, stop_id: StopId, date: NaiveDate) -> StopStatus {
        StopStatus {
            stop_id,
            date,
            arrival_delay: self.arrival_delay.unwrap_or(0),
            departure_delay: self.departure_delay.unwrap_or(0),
            track_id: self.track_id,
            cancelled: self.is_cancelled.unwrap_or(false),
            bus: self.bus.unwrap_or(false),
        }
    }
}
