//! Data transfer objects for web requests and responses.

use serde::{Serialize, Serializer};

use crate::domain::{PlatformId, StationId, StopId, TrackId};

/// Delay column of the operator timetable lists: the delay in minutes,
/// or the literal `"Odwołany"` for a cancelled train.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    Minutes(i32),
    Cancelled,
}

impl Serialize for Delay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Delay::Minutes(m) => serializer.serialize_i32(m),
            Delay::Cancelled => serializer.serialize_str("Odwołany"),
        }
    }
}

/// Station name lookup result.
#[derive(Debug, Serialize)]
pub struct StationResponse {
    pub id: StationId,
    pub name: String,
}

/// One row of the operator departure list.
#[derive(Debug, Serialize)]
pub struct DepartureRow {
    /// Stop id, the key for the edit form
    pub id: StopId,

    /// Destination station name
    pub station: String,

    pub train_number: String,

    /// Train kind code (e.g. "Os")
    pub train_type: String,

    /// Carrier name
    pub carrier: String,

    /// Actual platform number
    pub platform: String,

    /// Actual track number
    pub track: String,

    /// Whether the train still stands on its planned track
    pub original: bool,

    /// Planned departure, HH:MM
    pub departure_time: Option<String>,

    pub delay: Delay,

    pub bus: bool,
}

/// One row of the operator arrival list.
#[derive(Debug, Serialize)]
pub struct ArrivalRow {
    pub id: StopId,

    /// Origin station name
    pub station: Option<String>,

    pub train_number: String,
    pub train_type: String,
    pub carrier: String,
    pub platform: String,
    pub track: String,
    pub original: bool,

    /// Planned arrival, HH:MM
    pub arrival_time: Option<String>,

    pub delay: Delay,
    pub bus: bool,
}

/// Single-stop detail, the edit form's read path.
#[derive(Debug, Serialize)]
pub struct StopDetails {
    pub id: StopId,
    pub train_number: String,

    /// Train kind name (full, not the code)
    pub train_type: String,

    pub carrier: String,
    pub final_station: String,
    pub station: String,
    pub station_id: StationId,
    pub arrival: Option<String>,
    pub departure: Option<String>,
    pub arrival_delay: Option<i32>,
    pub departure_delay: Option<i32>,

    /// Actual track and its platform
    pub track_id: TrackId,
    pub platform_id: PlatformId,

    pub is_cancelled: bool,
    pub bus: bool,
}

/// One stop of a full trip detail.
#[derive(Debug, Serialize)]
pub struct TrainStopRow {
    pub id: StopId,
    pub station: String,
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
    pub platform: String,
    pub track: String,
    pub original: bool,
    pub arrival_delay: Option<i32>,
    pub departure_delay: Option<i32>,
    pub is_cancelled: bool,
    pub bus: bool,
}

/// Full trip detail.
#[derive(Debug, Serialize)]
pub struct TrainDetails {
    pub train_number: String,
    pub train_type: String,
    pub carrier: String,
    pub final_station: String,
    pub stops: Vec<TrainStopRow>,
}

/// A track the stop could move to without a collision.
#[derive(Debug, Serialize)]
pub struct TrackOption {
    pub id: TrackId,
    pub number: String,
    pub platform_number: String,

    /// HH:MM of the next train due on this track after our departure
    pub available_to: Option<String>,
}

/// Acknowledgement of a committed edit.
#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub msg: &'static str,
    pub id: StopId,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
