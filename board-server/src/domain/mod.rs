//! Domain types for the station board server.
//!
//! Typed identifiers, the static timetable entities, the sparse
//! per-day status overlay record, and the calendar resolver.

mod calendar;
mod ids;
mod model;

pub use calendar::{Calendar, WeekdayMask};
pub use ids::{PlatformId, RouteId, ServiceId, StationId, StopId, TrackId, TripId};
pub use model::{
    Carrier, Platform, Route, Station, StatusEdit, Stop, StopStatus, Track, TrainKind, Trip,
};
