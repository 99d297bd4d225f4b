//! The store boundary.
//!
//! The persistent storage engine itself is an external collaborator;
//! this module specifies it at its interface: entities queryable by
//! identifier and by the foreign-key joins the boards need, plus the
//! one write operation the core performs (the status upsert).
//!
//! [`memory::InMemoryStore`] is the in-process implementation used by
//! the server binary (loaded from a JSON seed) and by tests.

mod memory;
mod seed;

pub use memory::InMemoryStore;
pub use seed::Seed;

use chrono::NaiveDate;

use crate::domain::{
    Calendar, Platform, PlatformId, Route, RouteId, ServiceId, Station, StationId, StatusEdit,
    Stop, StopId, StopStatus, Track, TrackId, Trip, TripId,
};
use crate::error::CoreError;

/// Read/write access to the timetable.
///
/// Reads are expected to be cheap and fresh: a session re-queries at
/// the start of every active phase, so an edit committed by one
/// session is visible to the next read of every other session.
pub trait TimetableStore: Send + Sync {
    fn station(&self, id: StationId) -> Result<Station, CoreError>;
    fn platform(&self, id: PlatformId) -> Result<Platform, CoreError>;
    fn track(&self, id: TrackId) -> Result<Track, CoreError>;
    fn stop(&self, id: StopId) -> Result<Stop, CoreError>;
    fn trip(&self, id: &TripId) -> Result<Trip, CoreError>;
    fn route(&self, id: &RouteId) -> Result<Route, CoreError>;
    fn calendar(&self, id: ServiceId) -> Result<Calendar, CoreError>;

    /// All stops whose originally assigned track lies in the station.
    fn station_stops(&self, station: StationId) -> Result<Vec<Stop>, CoreError>;

    /// All stops of a trip, ordered by sequence.
    fn trip_stops(&self, trip: &TripId) -> Result<Vec<Stop>, CoreError>;

    /// All tracks of a station.
    fn station_tracks(&self, station: StationId) -> Result<Vec<Track>, CoreError>;

    /// The overlay record for `(stop, date)`, if one exists.
    fn status(&self, stop: StopId, date: NaiveDate) -> Result<Option<StopStatus>, CoreError>;

    /// Create or replace the overlay record for `(stop, date)`.
    ///
    /// Must be transactionally visible to subsequent reads from other
    /// sessions. Returns the stored record.
    fn upsert_status(
        &self,
        stop: StopId,
        date: NaiveDate,
        edit: &StatusEdit,
    ) -> Result<StopStatus, CoreError>;
}

/// The station a track belongs to, via its platform.
pub fn track_station(store: &dyn TimetableStore, track: TrackId) -> Result<StationId, CoreError> {
    let track = store.track(track)?;
    let platform = store.platform(track.platform_id)?;
    Ok(platform.station_id)
}

/// The station a platform belongs to.
pub fn platform_station(
    store: &dyn TimetableStore,
    platform: PlatformId,
) -> Result<StationId, CoreError> {
    Ok(store.platform(platform)?.station_id)
}
