//! In-memory timetable store.
//!
//! Backs the server binary (seeded from JSON at startup) and every
//! test. A single `RwLock` over the whole dataset stands in for the
//! relational store's transaction: writers take the lock exclusively,
//! so an upsert is visible in full to the next read.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::domain::{
    Calendar, Platform, PlatformId, Route, RouteId, ServiceId, Station, StationId, StatusEdit,
    Stop, StopId, StopStatus, Track, TrackId, Trip, TripId,
};
use crate::error::CoreError;

use super::{Seed, TimetableStore};

#[derive(Debug, Default)]
struct Tables {
    stations: HashMap<StationId, Station>,
    platforms: HashMap<PlatformId, Platform>,
    tracks: HashMap<TrackId, Track>,
    routes: HashMap<RouteId, Route>,
    calendars: HashMap<ServiceId, Calendar>,
    trips: HashMap<TripId, Trip>,
    stops: HashMap<StopId, Stop>,
    statuses: HashMap<(StopId, NaiveDate), StopStatus>,
}

/// In-memory implementation of [`TimetableStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from deserialized seed data.
    pub fn from_seed(seed: Seed) -> Self {
        let store = Self::new();
        {
            let mut t = store.tables.write().expect("store lock poisoned");
            t.stations = seed.stations.into_iter().map(|s| (s.id, s)).collect();
            t.platforms = seed.platforms.into_iter().map(|p| (p.id, p)).collect();
            t.tracks = seed.tracks.into_iter().map(|tr| (tr.id, tr)).collect();
            t.routes = seed.routes.into_iter().map(|r| (r.id.clone(), r)).collect();
            t.calendars = seed
                .calendars
                .into_iter()
                .map(|c| (c.service_id, c))
                .collect();
            t.trips = seed.trips.into_iter().map(|tp| (tp.id.clone(), tp)).collect();
            t.stops = seed.stops.into_iter().map(|s| (s.id, s)).collect();
        }
        store
    }

    // Configuration-data load path. The administrative flows that edit
    // the plan live outside this server; tests and the seed loader use
    // these inserts directly.

    pub fn insert_station(&self, station: Station) {
        self.write().stations.insert(station.id, station);
    }

    pub fn insert_platform(&self, platform: Platform) {
        self.write().platforms.insert(platform.id, platform);
    }

    pub fn insert_track(&self, track: Track) {
        self.write().tracks.insert(track.id, track);
    }

    pub fn insert_route(&self, route: Route) {
        self.write().routes.insert(route.id.clone(), route);
    }

    pub fn insert_calendar(&self, calendar: Calendar) {
        self.write().calendars.insert(calendar.service_id, calendar);
    }

    pub fn insert_trip(&self, trip: Trip) {
        self.write().trips.insert(trip.id.clone(), trip);
    }

    pub fn insert_stop(&self, stop: Stop) {
        self.write().stops.insert(stop.id, stop);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().expect("store lock poisoned")
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().expect("store lock poisoned")
    }
}

impl TimetableStore for InMemoryStore {
    fn station(&self, id: StationId) -> Result<Station, CoreError> {
        self.read()
            .stations
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("station", id))
    }

    fn platform(&self, id: PlatformId) -> Result<Platform, CoreError> {
        self.read()
            .platforms
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("platform", id))
    }

    fn track(&self, id: TrackId) -> Result<Track, CoreError> {
        self.read()
            .tracks
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("track", id))
    }

    fn stop(&self, id: StopId) -> Result<Stop, CoreError> {
        self.read()
            .stops
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("stop", id))
    }

    fn trip(&self, id: &TripId) -> Result<Trip, CoreError> {
        self.read()
            .trips
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("trip", id))
    }

    fn route(&self, id: &RouteId) -> Result<Route, CoreError> {
        self.read()
            .routes
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("route", id))
    }

    fn calendar(&self, id: ServiceId) -> Result<Calendar, CoreError> {
        self.read()
            .calendars
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("calendar", id))
    }

    fn station_stops(&self, station: StationId) -> Result<Vec<Stop>, CoreError> {
        let t = self.read();
        let mut stops: Vec<Stop> = t
            .stops
            .values()
            .filter(|s| {
                t.tracks
                    .get(&s.track_id)
                    .and_then(|tr| t.platforms.get(&tr.platform_id))
                    .is_some_and(|p| p.station_id == station)
            })
            .cloned()
            .collect();
        stops.sort_by_key(|s| s.id);
        Ok(stops)
    }

    fn trip_stops(&self, trip: &TripId) -> Result<Vec<Stop>, CoreError> {
        let t = self.read();
        let mut stops: Vec<Stop> = t
            .stops
            .values()
            .filter(|s| &s.trip_id == trip)
            .cloned()
            .collect();
        stops.sort_by_key(|s| s.sequence);
        Ok(stops)
    }

    fn station_tracks(&self, station: StationId) -> Result<Vec<Track>, CoreError> {
        let t = self.read();
        let mut tracks: Vec<Track> = t
            .tracks
            .values()
            .filter(|tr| {
                t.platforms
                    .get(&tr.platform_id)
                    .is_some_and(|p| p.station_id == station)
            })
            .cloned()
            .collect();
        tracks.sort_by_key(|tr| tr.id);
        Ok(tracks)
    }

    fn status(&self, stop: StopId, date: NaiveDate) -> Result<Option<StopStatus>, CoreError> {
        Ok(self.read().statuses.get(&(stop, date)).cloned())
    }

    fn upsert_status(
        &self,
        stop: StopId,
        date: NaiveDate,
        edit: &StatusEdit,
    ) -> Result<StopStatus, CoreError> {
        let mut t = self.write();
        if !t.stops.contains_key(&stop) {
            return Err(CoreError::not_found("stop", stop));
        }
        let status = edit.into_status(stop, date);
        t.statuses.insert((stop, date), status.clone());
        Ok(status)
    }
}
