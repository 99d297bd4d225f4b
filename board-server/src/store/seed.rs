//! JSON seed data for the in-memory store.
//!
//! The server binary loads the static plan from a seed file at startup
//! (the relational store's job in a full deployment). The format is
//! plain entity lists.

use serde::{Deserialize, Serialize};

use crate::domain::{Calendar, Platform, Route, Station, Stop, Track, Trip};
use crate::error::CoreError;

/// Deserialized seed file: the whole static plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub calendars: Vec<Calendar>,
    #[serde(default)]
    pub trips: Vec<Trip>,
    #[serde(default)]
    pub stops: Vec<Stop>,
}

impl Seed {
    /// Parse a seed file's contents.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::Store(format!("invalid seed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ServiceId, StationId, StopId, TrackId, TripId, WeekdayMask};
    use crate::store::{InMemoryStore, TimetableStore};

    #[test]
    fn parses_minimal_seed() {
        let json = r#"{
            "stations": [{"id": 1, "name": "Centralna"}],
            "platforms": [{"id": 11, "station_id": 1, "number": "I"}],
            "tracks": [{"id": 111, "platform_id": 11, "number": "3"}],
            "routes": [{
                "id": "r1",
                "train_number": "1001 Bałtyk",
                "carrier": {"name": "Koleje", "code": "KL"},
                "kind": {"name": "Ekspres", "code": "EX"},
                "final_station": 1
            }],
            "calendars": [{
                "service_id": 5,
                "weekdays": 31,
                "start_date": "2023-01-01",
                "end_date": "2023-12-31"
            }],
            "trips": [{"id": "t1", "route_id": "r1", "service_id": 5}],
            "stops": [{
                "id": 7,
                "trip_id": "t1",
                "track_id": 111,
                "arrival": null,
                "departure": "08:00:00",
                "sequence": 0
            }]
        }"#;

        let seed = Seed::from_json(json).unwrap();
        assert_eq!(seed.stations.len(), 1);
        assert_eq!(seed.calendars[0].weekdays, WeekdayMask::WEEKDAYS);

        let store = InMemoryStore::from_seed(seed);
        assert_eq!(store.station(StationId(1)).unwrap().name, "Centralna");
        assert_eq!(store.calendar(ServiceId(5)).unwrap().service_id, ServiceId(5));
        let stop = store.stop(StopId(7)).unwrap();
        assert_eq!(stop.trip_id, TripId::from("t1"));
        assert_eq!(stop.track_id, TrackId(111));
        assert!(stop.arrival.is_none());
    }

    #[test]
    fn empty_object_is_an_empty_seed() {
        let seed = Seed::from_json("{}").unwrap();
        assert!(seed.stations.is_empty());
        assert!(seed.stops.is_empty());
    }

    #[test]
    fn malformed_seed_is_a_store_error() {
        let err = Seed::from_json("not json").unwrap_err();
        assert!(matches!(err, CoreError::Store(_)));
    }
}
