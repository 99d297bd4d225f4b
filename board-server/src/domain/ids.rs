//! Typed identifiers for timetable entities.
//!
//! Wrapping the raw store keys in newtypes keeps the different id
//! spaces from being mixed up (a `TrackId` is never accepted where a
//! `PlatformId` is expected).

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a station.
    StationId
);
numeric_id!(
    /// Identifier of a platform within a station.
    PlatformId
);
numeric_id!(
    /// Identifier of a track within a platform.
    TrackId
);
numeric_id!(
    /// Identifier of a planned stop within a trip.
    StopId
);
numeric_id!(
    /// Identifier of a service calendar pattern.
    ServiceId
);

/// Identifier of a trip (one dated instantiation of a route).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub String);

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TripId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a route (the dateless train service definition).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub String);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_inner() {
        assert_eq!(StationId(7).to_string(), "7");
        assert_eq!(TrackId(42).to_string(), "42");
        assert_eq!(TripId::from("IC-1001").to_string(), "IC-1001");
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&StopId(5)).unwrap();
        assert_eq!(json, "5");
        let back: StopId = serde_json::from_str("5").unwrap();
        assert_eq!(back, StopId(5));

        let json = serde_json::to_string(&TripId::from("t1")).unwrap();
        assert_eq!(json, "\"t1\"");
    }
}
