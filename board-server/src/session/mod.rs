//! Display session controller.
//!
//! One task per connected display. The loop shape is the same for
//! every board kind: compute a fresh snapshot, send it, then wait on
//! the station's update hub with a bounded timeout. A hub signal means
//! an operator edited the timetable and the board recomputes at once;
//! a timeout means the periodic refresh came due. The session ends
//! when the outbound channel closes (the transport went away), which
//! is a normal exit, not an error.

pub mod voice;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::board::{BoardKind, BoardSnapshot};
use crate::error::CoreError;
use crate::hub::UpdateHub;
use crate::store::TimetableStore;

/// Timing knobs for the refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Recheck interval while the board is empty.
    pub idle_wait: Duration,
    /// Shortest wait between refreshes, so a display behind a skewed
    /// clock does not flicker.
    pub min_wait: Duration,
    /// Longest wait between refreshes; doubles as a health check.
    pub max_wait: Duration,
    /// Added past the next event so the row is really gone on refetch.
    pub settle: Duration,
    /// Voice-session wake interval when no edits arrive.
    pub keepalive: Duration,
    /// Resend interval of the periodic voice data feed.
    pub data_refresh: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_wait: Duration::from_secs(30),
            min_wait: Duration::from_secs(5),
            max_wait: Duration::from_secs(60),
            settle: Duration::from_secs(1),
            keepalive: Duration::from_secs(60),
            data_refresh: Duration::from_secs(5),
        }
    }
}

/// How long to wait before the next periodic refresh.
///
/// With no displayed event the board polls at the idle interval.
/// Otherwise the wait runs until just past the soonest estimated
/// event, clamped into `[min_wait, max_wait]`.
pub fn wait_budget(
    config: &SessionConfig,
    now: NaiveDateTime,
    next_event: Option<NaiveDateTime>,
) -> Duration {
    let Some(event) = next_event else {
        return config.idle_wait;
    };
    let until = (event - now).to_std().unwrap_or(Duration::ZERO);
    (until + config.settle).clamp(config.min_wait, config.max_wait)
}

/// Drive one display connection until its transport closes.
///
/// Store failures inside a cycle degrade to a blank board and the idle
/// wait; the session retries on the next cycle rather than dying.
pub async fn run_board_session(
    store: Arc<dyn TimetableStore>,
    hub: Arc<UpdateHub>,
    config: SessionConfig,
    kind: BoardKind,
    out: mpsc::Sender<String>,
) -> Result<(), CoreError> {
    let station = kind.station(store.as_ref())?;
    let mut subscription = hub.subscribe(station);
    info!(?kind, %station, "display connected");

    loop {
        let now = Local::now().naive_local();
        let snapshot = match kind.compute(store.as_ref(), now) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(?kind, %station, error = %e, "board refresh failed");
                BoardSnapshot::empty()
            }
        };

        if out.send(snapshot.payload.to_string()).await.is_err() {
            info!(?kind, %station, "display disconnected");
            return Ok(());
        }

        let budget = wait_budget(&config, now, snapshot.next_event);
        match tokio::time::timeout(budget, subscription.recv()).await {
            Ok(Some(())) => debug!(%station, "timetable edited, refreshing"),
            // Hub gone; nothing left to serve.
            Ok(None) => return Ok(()),
            // Periodic refresh.
            Err(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Calendar, Carrier, Platform, PlatformId, Route, RouteId, ServiceId, Station, StationId,
        StatusEdit, Stop, StopId, Track, TrackId, TrainKind, Trip, TripId, WeekdayMask,
    };
    use crate::hub::Hub;
    use crate::store::InMemoryStore;
    use chrono::{NaiveDate, NaiveTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        date(2023, 6, 1).and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[test]
    fn wait_budget_is_idle_without_an_event() {
        let config = SessionConfig::default();
        assert_eq!(wait_budget(&config, dt(10, 0), None), config.idle_wait);
    }

    #[test]
    fn wait_budget_runs_until_just_past_the_event() {
        let config = SessionConfig::default();
        // Event in 20 seconds: wait 20 + 1 settle.
        let budget = wait_budget(&config, dt(10, 0), Some(dt(10, 0) + chrono::Duration::seconds(20)));
        assert_eq!(budget, Duration::from_secs(21));
    }

    #[test]
    fn wait_budget_clamps_both_ends() {
        let config = SessionConfig::default();
        // Event far away: capped at max.
        let budget = wait_budget(&config, dt(10, 0), Some(dt(12, 0)));
        assert_eq!(budget, config.max_wait);
        // Event already past: floored at min.
        let budget = wait_budget(&config, dt(10, 0), Some(dt(9, 0)));
        assert_eq!(budget, config.min_wait);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// With an event present the budget always lands in the
            /// configured window.
            #[test]
            fn budget_always_within_bounds(offset_secs in -86_400i64..86_400) {
                let config = SessionConfig::default();
                let now = dt(12, 0);
                let event = now + chrono::Duration::seconds(offset_secs);
                let budget = wait_budget(&config, now, Some(event));
                prop_assert!(budget >= config.min_wait);
                prop_assert!(budget <= config.max_wait);
            }
        }
    }

    /// One station with one platform and track, one daily trip
    /// departing at `dep`.
    fn store_with_departure(dep: NaiveTime) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_station(Station {
            id: StationId(1),
            name: "Centralna".into(),
        });
        store.insert_station(Station {
            id: StationId(2),
            name: "Wschodnia".into(),
        });
        for (sid, pid, tid) in [(1, 11, 111), (2, 21, 211)] {
            store.insert_platform(Platform {
                id: PlatformId(pid),
                station_id: StationId(sid),
                number: "I".into(),
            });
            store.insert_track(Track {
                id: TrackId(tid),
                platform_id: PlatformId(pid),
                number: "1".into(),
            });
        }
        store.insert_route(Route {
            id: RouteId::from("r1"),
            train_number: "1001".into(),
            carrier: Carrier {
                name: "Koleje".into(),
                code: "KL".into(),
            },
            kind: TrainKind {
                name: "Osobowy".into(),
                code: "Os".into(),
            },
            final_station: StationId(2),
        });
        store.insert_calendar(Calendar {
            service_id: ServiceId(1),
            weekdays: WeekdayMask::DAILY,
            start_date: date(2000, 1, 1),
            end_date: date(2099, 12, 31),
        });
        store.insert_trip(Trip {
            id: TripId::from("t1"),
            route_id: RouteId::from("r1"),
            service_id: ServiceId(1),
        });
        store.insert_stop(Stop {
            id: StopId(1),
            trip_id: TripId::from("t1"),
            track_id: TrackId(111),
            arrival: None,
            departure: Some(dep),
            sequence: 0,
        });
        store.insert_stop(Stop {
            id: StopId(2),
            trip_id: TripId::from("t1"),
            track_id: TrackId(211),
            arrival: Some(dep),
            departure: None,
            sequence: 1,
        });
        store
    }

    #[tokio::test(start_paused = true)]
    async fn empty_board_sends_an_empty_array() {
        // No trips at all, just the station.
        let store = InMemoryStore::new();
        store.insert_station(Station {
            id: StationId(1),
            name: "Centralna".into(),
        });
        let store: Arc<dyn TimetableStore> = Arc::new(store);
        let hub = Arc::new(Hub::new());
        let (tx, mut rx) = mpsc::channel(8);

        let task = tokio::spawn(run_board_session(
            store,
            Arc::clone(&hub),
            SessionConfig::default(),
            BoardKind::Departures(StationId(1)),
            tx,
        ));

        assert_eq!(rx.recv().await.unwrap(), "[]");
        drop(rx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_board_target_is_an_error() {
        let store: Arc<dyn TimetableStore> = Arc::new(InMemoryStore::new());
        let hub = Arc::new(Hub::new());
        let (tx, _rx) = mpsc::channel(8);
        let result = run_board_session(
            store,
            hub,
            SessionConfig::default(),
            BoardKind::Departures(StationId(1)),
            tx,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn edit_signal_refreshes_the_board() {
        // A departure far in the future so the first snapshot has it.
        let store = Arc::new(store_with_departure(
            NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        ));
        let hub = Arc::new(Hub::new());
        let (tx, mut rx) = mpsc::channel(8);

        let task = tokio::spawn(run_board_session(
            Arc::clone(&store) as Arc<dyn TimetableStore>,
            Arc::clone(&hub),
            SessionConfig::default(),
            BoardKind::Departures(StationId(1)),
            tx,
        ));

        let first = rx.recv().await.unwrap();
        assert!(first.contains("\"is_cancelled\":false"));

        // Operator cancels the train and the hub signals the station.
        // Both dates, in case the displayed row is a carried-over one.
        for day in [Local::now().date_naive(), Local::now().date_naive().succ_opt().unwrap()] {
            store
                .upsert_status(
                    StopId(1),
                    day,
                    &StatusEdit {
                        is_cancelled: Some(true),
                        ..Default::default()
                    },
                )
                .unwrap();
        }
        hub.publish(StationId(1), ());

        // The refresh reflecting the edit arrives within a few cycles.
        let mut saw_cancelled = false;
        for _ in 0..5 {
            let payload = rx.recv().await.unwrap();
            if payload.contains("\"is_cancelled\":true") {
                saw_cancelled = true;
                break;
            }
        }
        assert!(saw_cancelled);

        drop(rx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn session_unsubscribes_on_transport_close() {
        let store: Arc<dyn TimetableStore> = Arc::new(store_with_departure(
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        ));
        let hub = Arc::new(Hub::new());
        let (tx, mut rx) = mpsc::channel(8);

        let task = tokio::spawn(run_board_session(
            store,
            Arc::clone(&hub),
            SessionConfig::default(),
            BoardKind::Departures(StationId(1)),
            tx,
        ));

        rx.recv().await.unwrap();
        assert_eq!(hub.subscriber_count(StationId(1)), 1);
        drop(rx);
        task.await.unwrap().unwrap();
        assert_eq!(hub.subscriber_count(StationId(1)), 0);
    }
}
