//! HTTP and WebSocket route handlers.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use futures::{SinkExt, StreamExt};
use tracing::warn;

use crate::board::BoardKind;
use crate::collision;
use crate::domain::{PlatformId, StationId, StatusEdit, StopId, TrackId};
use crate::error::CoreError;
use crate::overlay;
use crate::session::{self, voice};
use crate::store::{self, TimetableStore};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/displays/platform/:platform_id", get(ws_platform))
        .route("/displays/entrance/:platform_id", get(ws_entrance))
        .route("/displays/station-departures/:station_id", get(ws_departures))
        .route("/displays/station-arrivals/:station_id", get(ws_arrivals))
        .route("/displays/edge/:track_id", get(ws_edge))
        .route("/voice/announcements/:station_id", get(ws_voice))
        .route("/voice/data/:station_id", get(ws_voice_data))
        .route("/timetable/station/:station_id", get(get_station))
        .route("/timetable/departures/:station_id", get(get_departures))
        .route("/timetable/arrivals/:station_id", get(get_arrivals))
        .route("/timetable/stop/:stop_id", get(get_stop))
        .route("/timetable/train/:stop_id", get(get_train))
        .route("/timetable/tracks/:stop_id", get(get_tracks))
        .route("/timetable/edit/:stop_id", put(edit_timetable))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

// ---- WebSocket display sessions ----

async fn ws_platform(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve_board(state, BoardKind::Platform(PlatformId(id)), socket))
}

async fn ws_entrance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve_board(state, BoardKind::Entrance(PlatformId(id)), socket))
}

async fn ws_departures(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve_board(state, BoardKind::Departures(StationId(id)), socket))
}

async fn ws_arrivals(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve_board(state, BoardKind::Arrivals(StationId(id)), socket))
}

async fn ws_edge(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve_board(state, BoardKind::Edge(TrackId(id)), socket))
}

async fn ws_voice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve_voice(state, StationId(id), socket))
}

async fn ws_voice_data(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve_voice_data(state, StationId(id), socket))
}

/// Run a board session for one upgraded socket.
///
/// The session task writes payloads into a channel; this task pumps
/// them onto the socket and watches for the peer going away. Dropping
/// the channel receiver is how the session learns the transport closed.
async fn serve_board(state: AppState, kind: BoardKind, socket: WebSocket) {
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let session = tokio::spawn(async move {
        let result =
            session::run_board_session(state.store, state.hub, state.config, kind, tx).await;
        if let Err(e) = result {
            warn!(?kind, error = %e, "display session refused");
        }
    });
    pump(socket, rx).await;
    session.abort();
}

async fn serve_voice(state: AppState, station: StationId, socket: WebSocket) {
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let session = tokio::spawn(async move {
        let result =
            voice::run_voice_session(state.store, state.voice, state.config, station, tx).await;
        if let Err(e) = result {
            warn!(%station, error = %e, "voice session refused");
        }
    });
    pump(socket, rx).await;
    session.abort();
}

async fn serve_voice_data(state: AppState, station: StationId, socket: WebSocket) {
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let session = tokio::spawn(async move {
        let result =
            voice::run_voice_data_session(state.store, state.config, station, tx).await;
        if let Err(e) = result {
            warn!(%station, error = %e, "voice data session refused");
        }
    });
    pump(socket, rx).await;
    session.abort();
}

/// Forward session payloads to the socket until either side closes.
async fn pump(socket: WebSocket, mut rx: tokio::sync::mpsc::Receiver<String>) {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            payload = rx.recv() => match payload {
                Some(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            msg = stream.next() => match msg {
                // Displays have nothing to say; drop whatever arrives.
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

// ---- Timetable queries ----

fn hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Operator departure list: carry-over candidates minus trains that
/// terminate here (nothing departs from its own destination).
fn departure_rows(
    store: &dyn TimetableStore,
    station: StationId,
    now: NaiveDateTime,
) -> Result<Vec<DepartureRow>, CoreError> {
    let mut rows = Vec::new();
    for r in overlay::departures_with_carryover(store, station, now)? {
        let trip = store.trip(&r.stop.trip_id)?;
        let route = store.route(&trip.route_id)?;
        if route.final_station == station {
            continue;
        }
        let track = store.track(r.actual_track)?;
        let platform = store.platform(track.platform_id)?;
        rows.push(DepartureRow {
            id: r.stop.id,
            station: store.station(route.final_station)?.name,
            train_number: route.train_number,
            train_type: route.kind.code,
            carrier: route.carrier.name,
            platform: platform.number,
            track: track.number,
            original: r.actual_track == r.stop.track_id,
            departure_time: r.stop.departure.map(hhmm),
            delay: if r.cancelled {
                Delay::Cancelled
            } else {
                Delay::Minutes(r.departure_delay)
            },
            bus: r.bus,
        });
    }
    Ok(rows)
}

/// Operator arrival list: carry-over candidates minus origin stops.
fn arrival_rows(
    store: &dyn TimetableStore,
    station: StationId,
    now: NaiveDateTime,
) -> Result<Vec<ArrivalRow>, CoreError> {
    let mut rows = Vec::new();
    for r in overlay::arrivals_with_carryover(store, station, now)? {
        if r.stop.sequence == 0 {
            continue;
        }
        let trip = store.trip(&r.stop.trip_id)?;
        let route = store.route(&trip.route_id)?;
        let track = store.track(r.actual_track)?;
        let platform = store.platform(track.platform_id)?;
        rows.push(ArrivalRow {
            id: r.stop.id,
            station: overlay::origin_name(store, &r.stop.trip_id)?,
            train_number: route.train_number,
            train_type: route.kind.code,
            carrier: route.carrier.name,
            platform: platform.number,
            track: track.number,
            original: r.actual_track == r.stop.track_id,
            arrival_time: r.stop.arrival.map(hhmm),
            delay: if r.cancelled {
                Delay::Cancelled
            } else {
                Delay::Minutes(r.arrival_delay)
            },
            bus: r.bus,
        });
    }
    Ok(rows)
}

fn stop_details(
    store: &dyn TimetableStore,
    stop_id: StopId,
    today: NaiveDate,
) -> Result<StopDetails, CoreError> {
    let stop = store.stop(stop_id)?;
    let status = store.status(stop_id, today)?;
    let resolved = overlay::resolve(&stop, status.as_ref(), today);
    let trip = store.trip(&stop.trip_id)?;
    let route = store.route(&trip.route_id)?;
    let actual = store.track(resolved.actual_track)?;
    let home_station = overlay::stop_station(store, &stop)?;

    Ok(StopDetails {
        id: stop.id,
        train_number: route.train_number,
        train_type: route.kind.name,
        carrier: route.carrier.name,
        final_station: store.station(route.final_station)?.name,
        station: store.station(home_station)?.name,
        station_id: home_station,
        arrival: stop.arrival.map(hhmm),
        departure: stop.departure.map(hhmm),
        arrival_delay: status.as_ref().map(|s| s.arrival_delay),
        departure_delay: status.as_ref().map(|s| s.departure_delay),
        track_id: actual.id,
        platform_id: actual.platform_id,
        is_cancelled: resolved.cancelled,
        bus: resolved.bus,
    })
}

/// Full trip detail, keyed by any of its stops.
fn train_details(
    store: &dyn TimetableStore,
    stop_id: StopId,
    today: NaiveDate,
) -> Result<TrainDetails, CoreError> {
    let stop = store.stop(stop_id)?;
    let trip = store.trip(&stop.trip_id)?;
    let route = store.route(&trip.route_id)?;

    let mut stops = Vec::new();
    for s in store.trip_stops(&trip.id)? {
        let status = store.status(s.id, today)?;
        let resolved = overlay::resolve(&s, status.as_ref(), today);
        let track = store.track(resolved.actual_track)?;
        let platform = store.platform(track.platform_id)?;
        stops.push(TrainStopRow {
            id: s.id,
            station: store.station(platform.station_id)?.name,
            arrival_time: s.arrival.map(hhmm),
            departure_time: s.departure.map(hhmm),
            platform: platform.number,
            track: track.number,
            original: resolved.actual_track == s.track_id,
            arrival_delay: status.as_ref().map(|st| st.arrival_delay),
            departure_delay: status.as_ref().map(|st| st.departure_delay),
            is_cancelled: resolved.cancelled,
            bus: resolved.bus,
        });
    }

    Ok(TrainDetails {
        train_number: route.train_number,
        train_type: route.kind.name,
        carrier: route.carrier.name,
        final_station: store.station(route.final_station)?.name,
        stops,
    })
}

fn track_options(
    store: &dyn TimetableStore,
    stop_id: StopId,
    today: NaiveDate,
) -> Result<Vec<TrackOption>, CoreError> {
    let eligible = collision::eligible_tracks(store, stop_id, today)?;
    Ok(eligible
        .into_iter()
        .map(|e| TrackOption {
            id: e.track.id,
            number: e.track.number,
            platform_number: e.platform_number,
            available_to: e.next_arrival.map(collision::format_minute),
        })
        .collect())
}

/// Validate and commit an edit, returning the station whose displays
/// must refresh (the station of the stop's *actual* track).
fn commit_edit(
    store: &dyn TimetableStore,
    stop_id: StopId,
    edit: &StatusEdit,
    today: NaiveDate,
) -> Result<StationId, CoreError> {
    let stop = store.stop(stop_id)?;
    let home_station = overlay::stop_station(store, &stop)?;
    if let Some(track) = edit.track_id {
        // A reassignment must stay within the stop's own station.
        if store::track_station(store, track)? != home_station {
            return Err(CoreError::Validation(format!(
                "track {track} is not at station {home_station}"
            )));
        }
    }
    let status = store.upsert_status(stop_id, today, edit)?;
    let actual = status.track_id.unwrap_or(stop.track_id);
    store::track_station(store, actual)
}

async fn get_station(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StationResponse>, AppError> {
    let station = state.store.station(StationId(id))?;
    Ok(Json(StationResponse {
        id: station.id,
        name: station.name,
    }))
}

async fn get_departures(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<DepartureRow>>, AppError> {
    state.store.station(StationId(id))?;
    let rows = departure_rows(state.store.as_ref(), StationId(id), now_local())?;
    if rows.is_empty() {
        return Err(AppError::NotFound {
            message: format!("no departures from station {id}"),
        });
    }
    Ok(Json(rows))
}

async fn get_arrivals(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ArrivalRow>>, AppError> {
    state.store.station(StationId(id))?;
    let rows = arrival_rows(state.store.as_ref(), StationId(id), now_local())?;
    if rows.is_empty() {
        return Err(AppError::NotFound {
            message: format!("no arrivals at station {id}"),
        });
    }
    Ok(Json(rows))
}

async fn get_stop(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StopDetails>, AppError> {
    let details = stop_details(state.store.as_ref(), StopId(id), Local::now().date_naive())?;
    Ok(Json(details))
}

async fn get_train(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TrainDetails>, AppError> {
    let details = train_details(state.store.as_ref(), StopId(id), Local::now().date_naive())?;
    Ok(Json(details))
}

async fn get_tracks(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TrackOption>>, AppError> {
    let options = track_options(state.store.as_ref(), StopId(id), Local::now().date_naive())?;
    Ok(Json(options))
}

/// Commit a status edit and wake every display and voice controller at
/// the owning station.
async fn edit_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(edit): Json<StatusEdit>,
) -> Result<Json<EditResponse>, AppError> {
    let stop_id = StopId(id);
    let station = commit_edit(
        state.store.as_ref(),
        stop_id,
        &edit,
        Local::now().date_naive(),
    )?;

    state.hub.publish(station, ());
    state.voice.publish(station, stop_id);

    Ok(Json(EditResponse {
        msg: "stop updated",
        id: stop_id,
    }))
}

// ---- Error handling ----

/// Application error type for web handlers.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(message) => AppError::BadRequest { message },
            CoreError::NotFound { .. } => AppError::NotFound {
                message: e.to_string(),
            },
            CoreError::Store(message) => AppError::Internal { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        // Log errors to stderr for debugging
        eprintln!("[{status}] {message}");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Calendar, Carrier, Platform, Route, RouteId, ServiceId, Station, Stop, Track, TrainKind,
        Trip, TripId, WeekdayMask,
    };
    use crate::store::InMemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(d: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        d.and_time(time(h, m))
    }

    /// Two stations, two tracks each; trip t1 runs 1 -> 2 daily, trip
    /// t2 terminates at station 1.
    fn fixture() -> InMemoryStore {
        let store = InMemoryStore::new();
        for (sid, name) in [(1, "Centralna"), (2, "Wschodnia")] {
            store.insert_station(Station {
                id: StationId(sid),
                name: name.into(),
            });
            store.insert_platform(Platform {
                id: PlatformId(sid * 10),
                station_id: StationId(sid),
                number: "I".into(),
            });
            for track in [1, 2] {
                store.insert_track(Track {
                    id: TrackId(sid * 100 + track),
                    platform_id: PlatformId(sid * 10),
                    number: track.to_string(),
                });
            }
        }
        store.insert_route(Route {
            id: RouteId::from("r1"),
            train_number: "1001 Bałtyk".into(),
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
        store.insert_route(Route {
            id: RouteId::from("r2"),
            train_number: "2002".into(),
            carrier: Carrier {
                name: "Koleje".into(),
                code: "KL".into(),
            },
            kind: TrainKind {
                name: "Osobowy".into(),
                code: "Os".into(),
            },
            final_station: StationId(1),
        });
        store.insert_calendar(Calendar {
            service_id: ServiceId(1),
            weekdays: WeekdayMask::DAILY,
            start_date: date(2023, 1, 1),
            end_date: date(2023, 12, 31),
        });
        for (trip, route) in [("t1", "r1"), ("t2", "r2")] {
            store.insert_trip(Trip {
                id: TripId::from(trip),
                route_id: RouteId::from(route),
                service_id: ServiceId(1),
            });
        }
        // t1: departs station 1 at 10:00, arrives station 2 at 11:00.
        store.insert_stop(Stop {
            id: StopId(1),
            trip_id: TripId::from("t1"),
            track_id: TrackId(101),
            arrival: None,
            departure: Some(time(10, 0)),
            sequence: 0,
        });
        store.insert_stop(Stop {
            id: StopId(2),
            trip_id: TripId::from("t1"),
            track_id: TrackId(201),
            arrival: Some(time(11, 0)),
            departure: None,
            sequence: 1,
        });
        // t2: departs station 2 at 09:00, terminates at station 1 at 09:45.
        store.insert_stop(Stop {
            id: StopId(3),
            trip_id: TripId::from("t2"),
            track_id: TrackId(202),
            arrival: None,
            departure: Some(time(9, 0)),
            sequence: 0,
        });
        store.insert_stop(Stop {
            id: StopId(4),
            trip_id: TripId::from("t2"),
            track_id: TrackId(102),
            arrival: Some(time(9, 45)),
            departure: Some(time(9, 50)),
            sequence: 1,
        });
        store
    }

    #[test]
    fn departure_list_skips_terminating_trains() {
        let store = fixture();
        let now = at(date(2023, 6, 1), 8, 0);
        // Stop 4 departs station 1 at 09:50 but its route terminates
        // there; only the through train is listed.
        let rows = departure_rows(&store, StationId(1), now).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, StopId(1));
        assert_eq!(rows[0].station, "Wschodnia");
        assert_eq!(rows[0].platform, "I");
        assert_eq!(rows[0].track, "1");
        assert!(rows[0].original);
        assert_eq!(rows[0].delay, Delay::Minutes(0));
    }

    #[test]
    fn arrival_list_skips_origin_stops_and_headlines_the_origin() {
        let store = fixture();
        let now = at(date(2023, 6, 1), 8, 0);
        let rows = arrival_rows(&store, StationId(1), now).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, StopId(4));
        assert_eq!(rows[0].station.as_deref(), Some("Wschodnia"));
        assert_eq!(rows[0].arrival_time.as_deref(), Some("09:45"));
    }

    #[test]
    fn cancelled_train_shows_the_marker_delay() {
        let store = fixture();
        let d = date(2023, 6, 1);
        store
            .upsert_status(
                StopId(1),
                d,
                &StatusEdit {
                    is_cancelled: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        let rows = departure_rows(&store, StationId(1), at(d, 8, 0)).unwrap();
        assert_eq!(rows[0].delay, Delay::Cancelled);
    }

    #[test]
    fn reassignment_clears_the_original_flag() {
        let store = fixture();
        let d = date(2023, 6, 1);
        store
            .upsert_status(
                StopId(1),
                d,
                &StatusEdit {
                    track_id: Some(TrackId(102)),
                    ..Default::default()
                },
            )
            .unwrap();
        let rows = departure_rows(&store, StationId(1), at(d, 8, 0)).unwrap();
        assert!(!rows[0].original);
        assert_eq!(rows[0].track, "2");
    }

    #[test]
    fn stop_details_resolve_todays_overlay() {
        let store = fixture();
        let d = date(2023, 6, 1);
        store
            .upsert_status(
                StopId(2),
                d,
                &StatusEdit {
                    arrival_delay: Some(8),
                    ..Default::default()
                },
            )
            .unwrap();
        let details = stop_details(&store, StopId(2), d).unwrap();
        assert_eq!(details.train_type, "Osobowy");
        assert_eq!(details.station, "Wschodnia");
        assert_eq!(details.station_id, StationId(2));
        assert_eq!(details.arrival.as_deref(), Some("11:00"));
        assert_eq!(details.arrival_delay, Some(8));
        assert_eq!(details.track_id, TrackId(201));
    }

    #[test]
    fn stop_details_without_status_have_no_delays() {
        let store = fixture();
        let details = stop_details(&store, StopId(1), date(2023, 6, 1)).unwrap();
        assert_eq!(details.arrival_delay, None);
        assert_eq!(details.departure_delay, None);
        assert!(!details.is_cancelled);
    }

    #[test]
    fn train_details_walk_the_whole_trip() {
        let store = fixture();
        let details = train_details(&store, StopId(2), date(2023, 6, 1)).unwrap();
        assert_eq!(details.train_number, "1001 Bałtyk");
        assert_eq!(details.final_station, "Wschodnia");
        assert_eq!(details.stops.len(), 2);
        assert_eq!(details.stops[0].station, "Centralna");
        assert_eq!(details.stops[1].station, "Wschodnia");
    }

    #[test]
    fn track_options_format_the_availability() {
        let store = fixture();
        let options = track_options(&store, StopId(1), date(2023, 6, 1)).unwrap();
        // Both station-1 tracks are free at 10:00 (the 09:45 terminator
        // on track 2 departs at 09:50).
        assert_eq!(options.len(), 2);
        assert!(options.iter().all(|o| o.available_to.is_none()));
    }

    #[test]
    fn edit_commits_and_names_the_owning_station() {
        let store = fixture();
        let d = date(2023, 6, 1);
        let station = commit_edit(
            &store,
            StopId(1),
            &StatusEdit {
                departure_delay: Some(10),
                ..Default::default()
            },
            d,
        )
        .unwrap();
        assert_eq!(station, StationId(1));
        assert_eq!(
            store.status(StopId(1), d).unwrap().unwrap().departure_delay,
            10
        );
    }

    #[test]
    fn edit_follows_the_reassigned_track_for_notification() {
        let store = fixture();
        let d = date(2023, 6, 1);
        let station = commit_edit(
            &store,
            StopId(1),
            &StatusEdit {
                track_id: Some(TrackId(102)),
                ..Default::default()
            },
            d,
        )
        .unwrap();
        assert_eq!(station, StationId(1));
    }

    #[test]
    fn edit_rejects_a_track_at_another_station() {
        let store = fixture();
        let err = commit_edit(
            &store,
            StopId(1),
            &StatusEdit {
                track_id: Some(TrackId(201)),
                ..Default::default()
            },
            date(2023, 6, 1),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        // Nothing was written.
        assert_eq!(store.status(StopId(1), date(2023, 6, 1)).unwrap(), None);
    }

    #[test]
    fn edit_unknown_stop_is_not_found() {
        let store = fixture();
        let err = commit_edit(
            &store,
            StopId(99),
            &StatusEdit::default(),
            date(2023, 6, 1),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn app_error_maps_the_core_taxonomy() {
        assert!(matches!(
            AppError::from(CoreError::Validation("bad".into())),
            AppError::BadRequest { .. }
        ));
        assert!(matches!(
            AppError::from(CoreError::not_found("stop", 1)),
            AppError::NotFound { .. }
        ));
        assert!(matches!(
            AppError::from(CoreError::Store("io".into())),
            AppError::Internal { .. }
        ));
    }
}
