//! Live station departure and arrival boards.
//!
//! Serves real-time platform, entrance, station and edge displays over
//! WebSockets from a static timetable plus a sparse per-day status
//! overlay. Operator edits (delays, cancellations, track changes, bus
//! substitution) are pushed to every affected display through a
//! per-station update hub.

pub mod board;
pub mod collision;
pub mod domain;
pub mod error;
pub mod hub;
pub mod overlay;
pub mod session;
pub mod store;
pub mod web;
