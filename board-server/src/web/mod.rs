//! Web layer for the departure board server.
//!
//! Serves the display and voice WebSocket sessions plus the operator
//! timetable endpoints.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
