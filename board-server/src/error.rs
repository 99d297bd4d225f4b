//! Core error taxonomy.
//!
//! These cover the query and edit paths. A client disconnect is not an
//! error (sessions treat it as a normal terminal transition), and no
//! failure here is ever fatal to the process: one session's trouble
//! must not affect other sessions or the update hub.

/// Errors surfaced by the store boundary and the resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Unknown entity identifier. A client-visible failure for query
    /// endpoints; inside a live session it degrades to an empty board.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Malformed or inconsistent edit payload.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Store read/write failure. Logged, and within a live session
    /// treated as "try again on the next cycle".
    #[error("store failure: {0}")]
    Store(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::not_found("stop", 17);
        assert_eq!(err.to_string(), "stop 17 not found");

        let err = CoreError::Validation("delay out of range".into());
        assert_eq!(err.to_string(), "validation failed: delay out of range");

        let err = CoreError::Store("connection reset".into());
        assert_eq!(err.to_string(), "store failure: connection reset");
    }
}
