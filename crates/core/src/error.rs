use crate::types::DbId;

/// Failures raised by domain logic, independent of transport.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No row with this primary key; `entity` is a display name such as "Loan".
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Client input was rejected; the message is shown to the client as is.
    #[error("{0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A failure the client cannot fix (encoding, numeric breakdown).
    #[error("Internal error: {0}")]
    Internal(String),
}
