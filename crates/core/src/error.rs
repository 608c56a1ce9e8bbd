/// Failure taxonomy for anything that talks to the record source.
///
/// Pure functions in this crate never return these for well-typed input;
/// they surface only through query validation and the request coordinator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// No response reached the record source (connect, DNS, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The caller's credentials were rejected.
    #[error("Unauthorized: {0}")]
    Auth(String),

    /// Malformed query parameters.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Any other non-2xx response.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl CoreError {
    /// Classify a non-2xx HTTP status into the taxonomy.
    ///
    /// - 401 / 403 map to [`CoreError::Auth`].
    /// - 400 / 422 map to [`CoreError::Validation`].
    /// - Everything else maps to [`CoreError::Server`].
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => CoreError::Auth(message),
            400 | 422 => CoreError::Validation(message),
            _ => CoreError::Server { status, message },
        }
    }

    /// Whether this error should be handed to the session collaborator.
    pub fn is_auth(&self) -> bool {
        matches!(self, CoreError::Auth(_))
    }
}
