//! Errors raised by the engine adapter.

use thiserror::Error;

use super::DatabaseLocation;

/// Errors raised while talking to SQLite and its spatial extension.
///
/// `rusqlite` copies the engine's diagnostic text into the wrapped
/// [`rusqlite::Error`] and frees the engine allocation itself, so every
/// variant owns its message outright.
#[derive(Debug, Error)]
pub enum EngineError {
    /// SQLite refused to open or create the database.
    #[error("failed to open database {location}: {source}")]
    Open {
        /// Database that was requested.
        location: DatabaseLocation,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Applying a connection setting failed.
    #[error("failed to configure connection ({setting}): {source}")]
    Configure {
        /// Setting being applied.
        setting: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The spatial extension could not be attached to the connection.
    #[error("failed to attach spatial extension {extension}: {message}")]
    AttachExtension {
        /// Name of the extension being attached.
        extension: String,
        /// Diagnostic reported by the engine or the extension.
        message: String,
    },
    /// A batch of statements failed to execute.
    #[error("{message}")]
    Exec {
        /// Engine diagnostic text.
        message: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A statement could not be prepared.
    #[error("failed to prepare statement: {source}")]
    Prepare {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Stepping a prepared statement failed.
    #[error("failed to step statement: {source}")]
    Step {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The connection was used after it had been closed.
    #[error("connection to {location} is already closed")]
    Closed {
        /// Database the connection pointed at.
        location: DatabaseLocation,
    },
}

impl EngineError {
    /// Wrap a failed statement, keeping the engine's message text.
    ///
    /// Also used by callers that drive `rusqlite` directly, e.g. for
    /// transaction control.
    #[must_use]
    pub fn exec(source: rusqlite::Error) -> Self {
        let message = engine_message(&source);
        Self::Exec { message, source }
    }
}

/// Extract the diagnostic SQLite attached to an error, falling back to the
/// error's own description.
pub(crate) fn engine_message(error: &rusqlite::Error) -> String {
    match error {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.clone(),
        other => other.to_string(),
    }
}
