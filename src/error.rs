//! Error type for render sessions.
//!
//! Only fatal conditions live here. Unparsable protocol lines are
//! skipped at the dispatcher and never surface as a [`RenderError`].

use std::io;
use thiserror::Error;

/// Fatal failure of a render session.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The response carried no body to read from.
    #[error("response carried no body")]
    MissingBody,

    /// Reading the transport failed.
    #[error("transport read failed: {0}")]
    Transport(#[source] io::Error),

    /// The remote service sent an explicit `error` event.
    ///
    /// Displays as the backend-supplied message, unchanged.
    #[error("{0}")]
    Remote(String),

    /// The display sink failed to write.
    #[error("display sink failed: {0}")]
    Display(#[source] io::Error),

    /// The caller abandoned the session before it settled.
    #[error("render session cancelled")]
    Cancelled,

    /// An actor thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name.
        name: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl RenderError {
    /// Whether this error came from the remote service rather than the
    /// local transport or display.
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}
