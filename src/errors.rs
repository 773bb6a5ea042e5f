//! Domain error types for quaver.
//!
//! Typed errors at module boundaries replace string-encoded errors; the
//! dispatcher pattern-matches on these to decide what the invoking user sees.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Voice errors
// ---------------------------------------------------------------------------

/// Errors from voice session operations.
///
/// The `Display` strings are the exact chat replies rendered at the command
/// boundary. Neither variant ever terminates the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    /// An operation required an active voice connection and none exists.
    #[error("Not connected to a voice channel.")]
    NotConnected,

    /// The invoking user is not in a voice channel when one is required.
    #[error("You are not connected to a voice channel.")]
    NoChannel,
}

// ---------------------------------------------------------------------------
// Media resolution errors
// ---------------------------------------------------------------------------

/// Errors from the media resolver.
///
/// Propagate to the invoking command and are rendered as a chat reply there.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {detail}")]
    Tool { tool: String, detail: String },

    #[error("unreadable resolver output: {0}")]
    Parse(String),

    #[error("nothing playable found for '{0}'")]
    NoEntries(String),

    #[error("resolved entry has no usable locator")]
    NoLocator,
}

// ---------------------------------------------------------------------------
// Playback errors
// ---------------------------------------------------------------------------

/// Asynchronous playback failure, delivered through the completion observer
/// after the triggering command has already returned. Logged, never shown to
/// the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("playback failed: {0}")]
pub struct PlaybackError(pub String);

impl PlaybackError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

// ---------------------------------------------------------------------------
// Command boundary errors
// ---------------------------------------------------------------------------

/// Everything a command handler can fail with.
///
/// The dispatcher is the single place these are turned into replies; see
/// [`CommandError::user_message`].
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("command is owner-only")]
    Forbidden,

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Voice(#[from] VoiceError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CommandError {
    /// The reply shown to the invoking user, if this error produces one.
    ///
    /// `Unknown` and `Forbidden` are log-only. Voice and usage errors render
    /// verbatim; resolution failures get a short prefix; internal errors get
    /// a generic line so details stay in the log. Typed errors that arrive
    /// wrapped in `anyhow::Error` from deeper layers are unwrapped first so
    /// they render the same as the direct variants.
    pub fn user_message(&self) -> Option<String> {
        match self {
            CommandError::Unknown(_) | CommandError::Forbidden => None,
            CommandError::Voice(e) => Some(e.to_string()),
            CommandError::Usage(u) => Some(format!("Usage: {u}")),
            CommandError::Resolve(e) => Some(format!("Could not play that: {e}")),
            CommandError::Internal(e) => {
                if let Some(voice) = e.downcast_ref::<VoiceError>() {
                    Some(voice.to_string())
                } else if let Some(resolve) = e.downcast_ref::<ResolveError>() {
                    Some(format!("Could not play that: {resolve}"))
                } else {
                    Some("Something went wrong.".to_string())
                }
            }
        }
    }

    /// True for unexpected failures that deserve an error-level log entry.
    /// User-fault errors (wrong usage, not in a voice channel, bad query)
    /// are expected traffic and stay at lower levels.
    pub fn is_internal(&self) -> bool {
        match self {
            CommandError::Internal(e) => {
                e.downcast_ref::<VoiceError>().is_none()
                    && e.downcast_ref::<ResolveError>().is_none()
            }
            _ => false,
        }
    }
}
