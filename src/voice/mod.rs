//! Voice playback: per-guild sessions over pluggable transports.
//!
//! The session registry owns one [`VoiceSession`] per guild behind a
//! per-guild async mutex. Commands go through [`SessionHandle`], which holds
//! the lock only across state mutations; media resolution runs unlocked so
//! one guild's slow lookup never stalls another guild's playback.

pub mod local;
pub mod registry;
pub mod session;
pub mod source;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use registry::{SessionHandle, SessionRegistry};
pub use session::{SessionState, VoiceSession};
pub use source::{AudioSource, FfmpegSourceBuilder, SourceBuilder, VolumeHandle};
pub use transport::{PlaybackObserver, VoiceConnector, VoiceTransport};

use std::fmt;

/// Identifier of a guild, the unit of voice isolation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuildId(String);

impl GuildId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a voice channel within a guild.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceChannelId(String);

impl VoiceChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
