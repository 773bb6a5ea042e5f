//! Transport traits at the voice seam.
//!
//! A transport is one guild's live voice connection. Implementations own
//! the platform plumbing; sessions only see these traits, which keeps the
//! state machine testable without audio hardware.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::errors::PlaybackError;
use crate::voice::source::AudioSource;
use crate::voice::{GuildId, VoiceChannelId};

/// Receives the end-of-playback signal.
///
/// Fires exactly once per played source, and only when the source ends on
/// its own or fails mid-stream. Replacing or stopping a source does not
/// fire it. Errors are logged by the receiver, never shown to users.
pub trait PlaybackObserver: Send + Sync {
    fn on_playback_complete(&self, error: Option<PlaybackError>);
}

/// A live voice connection playing at most one source at a time.
#[async_trait]
pub trait VoiceTransport: Send {
    /// The voice channel this transport is bound to.
    fn channel(&self) -> &VoiceChannelId;

    /// Re-bind the connection to another channel without tearing it down.
    async fn move_to(&mut self, channel: VoiceChannelId) -> Result<()>;

    /// Start playing `source`, stopping any source already playing.
    async fn play(
        &mut self,
        source: Box<dyn AudioSource>,
        observer: Arc<dyn PlaybackObserver>,
    ) -> Result<()>;

    /// Stop the current source, staying connected.
    async fn stop(&mut self);

    fn is_playing(&self) -> bool;

    /// Tear down the connection and release its resources.
    async fn disconnect(&mut self) -> Result<()>;
}

/// Establishes voice transports.
#[async_trait]
pub trait VoiceConnector: Send + Sync {
    async fn connect(
        &self,
        guild: &GuildId,
        channel: &VoiceChannelId,
    ) -> Result<Box<dyn VoiceTransport>>;
}
