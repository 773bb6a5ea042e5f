//! Per-guild voice session state machine.
//!
//! A session tracks one guild's connection, current source, and volume.
//! All methods run under the registry's per-guild lock; the generation
//! counter is what lets work that happened outside the lock (resolution,
//! playback completion) detect that the session has moved on.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::errors::VoiceError;
use crate::voice::source::{AudioSource, VolumeHandle};
use crate::voice::transport::{PlaybackObserver, VoiceConnector, VoiceTransport};
use crate::voice::{GuildId, VoiceChannelId};

/// Connection state of one guild's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Idle,
    Playing,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Idle => "idle",
            SessionState::Playing => "playing",
        };
        f.write_str(name)
    }
}

/// Bookkeeping for the source currently on the transport.
struct CurrentSource {
    description: String,
    volume: Arc<VolumeHandle>,
}

pub struct VoiceSession {
    guild_id: GuildId,
    state: SessionState,
    connection: Option<Box<dyn VoiceTransport>>,
    current: Option<CurrentSource>,
    /// Session volume, persisted across sources until the session ends.
    volume: f32,
    /// Bumped whenever playback starts, is interrupted, or the session
    /// disconnects. Snapshots taken before unlocked work go stale when the
    /// counter moves.
    generation: u64,
}

impl VoiceSession {
    pub fn new(guild_id: GuildId, default_volume: f32) -> Self {
        Self {
            guild_id,
            state: SessionState::Disconnected,
            connection: None,
            current: None,
            volume: default_volume.max(0.0),
            generation: 0,
        }
    }

    pub fn guild_id(&self) -> &GuildId {
        &self.guild_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Channel of the live connection, if any.
    pub fn channel(&self) -> Option<&VoiceChannelId> {
        self.connection.as_deref().map(VoiceTransport::channel)
    }

    pub fn current_description(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.description.as_str())
    }

    pub fn require_connected(&self) -> Result<()> {
        if self.connection.is_some() {
            Ok(())
        } else {
            Err(VoiceError::NotConnected.into())
        }
    }

    /// Claim the next playback generation.
    ///
    /// Callers pair this with [`start_playback`](Self::start_playback) so
    /// completions and resolutions for anything earlier go stale.
    pub fn advance_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Join a voice channel: the explicit `target` wins, else the channel
    /// the invoking user is in. With neither, this is a no-op and returns
    /// `None`. Moves the existing connection when already connected
    /// elsewhere; playback survives a move.
    pub async fn join(
        &mut self,
        target: Option<VoiceChannelId>,
        invoker_voice: Option<VoiceChannelId>,
        connector: &dyn VoiceConnector,
    ) -> Result<Option<VoiceChannelId>> {
        let Some(target) = target.or(invoker_voice) else {
            debug!("Join for guild {} had no resolvable channel", self.guild_id);
            return Ok(None);
        };

        match self.connection.as_mut() {
            Some(transport) => {
                if transport.channel() == &target {
                    debug!("Guild {} already in {}", self.guild_id, target);
                } else {
                    transport.move_to(target.clone()).await?;
                    info!("Guild {} moved to {}", self.guild_id, target);
                }
            }
            None => self.connect(target.clone(), connector).await?,
        }
        Ok(Some(target))
    }

    /// Pre-playback guard: connect to the invoker's channel when not
    /// connected, or cut off the current source when one is playing.
    pub async fn ensure_voice(
        &mut self,
        invoker_voice: Option<VoiceChannelId>,
        connector: &dyn VoiceConnector,
    ) -> Result<()> {
        match self.connection.as_mut() {
            None => match invoker_voice {
                Some(channel) => self.connect(channel, connector).await,
                None => Err(VoiceError::NoChannel.into()),
            },
            Some(transport) => {
                if transport.is_playing() {
                    transport.stop().await;
                    self.current = None;
                    self.generation += 1;
                    self.state = SessionState::Idle;
                    debug!("Guild {} playback cut off for a new command", self.guild_id);
                }
                Ok(())
            }
        }
    }

    async fn connect(
        &mut self,
        channel: VoiceChannelId,
        connector: &dyn VoiceConnector,
    ) -> Result<()> {
        self.state = SessionState::Connecting;
        match connector.connect(&self.guild_id, &channel).await {
            Ok(transport) => {
                self.connection = Some(transport);
                self.state = SessionState::Idle;
                info!("Guild {} connected to voice channel {}", self.guild_id, channel);
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Hand a built source to the transport, replacing whatever plays now.
    pub async fn start_playback(
        &mut self,
        source: Box<dyn AudioSource>,
        observer: Arc<dyn PlaybackObserver>,
    ) -> Result<()> {
        let Some(transport) = self.connection.as_mut() else {
            return Err(VoiceError::NotConnected.into());
        };
        let description = source.describe().to_string();
        let volume = source.volume();
        transport.play(source, observer).await?;
        self.current = Some(CurrentSource {
            description: description.clone(),
            volume,
        });
        self.state = SessionState::Playing;
        info!("Guild {} now playing: {}", self.guild_id, description);
        Ok(())
    }

    /// Mark the session idle after a source ended on its own.
    ///
    /// Returns false when `generation` is stale, which means the completed
    /// source was already replaced or the session was torn down.
    pub fn complete_playback(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != SessionState::Playing {
            return false;
        }
        self.current = None;
        self.state = SessionState::Idle;
        true
    }

    /// Set the session volume from a user-facing percentage.
    ///
    /// Applies to the playing source in place and persists as the default
    /// for every later source in this session. Negative input clamps to
    /// silence.
    pub fn set_volume(&mut self, percent: i64) -> Result<f32> {
        self.require_connected()?;
        let volume = (percent as f32 / 100.0).max(0.0);
        self.volume = volume;
        if let Some(current) = &self.current {
            current.volume.set(volume);
        }
        debug!("Guild {} volume set to {}", self.guild_id, volume);
        Ok(volume)
    }

    /// Tear the session down: stop playback and release the connection.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut transport) = self.connection.take() else {
            return Err(VoiceError::NotConnected.into());
        };
        self.current = None;
        self.generation += 1;
        self.state = SessionState::Disconnected;
        transport.disconnect().await?;
        info!("Guild {} left voice", self.guild_id);
        Ok(())
    }
}
