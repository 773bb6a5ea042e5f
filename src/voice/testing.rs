//! Shared voice test doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::errors::PlaybackError;
use crate::media::{MediaDescriptor, MediaResolver};
use crate::voice::source::{AudioSource, SourceBuilder, VolumeHandle};
use crate::voice::transport::{PlaybackObserver, VoiceConnector, VoiceTransport};
use crate::voice::{GuildId, VoiceChannelId};

pub struct FakeSource {
    label: String,
    volume: Arc<VolumeHandle>,
}

impl FakeSource {
    pub fn boxed(label: &str) -> Box<dyn AudioSource> {
        Box::new(Self {
            label: label.to_string(),
            volume: VolumeHandle::new(1.0),
        })
    }
}

#[async_trait]
impl AudioSource for FakeSource {
    fn describe(&self) -> &str {
        &self.label
    }

    fn volume(&self) -> Arc<VolumeHandle> {
        self.volume.clone()
    }

    async fn read_chunk(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Ok(0)
    }

    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Builds [`FakeSource`]s that keep the volume handle they were given.
pub struct FakeSourceBuilder;

impl SourceBuilder for FakeSourceBuilder {
    fn build(
        &self,
        _locator: &crate::media::PlayableLocator,
        description: &str,
        volume: Arc<VolumeHandle>,
    ) -> Result<Box<dyn AudioSource>> {
        Ok(Box::new(FakeSource {
            label: description.to_string(),
            volume,
        }))
    }
}

pub struct FakeTransport {
    channel: VoiceChannelId,
    playing: bool,
}

#[async_trait]
impl VoiceTransport for FakeTransport {
    fn channel(&self) -> &VoiceChannelId {
        &self.channel
    }

    async fn move_to(&mut self, channel: VoiceChannelId) -> Result<()> {
        self.channel = channel;
        Ok(())
    }

    async fn play(
        &mut self,
        _source: Box<dyn AudioSource>,
        _observer: Arc<dyn PlaybackObserver>,
    ) -> Result<()> {
        self.playing = true;
        Ok(())
    }

    async fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.playing = false;
        Ok(())
    }
}

pub struct FakeConnector {
    connects: AtomicUsize,
    fail: bool,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            connects: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            connects: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceConnector for FakeConnector {
    async fn connect(
        &self,
        _guild: &GuildId,
        channel: &VoiceChannelId,
    ) -> Result<Box<dyn VoiceTransport>> {
        if self.fail {
            bail!("voice connect refused");
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeTransport {
            channel: channel.clone(),
            playing: false,
        }))
    }
}

pub struct NullObserver;

impl NullObserver {
    pub fn arc() -> Arc<dyn PlaybackObserver> {
        Arc::new(NullObserver)
    }
}

impl PlaybackObserver for NullObserver {
    fn on_playback_complete(&self, _error: Option<PlaybackError>) {}
}

/// Resolver that returns its canned descriptors immediately.
pub struct StubResolver {
    descriptors: Vec<MediaDescriptor>,
}

impl StubResolver {
    pub fn with(descriptors: Vec<MediaDescriptor>) -> Self {
        Self { descriptors }
    }
}

#[async_trait]
impl MediaResolver for StubResolver {
    async fn resolve(&self, query: &str, _download: bool) -> Result<Vec<MediaDescriptor>> {
        if self.descriptors.is_empty() {
            return Err(crate::errors::ResolveError::NoEntries(query.to_string()).into());
        }
        Ok(self.descriptors.clone())
    }
}

/// Resolver that parks until the test opens the gate, for exercising what
/// happens to the session while a resolution is in flight.
pub struct GatedResolver {
    descriptors: Vec<MediaDescriptor>,
    gate: Arc<Notify>,
}

impl GatedResolver {
    pub fn with(descriptors: Vec<MediaDescriptor>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                descriptors,
                gate: gate.clone(),
            },
            gate,
        )
    }
}

#[async_trait]
impl MediaResolver for GatedResolver {
    async fn resolve(&self, _query: &str, _download: bool) -> Result<Vec<MediaDescriptor>> {
        self.gate.notified().await;
        Ok(self.descriptors.clone())
    }
}
