//! End-to-end tests for the voice session lifecycle.
//!
//! Exercises the public registry API with fake transports:
//! 1. Natural completion returns the session to idle
//! 2. Guild sessions are fully isolated from one another
//! 3. The session volume persists across sources and scales live ones

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;

use quaver::errors::PlaybackError;
use quaver::media::{MediaDescriptor, MediaResolver, PlayableLocator};
use quaver::voice::{
    AudioSource, GuildId, PlaybackObserver, SessionRegistry, SessionState, SourceBuilder,
    VoiceChannelId, VoiceConnector, VoiceTransport, VolumeHandle,
};

// ─────────────────────────────────────────────────────────────
// Fakes: transport layer that captures observers and volumes
// ─────────────────────────────────────────────────────────────

struct SilentSource {
    description: String,
    volume: Arc<VolumeHandle>,
}

#[async_trait]
impl AudioSource for SilentSource {
    fn describe(&self) -> &str {
        &self.description
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

/// Builder that remembers the volume handle of every source it makes.
struct RecordingSourceBuilder {
    volumes: Arc<StdMutex<Vec<Arc<VolumeHandle>>>>,
}

impl RecordingSourceBuilder {
    fn new() -> (Self, Arc<StdMutex<Vec<Arc<VolumeHandle>>>>) {
        let volumes = Arc::new(StdMutex::new(Vec::new()));
        (
            Self {
                volumes: volumes.clone(),
            },
            volumes,
        )
    }
}

impl SourceBuilder for RecordingSourceBuilder {
    fn build(
        &self,
        _locator: &PlayableLocator,
        description: &str,
        volume: Arc<VolumeHandle>,
    ) -> Result<Box<dyn AudioSource>> {
        self.volumes.lock().unwrap().push(volume.clone());
        Ok(Box::new(SilentSource {
            description: description.to_string(),
            volume,
        }))
    }
}

type ObserverSlot = Arc<StdMutex<Option<Arc<dyn PlaybackObserver>>>>;

/// Transport that hands the latest observer to the test instead of playing.
struct CapturingTransport {
    channel: VoiceChannelId,
    playing: Arc<AtomicBool>,
    observer: ObserverSlot,
}

#[async_trait]
impl VoiceTransport for CapturingTransport {
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
        observer: Arc<dyn PlaybackObserver>,
    ) -> Result<()> {
        self.playing.store(true, Ordering::SeqCst);
        *self.observer.lock().unwrap() = Some(observer);
        Ok(())
    }

    async fn stop(&mut self) {
        self.playing.store(false, Ordering::SeqCst);
        *self.observer.lock().unwrap() = None;
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }
}

struct CapturingConnector {
    observer: ObserverSlot,
}

impl CapturingConnector {
    fn new() -> (Self, ObserverSlot) {
        let observer: ObserverSlot = Arc::new(StdMutex::new(None));
        (
            Self {
                observer: observer.clone(),
            },
            observer,
        )
    }
}

#[async_trait]
impl VoiceConnector for CapturingConnector {
    async fn connect(
        &self,
        _guild: &GuildId,
        channel: &VoiceChannelId,
    ) -> Result<Box<dyn VoiceTransport>> {
        Ok(Box::new(CapturingTransport {
            channel: channel.clone(),
            playing: Arc::new(AtomicBool::new(false)),
            observer: self.observer.clone(),
        }))
    }
}

struct SingleTrackResolver;

#[async_trait]
impl MediaResolver for SingleTrackResolver {
    async fn resolve(&self, query: &str, _download: bool) -> Result<Vec<MediaDescriptor>> {
        Ok(vec![MediaDescriptor {
            title: Some(format!("Resolved {query}")),
            locator: PlayableLocator::Remote(format!("https://cdn/{query}")),
        }])
    }
}

/// Resolver that parks every lookup until the test releases the gate.
struct GatedResolver {
    gate: Arc<Notify>,
}

#[async_trait]
impl MediaResolver for GatedResolver {
    async fn resolve(&self, query: &str, _download: bool) -> Result<Vec<MediaDescriptor>> {
        self.gate.notified().await;
        Ok(vec![MediaDescriptor {
            title: Some(format!("Resolved {query}")),
            locator: PlayableLocator::Remote(format!("https://cdn/{query}")),
        }])
    }
}

fn capturing_registry() -> (
    Arc<SessionRegistry>,
    ObserverSlot,
    Arc<StdMutex<Vec<Arc<VolumeHandle>>>>,
) {
    let (connector, observer) = CapturingConnector::new();
    let (builder, volumes) = RecordingSourceBuilder::new();
    let registry = SessionRegistry::new(
        Arc::new(connector),
        Arc::new(SingleTrackResolver),
        Arc::new(builder),
        0.5,
    );
    (registry, observer, volumes)
}

async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

// ─────────────────────────────────────────────────────────────
// Natural completion
// ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn finished_source_returns_session_to_idle() {
    let (registry, observer, _) = capturing_registry();
    let handle = registry.obtain(&GuildId::new("g1"));
    handle
        .join(Some(VoiceChannelId::new("General")), None)
        .await
        .unwrap();

    handle.play_local("/tmp/one.mp3").await.unwrap();
    assert_eq!(handle.state().await, SessionState::Playing);

    // The transport signals a clean end of stream.
    let captured = observer.lock().unwrap().take().unwrap();
    captured.on_playback_complete(None);
    settle().await;

    assert_eq!(handle.state().await, SessionState::Idle);
    assert!(handle.current_description().await.is_none());

    // The session stays connected and can play again.
    handle.play_local("/tmp/two.mp3").await.unwrap();
    assert_eq!(handle.state().await, SessionState::Playing);
}

#[tokio::test]
async fn failed_source_also_returns_session_to_idle() {
    let (registry, observer, _) = capturing_registry();
    let handle = registry.obtain(&GuildId::new("g1"));
    handle
        .join(Some(VoiceChannelId::new("General")), None)
        .await
        .unwrap();
    handle.play_local("/tmp/broken.mp3").await.unwrap();

    let captured = observer.lock().unwrap().take().unwrap();
    captured.on_playback_complete(Some(PlaybackError::new("decode failed")));
    settle().await;

    // The error is logged, never surfaced; the session just goes idle.
    assert_eq!(handle.state().await, SessionState::Idle);
}

#[tokio::test]
async fn stale_completion_after_replacement_is_ignored() {
    let (registry, observer, _) = capturing_registry();
    let handle = registry.obtain(&GuildId::new("g1"));
    handle
        .join(Some(VoiceChannelId::new("General")), None)
        .await
        .unwrap();

    handle.play_local("/tmp/first.mp3").await.unwrap();
    let first_observer = observer.lock().unwrap().take().unwrap();

    handle.play_local("/tmp/second.mp3").await.unwrap();

    // The first source's completion arrives after its replacement started.
    first_observer.on_playback_complete(None);
    settle().await;

    assert_eq!(handle.state().await, SessionState::Playing);
    assert_eq!(
        handle.current_description().await.as_deref(),
        Some("/tmp/second.mp3")
    );
}

// ─────────────────────────────────────────────────────────────
// Guild isolation
// ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn guild_sessions_do_not_share_state() {
    let (registry, _, _) = capturing_registry();

    let first = registry.obtain(&GuildId::new("g1"));
    let second = registry.obtain(&GuildId::new("g2"));
    first
        .join(Some(VoiceChannelId::new("Alpha")), None)
        .await
        .unwrap();
    second
        .join(Some(VoiceChannelId::new("Beta")), None)
        .await
        .unwrap();

    first.play_local("/tmp/a.mp3").await.unwrap();
    second.play_from_url("song", true).await.unwrap();

    assert_eq!(first.current_description().await.as_deref(), Some("/tmp/a.mp3"));
    assert_eq!(
        second.current_description().await.as_deref(),
        Some("Resolved song")
    );

    first.set_volume(80).await.unwrap();
    assert!((first.volume().await - 0.8).abs() < f32::EPSILON);
    assert!((second.volume().await - 0.5).abs() < f32::EPSILON);

    // Stopping one guild leaves the other playing.
    first.stop().await.unwrap();
    assert!(!registry.is_active(&GuildId::new("g1")));
    assert_eq!(second.state().await, SessionState::Playing);
}

#[tokio::test]
async fn slow_resolution_for_one_guild_does_not_stall_another() {
    let (connector, _) = CapturingConnector::new();
    let (builder, _) = RecordingSourceBuilder::new();
    let gate = Arc::new(Notify::new());
    let registry = SessionRegistry::new(
        Arc::new(connector),
        Arc::new(GatedResolver { gate: gate.clone() }),
        Arc::new(builder),
        0.5,
    );

    let first = registry.obtain(&GuildId::new("g1"));
    let second = registry.obtain(&GuildId::new("g2"));
    first
        .join(Some(VoiceChannelId::new("Alpha")), None)
        .await
        .unwrap();
    second
        .join(Some(VoiceChannelId::new("Beta")), None)
        .await
        .unwrap();

    // The first guild's resolution parks on the gate.
    let parked = {
        let first = first.clone();
        tokio::spawn(async move { first.play_from_url("slow", true).await })
    };
    settle().await;
    assert!(!parked.is_finished());

    // The second guild keeps working while that lookup is in flight,
    // and so does the first guild's own session lock.
    second.play_local("/tmp/b.mp3").await.unwrap();
    assert_eq!(second.state().await, SessionState::Playing);
    assert_eq!(first.state().await, SessionState::Idle);

    // Releasing the gate lets the parked playback finish normally.
    gate.notify_one();
    let title = parked.await.unwrap().unwrap();
    assert_eq!(title.as_deref(), Some("Resolved slow"));
    assert_eq!(first.state().await, SessionState::Playing);
}

// ─────────────────────────────────────────────────────────────
// Volume behavior
// ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn volume_scales_live_source_and_seeds_the_next() {
    let (registry, _, volumes) = capturing_registry();
    let handle = registry.obtain(&GuildId::new("g1"));
    handle
        .join(Some(VoiceChannelId::new("General")), None)
        .await
        .unwrap();

    handle.play_local("/tmp/one.mp3").await.unwrap();
    let first_volume = volumes.lock().unwrap()[0].clone();
    assert!((first_volume.get() - 0.5).abs() < f32::EPSILON);

    // Changing the volume reaches the source already playing.
    handle.set_volume(150).await.unwrap();
    assert!((first_volume.get() - 1.5).abs() < f32::EPSILON);

    // And the next source starts at the session's new volume.
    handle.play_local("/tmp/two.mp3").await.unwrap();
    let second_volume = volumes.lock().unwrap()[1].clone();
    assert!((second_volume.get() - 1.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn volume_survives_disconnect_only_as_default() {
    let (registry, _, _) = capturing_registry();
    let handle = registry.obtain(&GuildId::new("g1"));
    handle
        .join(Some(VoiceChannelId::new("General")), None)
        .await
        .unwrap();
    handle.set_volume(90).await.unwrap();
    handle.stop().await.unwrap();

    // A fresh session starts back at the configured default.
    let fresh = registry.obtain(&GuildId::new("g1"));
    assert!((fresh.volume().await - 0.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn negative_volume_clamps_to_silence() {
    let (registry, _, volumes) = capturing_registry();
    let handle = registry.obtain(&GuildId::new("g1"));
    handle
        .join(Some(VoiceChannelId::new("General")), None)
        .await
        .unwrap();
    handle.play_local("/tmp/one.mp3").await.unwrap();

    handle.set_volume(-40).await.unwrap();
    let live = volumes.lock().unwrap()[0].clone();
    assert_eq!(live.get(), 0.0);
}
