//! Process-wide registry of voice sessions.
//!
//! One session per guild, created on first use and removed when the guild
//! disconnects. Each session sits behind its own async mutex, so commands
//! for one guild serialize their mutating sections while other guilds
//! proceed in parallel. Handles bundle the session with the registry's
//! shared services (connector, resolver, source builder).

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use anyhow::Result;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::errors::{PlaybackError, ResolveError};
use crate::media::{MediaResolver, PlayableLocator};
use crate::voice::session::{SessionState, VoiceSession};
use crate::voice::source::{SourceBuilder, VolumeHandle};
use crate::voice::transport::{PlaybackObserver, VoiceConnector};
use crate::voice::{GuildId, VoiceChannelId};

pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<Mutex<VoiceSession>>>,
    connector: Arc<dyn VoiceConnector>,
    resolver: Arc<dyn MediaResolver>,
    sources: Arc<dyn SourceBuilder>,
    default_volume: f32,
}

impl SessionRegistry {
    pub fn new(
        connector: Arc<dyn VoiceConnector>,
        resolver: Arc<dyn MediaResolver>,
        sources: Arc<dyn SourceBuilder>,
        default_volume: f32,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            connector,
            resolver,
            sources,
            default_volume,
        })
    }

    /// Handle for `guild`, creating the session on first use.
    pub fn obtain(self: &Arc<Self>, guild: &GuildId) -> SessionHandle {
        let inner = self
            .sessions
            .entry(guild.clone())
            .or_insert_with(|| {
                info!("Creating voice session for guild {}", guild);
                Arc::new(Mutex::new(VoiceSession::new(
                    guild.clone(),
                    self.default_volume,
                )))
            })
            .clone();
        SessionHandle {
            guild: guild.clone(),
            inner,
            registry: self.clone(),
        }
    }

    /// Handle for `guild` only if a session already exists.
    pub fn peek(self: &Arc<Self>, guild: &GuildId) -> Option<SessionHandle> {
        let inner = self.sessions.get(guild)?.clone();
        Some(SessionHandle {
            guild: guild.clone(),
            inner,
            registry: self.clone(),
        })
    }

    pub fn guild_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_active(&self, guild: &GuildId) -> bool {
        self.sessions.contains_key(guild)
    }
}

/// Cloneable entry point for one guild's voice operations.
///
/// Methods lock the session only across state mutations. Media resolution
/// happens between two short critical sections, with a generation snapshot
/// deciding whether the result still applies.
#[derive(Clone)]
pub struct SessionHandle {
    guild: GuildId,
    inner: Arc<Mutex<VoiceSession>>,
    registry: Arc<SessionRegistry>,
}

impl SessionHandle {
    pub fn guild(&self) -> &GuildId {
        &self.guild
    }

    /// Join `explicit` or the invoker's channel; no-op when neither exists.
    pub async fn join(
        &self,
        explicit: Option<VoiceChannelId>,
        invoker_voice: Option<VoiceChannelId>,
    ) -> Result<Option<VoiceChannelId>> {
        let mut sess = self.inner.lock().await;
        sess.join(explicit, invoker_voice, self.registry.connector.as_ref())
            .await
    }

    /// Pre-playback guard: connect to the invoker's channel or cut off the
    /// current source.
    pub async fn ensure_voice(&self, invoker_voice: Option<VoiceChannelId>) -> Result<()> {
        let mut sess = self.inner.lock().await;
        sess.ensure_voice(invoker_voice, self.registry.connector.as_ref())
            .await
    }

    /// Play a local file. Returns the text shown in the reply.
    pub async fn play_local(&self, path: &str) -> Result<String> {
        let mut sess = self.inner.lock().await;
        sess.require_connected()?;
        let generation = sess.advance_generation();
        let volume = VolumeHandle::new(sess.volume());
        let locator = PlayableLocator::File(PathBuf::from(path));
        let source = self.registry.sources.build(&locator, path, volume)?;
        let observer = self.monitor(generation);
        sess.start_playback(source, observer).await?;
        Ok(path.to_string())
    }

    /// Resolve `query` and play the result. `stream` plays the remote
    /// locator directly; otherwise media is downloaded first.
    ///
    /// Returns the title to announce, or `None` when the session moved on
    /// while resolution was in flight and the result was discarded.
    pub async fn play_from_url(&self, query: &str, stream: bool) -> Result<Option<String>> {
        let snapshot = {
            let sess = self.inner.lock().await;
            sess.require_connected()?;
            sess.generation()
        };

        // No lock held here: a slow resolver stalls neither this guild's
        // other commands nor any other guild.
        let entries = self.registry.resolver.resolve(query, !stream).await?;
        let descriptor = entries
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NoEntries(query.to_string()))?;

        let mut sess = self.inner.lock().await;
        if sess.generation() != snapshot {
            debug!(
                "Guild {}: dropping stale resolution of '{}'",
                self.guild, query
            );
            return Ok(None);
        }
        sess.require_connected()?;
        let generation = sess.advance_generation();
        let title = descriptor.display_title(query);
        let volume = VolumeHandle::new(sess.volume());
        let source = self
            .registry
            .sources
            .build(&descriptor.locator, &title, volume)?;
        let observer = self.monitor(generation);
        sess.start_playback(source, observer).await?;
        Ok(Some(title))
    }

    /// Set the session volume from a percentage.
    pub async fn set_volume(&self, percent: i64) -> Result<f32> {
        let mut sess = self.inner.lock().await;
        sess.set_volume(percent)
    }

    /// Stop playback, disconnect, and drop the guild's registration.
    pub async fn stop(&self) -> Result<()> {
        let mut sess = self.inner.lock().await;
        sess.stop().await?;
        // Remove while still holding the lock so a racing obtain cannot see
        // a half-torn-down session.
        self.registry.sessions.remove(&self.guild);
        Ok(())
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state()
    }

    pub async fn volume(&self) -> f32 {
        self.inner.lock().await.volume()
    }

    pub async fn channel(&self) -> Option<VoiceChannelId> {
        self.inner.lock().await.channel().cloned()
    }

    pub async fn current_description(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .current_description()
            .map(str::to_string)
    }

    fn monitor(&self, generation: u64) -> Arc<dyn PlaybackObserver> {
        Arc::new(CompletionMonitor {
            guild: self.guild.clone(),
            generation,
            session: Arc::downgrade(&self.inner),
        })
    }
}

/// End-of-playback callback for one played source.
///
/// Holds the generation claimed when its source started; a completion whose
/// generation no longer matches the session is ignored. Playback errors are
/// logged here and never reach the user.
struct CompletionMonitor {
    guild: GuildId,
    generation: u64,
    session: Weak<Mutex<VoiceSession>>,
}

impl PlaybackObserver for CompletionMonitor {
    fn on_playback_complete(&self, error: Option<PlaybackError>) {
        if let Some(e) = &error {
            error!("Guild {}: {}", self.guild, e);
        }
        let Some(session) = self.session.upgrade() else {
            return;
        };
        let guild = self.guild.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let mut sess = session.lock().await;
            if sess.complete_playback(generation) {
                debug!("Guild {}: playback finished, session idle", guild);
            } else {
                debug!("Guild {}: ignoring stale completion", guild);
            }
        });
    }
}
