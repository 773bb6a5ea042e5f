//! Local voice transport backed by PulseAudio.
//!
//! Plays PCM through a paplay child process, one per source. The pump task
//! owns both child processes; aborting it kills them via `kill_on_drop`,
//! which is how replace and stop avoid overlapping audio.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::PlaybackError;
use crate::voice::source::{AudioSource, CHANNELS, SAMPLE_RATE};
use crate::voice::transport::{PlaybackObserver, VoiceConnector, VoiceTransport};
use crate::voice::{GuildId, VoiceChannelId};

fn pulse_server() -> String {
    if std::path::Path::new("/mnt/wslg/PulseServer").exists() {
        "unix:/mnt/wslg/PulseServer".to_string()
    } else {
        std::env::var("PULSE_SERVER").unwrap_or_default()
    }
}

/// Connects guilds to the machine's audio output.
pub struct LocalConnector {
    sink: Option<String>,
}

impl LocalConnector {
    pub fn new(sink: Option<String>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl VoiceConnector for LocalConnector {
    async fn connect(
        &self,
        guild: &GuildId,
        channel: &VoiceChannelId,
    ) -> Result<Box<dyn VoiceTransport>> {
        info!("Connecting local voice transport for guild {} in {}", guild, channel);
        Ok(Box::new(LocalTransport::new(
            channel.clone(),
            self.sink.clone(),
        )))
    }
}

pub struct LocalTransport {
    channel: VoiceChannelId,
    sink: Option<String>,
    playing: Arc<AtomicBool>,
    pump: Option<JoinHandle<()>>,
}

impl LocalTransport {
    pub fn new(channel: VoiceChannelId, sink: Option<String>) -> Self {
        Self {
            channel,
            sink,
            playing: Arc::new(AtomicBool::new(false)),
            pump: None,
        }
    }
}

#[async_trait]
impl VoiceTransport for LocalTransport {
    fn channel(&self) -> &VoiceChannelId {
        &self.channel
    }

    async fn move_to(&mut self, channel: VoiceChannelId) -> Result<()> {
        // A local sink is channel-agnostic; only the label changes.
        debug!("Re-binding local transport from {} to {}", self.channel, channel);
        self.channel = channel;
        Ok(())
    }

    async fn play(
        &mut self,
        mut source: Box<dyn AudioSource>,
        observer: Arc<dyn PlaybackObserver>,
    ) -> Result<()> {
        self.stop().await;

        let mut cmd = Command::new("paplay");
        cmd.args([
            "--raw",
            "--format=s16le",
            &format!("--rate={}", SAMPLE_RATE),
            &format!("--channels={}", CHANNELS),
        ]);
        if let Some(sink) = &self.sink {
            cmd.arg(format!("--device={sink}"));
        }
        let mut child = cmd
            .env("PULSE_SERVER", pulse_server())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("paplay failed to start\n  Install: sudo apt install pulseaudio-utils")?;
        let mut stdin = child
            .stdin
            .take()
            .context("paplay stdin unavailable")?;

        let playing = self.playing.clone();
        playing.store(true, Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            let result = pump(source.as_mut(), &mut stdin).await;
            // Closing stdin lets paplay drain its buffer and exit.
            drop(stdin);
            let _ = child.wait().await;
            playing.store(false, Ordering::SeqCst);
            match result {
                Ok(()) => observer.on_playback_complete(None),
                Err(e) => {
                    observer.on_playback_complete(Some(PlaybackError::new(format!("{e:#}"))))
                }
            }
        });
        self.pump = Some(handle);
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            let _ = pump.await;
        }
        self.playing.store(false, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.stop().await;
        debug!("Local transport for {} disconnected", self.channel);
        Ok(())
    }
}

impl Drop for LocalTransport {
    fn drop(&mut self) {
        if let Some(pump) = &self.pump {
            pump.abort();
        }
    }
}

async fn pump(source: &mut dyn AudioSource, stdin: &mut ChildStdin) -> Result<()> {
    let mut buf = vec![0u8; 16 * 1024];
    loop {
        let n = source.read_chunk(&mut buf).await?;
        if n == 0 {
            break;
        }
        stdin
            .write_all(&buf[..n])
            .await
            .context("write to paplay")?;
    }
    source.finish().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_binds_channel() {
        let connector = LocalConnector::new(None);
        let transport = connector
            .connect(&GuildId::new("g1"), &VoiceChannelId::new("General"))
            .await
            .unwrap();
        assert_eq!(transport.channel().as_str(), "General");
        assert!(!transport.is_playing());
    }

    #[tokio::test]
    async fn test_move_to_rebinds_label() {
        let mut transport = LocalTransport::new(VoiceChannelId::new("a"), None);
        transport.move_to(VoiceChannelId::new("b")).await.unwrap();
        assert_eq!(transport.channel().as_str(), "b");
    }

    #[tokio::test]
    async fn test_stop_and_disconnect_when_idle_are_noops() {
        let mut transport = LocalTransport::new(VoiceChannelId::new("a"), None);
        transport.stop().await;
        transport.disconnect().await.unwrap();
        assert!(!transport.is_playing());
    }
}
