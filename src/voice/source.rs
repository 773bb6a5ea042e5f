//! Audio sources.
//!
//! A source yields frame-aligned s16le PCM with a live volume multiplier
//! applied. The stock implementation decodes through an ffmpeg child
//! process, which handles local files and remote URLs alike.

use std::process::Stdio;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};

use crate::media::PlayableLocator;

/// PCM format pumped into transports.
pub const SAMPLE_RATE: u32 = 48_000;
pub const CHANNELS: u32 = 2;
/// Bytes per PCM frame (2 channels x 2 bytes per sample).
pub const FRAME_BYTES: usize = 4;

// ---------------------------------------------------------------------------
// Volume
// ---------------------------------------------------------------------------

/// Shared volume multiplier, adjustable while a source is playing.
///
/// Stored as `f32` bits in an `AtomicU32` so readers on the playback path
/// never take a lock.
pub struct VolumeHandle(AtomicU32);

impl VolumeHandle {
    pub fn new(volume: f32) -> Arc<Self> {
        Arc::new(Self(AtomicU32::new(volume.max(0.0).to_bits())))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Update the multiplier. Negative values clamp to zero.
    pub fn set(&self, volume: f32) {
        self.0.store(volume.max(0.0).to_bits(), Ordering::Relaxed);
    }
}

/// Scale interleaved s16le samples in place.
fn scale_samples(buf: &mut [u8], volume: f32) {
    if (volume - 1.0).abs() < f32::EPSILON {
        return;
    }
    for sample in buf.chunks_exact_mut(2) {
        let value = i16::from_le_bytes([sample[0], sample[1]]);
        let scaled = (value as f32 * volume).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        sample.copy_from_slice(&scaled.to_le_bytes());
    }
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// A pull-based PCM stream.
#[async_trait]
pub trait AudioSource: Send {
    /// Label for logs and replies (a title or a path).
    fn describe(&self) -> &str;

    /// The live volume handle scaling this source.
    fn volume(&self) -> Arc<VolumeHandle>;

    /// Read the next chunk of volume-scaled PCM into `buf`.
    ///
    /// Returns the number of bytes written, always a multiple of
    /// [`FRAME_BYTES`]; 0 means the stream has ended. `buf` must hold at
    /// least one frame.
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Called once after the stream ends: `Ok` for a clean end, `Err`
    /// describing the decode failure otherwise.
    async fn finish(&mut self) -> Result<()>;
}

/// Builds playable sources from locators.
pub trait SourceBuilder: Send + Sync {
    fn build(
        &self,
        locator: &PlayableLocator,
        description: &str,
        volume: Arc<VolumeHandle>,
    ) -> Result<Box<dyn AudioSource>>;
}

// ---------------------------------------------------------------------------
// ffmpeg source
// ---------------------------------------------------------------------------

/// PCM stream decoded by an ffmpeg child process.
pub struct FfmpegSource {
    child: Child,
    stdout: ChildStdout,
    volume: Arc<VolumeHandle>,
    description: String,
    /// Bytes held back when a read ended mid-frame.
    remainder: Vec<u8>,
    done: bool,
}

impl FfmpegSource {
    /// Spawn ffmpeg decoding `input` (a file path or URL) to s16le PCM.
    pub fn spawn(
        input: &str,
        description: impl Into<String>,
        volume: Arc<VolumeHandle>,
    ) -> Result<Self> {
        // -loglevel error keeps stderr small enough to never fill the pipe.
        let mut child = Command::new("ffmpeg")
            .args([
                "-i",
                input,
                "-vn",
                "-f",
                "s16le",
                "-ar",
                "48000",
                "-ac",
                "2",
                "-loglevel",
                "error",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("ffmpeg failed to start\n  Install: sudo apt install ffmpeg")?;
        let stdout = child
            .stdout
            .take()
            .context("ffmpeg stdout unavailable")?;
        Ok(Self {
            child,
            stdout,
            volume,
            description: description.into(),
            remainder: Vec::new(),
            done: false,
        })
    }
}

#[async_trait]
impl AudioSource for FfmpegSource {
    fn describe(&self) -> &str {
        &self.description
    }

    fn volume(&self) -> Arc<VolumeHandle> {
        self.volume.clone()
    }

    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.done {
            return Ok(0);
        }

        let mut filled = 0;
        if !self.remainder.is_empty() {
            let n = self.remainder.len().min(buf.len());
            buf[..n].copy_from_slice(&self.remainder[..n]);
            self.remainder.drain(..n);
            filled = n;
        }

        // Read until at least one whole frame is buffered or the stream ends.
        while filled == 0 || filled % FRAME_BYTES != 0 {
            if filled == buf.len() {
                break;
            }
            let n = self
                .stdout
                .read(&mut buf[filled..])
                .await
                .context("read from ffmpeg")?;
            if n == 0 {
                self.done = true;
                break;
            }
            filled += n;
        }

        // Hold back a trailing partial frame for the next call.
        let aligned = filled - (filled % FRAME_BYTES);
        if aligned < filled {
            self.remainder.extend_from_slice(&buf[aligned..filled]);
        }

        scale_samples(&mut buf[..aligned], self.volume.get());
        Ok(aligned)
    }

    async fn finish(&mut self) -> Result<()> {
        let mut detail = String::new();
        if let Some(mut stderr) = self.child.stderr.take() {
            let _ = stderr.read_to_string(&mut detail).await;
        }
        let status = self.child.wait().await.context("wait for ffmpeg")?;
        if status.success() {
            Ok(())
        } else {
            bail!("ffmpeg decode failed ({}): {}", status, detail.trim());
        }
    }
}

/// Stock builder running every locator through [`FfmpegSource`].
pub struct FfmpegSourceBuilder;

impl SourceBuilder for FfmpegSourceBuilder {
    fn build(
        &self,
        locator: &PlayableLocator,
        description: &str,
        volume: Arc<VolumeHandle>,
    ) -> Result<Box<dyn AudioSource>> {
        let source = FfmpegSource::spawn(&locator.as_arg(), description, volume)?;
        Ok(Box::new(source))
    }
}
