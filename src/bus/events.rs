//! Event types for the message bus.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Command invocation received from a gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    /// Gateway name (e.g. "console").
    pub gateway: String,
    /// Guild (server) identifier within the gateway.
    pub guild: String,
    /// Text channel the invocation arrived on.
    pub channel: String,
    /// Invoking user identifier.
    pub sender: String,
    /// Raw message text, including the command prefix.
    pub content: String,
    /// Voice channel the invoking user is currently in, if any.
    #[serde(default)]
    pub voice_channel: Option<String>,
    /// When the invocation was received.
    #[serde(default = "now")]
    pub timestamp: DateTime<Local>,
}

fn now() -> DateTime<Local> {
    Local::now()
}

impl Invocation {
    /// Create a new invocation with required fields and sensible defaults.
    pub fn new(
        gateway: impl Into<String>,
        guild: impl Into<String>,
        channel: impl Into<String>,
        sender: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            gateway: gateway.into(),
            guild: guild.into(),
            channel: channel.into(),
            sender: sender.into(),
            content: content.into(),
            voice_channel: None,
            timestamp: Local::now(),
        }
    }

    /// Attach the invoking user's current voice channel.
    pub fn with_voice_channel(mut self, channel: impl Into<String>) -> Self {
        self.voice_channel = Some(channel.into());
        self
    }
}

/// Reply to deliver back through a gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// Target gateway name.
    pub gateway: String,
    /// Target guild identifier.
    pub guild: String,
    /// Target text channel.
    pub channel: String,
    /// Reply text.
    pub text: String,
    /// Files to send along with the text (rendered pages etc.).
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
}

impl Reply {
    /// Create a reply addressed to where `invocation` came from.
    pub fn to(invocation: &Invocation, text: impl Into<String>) -> Self {
        Self {
            gateway: invocation.gateway.clone(),
            guild: invocation.guild.clone(),
            channel: invocation.channel.clone(),
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// Attach files to the reply.
    pub fn with_attachments(mut self, files: Vec<PathBuf>) -> Self {
        self.attachments = files;
        self
    }
}
