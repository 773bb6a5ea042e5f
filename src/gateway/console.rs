//! Console gateway: a stdin/stdout prompt for local operation.
//!
//! Regular lines become invocations on the message bus. Lines starting with
//! `/` are meta-commands that adjust the simulated identity without leaving
//! the process:
//!
//!   /guild <name>   switch to another guild
//!   /user <name>    speak as another user
//!   /voice <name>   join a simulated voice channel
//!   /voice          leave the simulated voice channel
//!   /quit           shut the bot down

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bus::events::{Invocation, Reply};
use crate::bus::MessageBus;
use crate::config::schema::ConsoleConfig;
use crate::gateway::base::Gateway;

/// Identity the console user currently speaks as.
struct ConsoleIdentity {
    guild: String,
    channel: String,
    user: String,
    voice_channel: Option<String>,
}

impl ConsoleIdentity {
    fn from_config(config: &ConsoleConfig) -> Self {
        Self {
            guild: config.default_guild.clone(),
            channel: config.default_channel.clone(),
            user: config.default_user.clone(),
            voice_channel: config.default_voice_channel.clone(),
        }
    }

    /// Apply a `/`-prefixed meta-command and describe the result.
    fn apply_meta(&mut self, line: &str) -> String {
        let (head, arg) = match line.split_once(char::is_whitespace) {
            Some((head, arg)) => (head, arg.trim()),
            None => (line, ""),
        };
        match head {
            "/guild" if !arg.is_empty() => {
                self.guild = arg.to_string();
                format!("[guild: {}]", self.guild)
            }
            "/user" if !arg.is_empty() => {
                self.user = arg.to_string();
                format!("[user: {}]", self.user)
            }
            "/voice" => {
                self.voice_channel = (!arg.is_empty()).then(|| arg.to_string());
                match &self.voice_channel {
                    Some(channel) => format!("[voice: {channel}]"),
                    None => "[voice: none]".to_string(),
                }
            }
            _ => format!("Unknown meta-command: {head}"),
        }
    }

    fn invocation(&self, content: &str) -> Invocation {
        let invocation = Invocation::new(
            "console",
            self.guild.clone(),
            self.channel.clone(),
            self.user.clone(),
            content,
        );
        match &self.voice_channel {
            Some(channel) => invocation.with_voice_channel(channel.clone()),
            None => invocation,
        }
    }
}

/// Gateway reading commands from stdin and printing replies to stdout.
pub struct ConsoleGateway {
    config: ConsoleConfig,
    bus: MessageBus,
    shutdown: CancellationToken,
    running: Arc<AtomicBool>,
}

impl ConsoleGateway {
    pub fn new(config: ConsoleConfig, bus: MessageBus, shutdown: CancellationToken) -> Self {
        Self {
            config,
            bus,
            shutdown,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Gateway for ConsoleGateway {
    fn name(&self) -> &str {
        "console"
    }

    async fn start(&mut self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);

        let bus = self.bus.clone();
        let shutdown = self.shutdown.clone();
        let running = self.running.clone();
        let mut identity = ConsoleIdentity::from_config(&self.config);

        info!(
            "Console gateway started as {}@{}",
            identity.user, identity.guild
        );

        // Spawn the stdin reader loop.
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            while running.load(Ordering::SeqCst) {
                let line = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    line = lines.next_line() => line,
                };

                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Console stdin closed");
                        break;
                    }
                    Err(e) => {
                        warn!("Console read error: {}", e);
                        break;
                    }
                };

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if line == "/quit" {
                    shutdown.cancel();
                    break;
                }
                if line.starts_with('/') {
                    println!("{}", identity.apply_meta(line));
                    continue;
                }

                bus.publish_inbound(identity.invocation(line));
            }

            running.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        info!("Console gateway stopped");
        Ok(())
    }

    async fn send(&self, reply: &Reply) -> Result<()> {
        if !reply.text.is_empty() {
            println!("{}", reply.text);
        }
        for path in &reply.attachments {
            println!("[attachment: {}]", path.display());
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
