//! Execution context handed to command handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::bus::{Invocation, MessageBus, Reply};
use crate::config::Config;
use crate::voice::{GuildId, SessionHandle, SessionRegistry, VoiceChannelId};

/// Everything a handler can reach while serving one invocation.
pub struct CommandContext {
    pub invocation: Invocation,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub bus: MessageBus,
    /// Cancelled to shut the whole process down (logout, ctrl-c).
    pub shutdown: CancellationToken,
}

impl CommandContext {
    pub fn guild_id(&self) -> GuildId {
        GuildId::new(self.invocation.guild.clone())
    }

    /// Voice channel the invoking user is in, if any.
    pub fn invoker_voice(&self) -> Option<VoiceChannelId> {
        self.invocation
            .voice_channel
            .clone()
            .map(VoiceChannelId::new)
    }

    /// Session handle for this guild, created on first use.
    pub fn obtain_session(&self) -> SessionHandle {
        self.sessions.obtain(&self.guild_id())
    }

    /// Session handle for this guild only if one exists.
    pub fn peek_session(&self) -> Option<SessionHandle> {
        self.sessions.peek(&self.guild_id())
    }

    /// Publish a reply beyond the handler's return value, e.g. one carrying
    /// attachments.
    pub fn send(&self, reply: Reply) {
        self.bus.publish_outbound(reply);
    }
}
