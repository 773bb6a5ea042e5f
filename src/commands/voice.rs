//! Voice and playback commands.

use async_trait::async_trait;

use crate::commands::context::CommandContext;
use crate::commands::registry::{Command, Guard};
use crate::errors::{CommandError, VoiceError};
use crate::voice::VoiceChannelId;

/// `join [channel]`: connect or move without starting playback.
pub struct JoinCommand;

#[async_trait]
impl Command for JoinCommand {
    fn name(&self) -> &str {
        "join"
    }

    fn usage(&self) -> &str {
        "join [channel]"
    }

    fn description(&self) -> &str {
        "Joins a voice channel."
    }

    async fn run(&self, ctx: &CommandContext, args: &str) -> Result<Option<String>, CommandError> {
        let explicit = (!args.is_empty()).then(|| VoiceChannelId::new(args));
        let invoker = ctx.invoker_voice();
        if explicit.is_none() && invoker.is_none() {
            // No target channel at all; nothing to do.
            return Ok(None);
        }
        ctx.obtain_session().join(explicit, invoker).await?;
        Ok(None)
    }
}

/// `play <path>`: play a local audio file.
pub struct PlayCommand;

#[async_trait]
impl Command for PlayCommand {
    fn name(&self) -> &str {
        "play"
    }

    fn usage(&self) -> &str {
        "play <path>"
    }

    fn description(&self) -> &str {
        "Plays a local audio file."
    }

    fn guard(&self) -> Guard {
        Guard::Voice
    }

    async fn run(&self, ctx: &CommandContext, args: &str) -> Result<Option<String>, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage().to_string()));
        }
        let played = ctx.obtain_session().play_local(args).await?;
        Ok(Some(format!("Now playing: {played}")))
    }
}

/// `yt` and `stream`: resolve a URL or search query and play the result.
pub struct UrlPlayCommand {
    name: &'static str,
    usage: &'static str,
    description: &'static str,
    stream: bool,
}

impl UrlPlayCommand {
    /// `yt <query>`: download first, then play the local file.
    pub fn download() -> Self {
        Self {
            name: "yt",
            usage: "yt <url or search>",
            description: "Downloads and plays audio from a URL or search.",
            stream: false,
        }
    }

    /// `stream <query>`: play the resolved URL directly.
    pub fn stream() -> Self {
        Self {
            name: "stream",
            usage: "stream <url or search>",
            description: "Streams audio from a URL or search without downloading.",
            stream: true,
        }
    }
}

#[async_trait]
impl Command for UrlPlayCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn usage(&self) -> &str {
        self.usage
    }

    fn description(&self) -> &str {
        self.description
    }

    fn guard(&self) -> Guard {
        Guard::Voice
    }

    async fn run(&self, ctx: &CommandContext, args: &str) -> Result<Option<String>, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage().to_string()));
        }
        match ctx
            .obtain_session()
            .play_from_url(args, self.stream)
            .await?
        {
            Some(title) => Ok(Some(format!("Now playing: {title}"))),
            // The session moved on while we were resolving; say nothing.
            None => Ok(None),
        }
    }
}

/// `volume <percent>`: rescale the playing source and the session default.
pub struct VolumeCommand;

#[async_trait]
impl Command for VolumeCommand {
    fn name(&self) -> &str {
        "volume"
    }

    fn usage(&self) -> &str {
        "volume <percent>"
    }

    fn description(&self) -> &str {
        "Changes the playback volume."
    }

    async fn run(&self, ctx: &CommandContext, args: &str) -> Result<Option<String>, CommandError> {
        let percent: i64 = args
            .parse()
            .map_err(|_| CommandError::Usage(self.usage().to_string()))?;
        let Some(session) = ctx.peek_session() else {
            return Err(VoiceError::NotConnected.into());
        };
        session.set_volume(percent).await?;
        Ok(Some(format!("Changed volume to {percent}%")))
    }
}

/// `stop`: stop playback and leave the voice channel.
pub struct StopCommand;

#[async_trait]
impl Command for StopCommand {
    fn name(&self) -> &str {
        "stop"
    }

    fn description(&self) -> &str {
        "Stops playback and disconnects."
    }

    async fn run(&self, ctx: &CommandContext, _args: &str) -> Result<Option<String>, CommandError> {
        let Some(session) = ctx.peek_session() else {
            return Err(VoiceError::NotConnected.into());
        };
        session.stop().await?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{context, context_sessions, resolving_sessions, sessions};
    use crate::media::{MediaDescriptor, PlayableLocator};
    use crate::voice::{GuildId, SessionState};

    fn descriptor(title: &str) -> MediaDescriptor {
        MediaDescriptor {
            title: Some(title.to_string()),
            locator: PlayableLocator::Remote(format!("https://cdn/{title}")),
        }
    }

    #[tokio::test]
    async fn test_join_with_no_channel_is_silent() {
        let ctx = context("!join");
        let reply = JoinCommand.run(&ctx, "").await.unwrap();
        assert!(reply.is_none());
        // No session should have been created for a no-op join.
        assert!(ctx.peek_session().is_none());
    }

    #[tokio::test]
    async fn test_join_explicit_channel() {
        let ctx = context("!join Music");
        let reply = JoinCommand.run(&ctx, "Music").await.unwrap();
        assert!(reply.is_none());
        let session = ctx.peek_session().unwrap();
        assert_eq!(session.channel().await.unwrap().as_str(), "Music");
    }

    #[tokio::test]
    async fn test_join_uses_invoker_voice_channel() {
        let mut ctx = context("!join");
        ctx.invocation.voice_channel = Some("General".to_string());
        JoinCommand.run(&ctx, "").await.unwrap();
        let session = ctx.peek_session().unwrap();
        assert_eq!(session.channel().await.unwrap().as_str(), "General");
    }

    #[tokio::test]
    async fn test_play_requires_argument() {
        let ctx = context("!play");
        let err = PlayCommand.run(&ctx, "").await.unwrap_err();
        assert_eq!(err.user_message().unwrap(), "Usage: play <path>");
    }

    #[tokio::test]
    async fn test_play_announces_path() {
        let registry = sessions();
        let ctx = context_sessions(registry.clone(), "!play /tmp/a.mp3");
        let handle = registry.obtain(&GuildId::new("local"));
        handle
            .join(Some(VoiceChannelId::new("General")), None)
            .await
            .unwrap();

        let reply = PlayCommand.run(&ctx, "/tmp/a.mp3").await.unwrap();
        assert_eq!(reply.as_deref(), Some("Now playing: /tmp/a.mp3"));
        assert_eq!(handle.state().await, SessionState::Playing);
    }

    #[tokio::test]
    async fn test_yt_announces_resolved_title() {
        let registry = resolving_sessions(vec![descriptor("First"), descriptor("Second")]);
        let ctx = context_sessions(registry.clone(), "!yt some song");
        let handle = registry.obtain(&GuildId::new("local"));
        handle
            .join(Some(VoiceChannelId::new("General")), None)
            .await
            .unwrap();

        let reply = UrlPlayCommand::download()
            .run(&ctx, "some song")
            .await
            .unwrap();
        assert_eq!(reply.as_deref(), Some("Now playing: First"));
    }

    #[tokio::test]
    async fn test_yt_failure_renders_resolve_reply() {
        let registry = resolving_sessions(vec![]);
        let ctx = context_sessions(registry.clone(), "!yt nothing");
        let handle = registry.obtain(&GuildId::new("local"));
        handle
            .join(Some(VoiceChannelId::new("General")), None)
            .await
            .unwrap();

        let err = UrlPlayCommand::download()
            .run(&ctx, "nothing")
            .await
            .unwrap_err();
        let msg = err.user_message().unwrap();
        assert!(msg.starts_with("Could not play that:"));
    }

    #[tokio::test]
    async fn test_volume_requires_number() {
        let ctx = context("!volume loud");
        let err = VolumeCommand.run(&ctx, "loud").await.unwrap_err();
        assert_eq!(err.user_message().unwrap(), "Usage: volume <percent>");
    }

    #[tokio::test]
    async fn test_volume_without_session_reports_not_connected() {
        let ctx = context("!volume 50");
        let err = VolumeCommand.run(&ctx, "50").await.unwrap_err();
        assert_eq!(
            err.user_message().unwrap(),
            "Not connected to a voice channel."
        );
    }

    #[tokio::test]
    async fn test_volume_confirms_percentage() {
        let registry = sessions();
        let ctx = context_sessions(registry.clone(), "!volume 20");
        let handle = registry.obtain(&GuildId::new("local"));
        handle
            .join(Some(VoiceChannelId::new("General")), None)
            .await
            .unwrap();

        let reply = VolumeCommand.run(&ctx, "20").await.unwrap();
        assert_eq!(reply.as_deref(), Some("Changed volume to 20%"));
        assert!((handle.volume().await - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_stop_without_session_reports_not_connected() {
        let ctx = context("!stop");
        let err = StopCommand.run(&ctx, "").await.unwrap_err();
        assert_eq!(
            err.user_message().unwrap(),
            "Not connected to a voice channel."
        );
    }

    #[tokio::test]
    async fn test_stop_disconnects_and_forgets_the_guild() {
        let registry = sessions();
        let ctx = context_sessions(registry.clone(), "!stop");
        let handle = registry.obtain(&GuildId::new("local"));
        handle
            .join(Some(VoiceChannelId::new("General")), None)
            .await
            .unwrap();

        let reply = StopCommand.run(&ctx, "").await.unwrap();
        assert!(reply.is_none());
        assert!(ctx.peek_session().is_none());
    }
}
