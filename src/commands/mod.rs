//! Command handlers and dispatch.

pub mod admin;
pub mod autoreply;
pub mod context;
pub mod dice;
pub mod latex;
pub mod registry;
pub mod schedule;
pub mod voice;

use std::sync::Arc;

use crate::config::Config;
use crate::render::LatexRenderer;

pub use context::CommandContext;
pub use registry::{Command, CommandRegistry, Guard};

/// Build the full command set from configuration.
pub fn build_registry(config: &Config, renderer: Arc<LatexRenderer>) -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register(Arc::new(voice::JoinCommand));
    registry.register(Arc::new(voice::PlayCommand));
    registry.register(Arc::new(voice::UrlPlayCommand::download()));
    registry.register(Arc::new(voice::UrlPlayCommand::stream()));
    registry.register(Arc::new(voice::VolumeCommand));
    registry.register(Arc::new(voice::StopCommand));

    registry.register(Arc::new(dice::RollCommand::plain()));
    registry.register(Arc::new(dice::RollCommand::with_sum()));
    registry.register(Arc::new(dice::RollCommand::concatenated()));

    registry.register(Arc::new(schedule::ScheduleCommand::new(
        config.schedule_text.clone(),
    )));
    registry.register(Arc::new(latex::LatexCommand::new(renderer)));

    registry.register(Arc::new(admin::SayCommand));
    registry.register(Arc::new(admin::LogoutCommand));

    for (name, text) in &config.autoreplies {
        registry.register(Arc::new(autoreply::AutoreplyCommand::new(name, text)));
    }

    registry
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use crate::bus::{Invocation, MessageBus};
    use crate::commands::context::CommandContext;
    use crate::config::Config;
    use crate::media::MediaDescriptor;
    use crate::voice::testing::{FakeConnector, FakeSourceBuilder, StubResolver};
    use crate::voice::SessionRegistry;

    pub fn invocation(content: &str) -> Invocation {
        Invocation::new("console", "local", "general", "tester", content)
    }

    /// Registry whose resolver yields nothing.
    pub fn sessions() -> Arc<SessionRegistry> {
        resolving_sessions(vec![])
    }

    /// Registry whose resolver yields the given descriptors.
    pub fn resolving_sessions(descriptors: Vec<MediaDescriptor>) -> Arc<SessionRegistry> {
        SessionRegistry::new(
            Arc::new(FakeConnector::new()),
            Arc::new(StubResolver::with(descriptors)),
            Arc::new(FakeSourceBuilder),
            0.5,
        )
    }

    pub fn context(content: &str) -> CommandContext {
        context_with(Config::default(), content)
    }

    pub fn context_with(config: Config, content: &str) -> CommandContext {
        CommandContext {
            invocation: invocation(content),
            config: Arc::new(config),
            sessions: sessions(),
            bus: MessageBus::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn context_sessions(sessions: Arc<SessionRegistry>, content: &str) -> CommandContext {
        CommandContext {
            invocation: invocation(content),
            config: Arc::new(Config::default()),
            sessions,
            bus: MessageBus::new(),
            shutdown: CancellationToken::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LatexConfig;
    use crate::render::LatexRenderer;
    use std::path::Path;

    fn full_registry() -> CommandRegistry {
        let renderer = LatexRenderer::new(LatexConfig::default(), Path::new("/tmp/quaver-test"));
        build_registry(&Config::default(), Arc::new(renderer))
    }

    #[test]
    fn test_build_registry_covers_builtin_commands() {
        let registry = full_registry();
        for name in [
            "join", "play", "yt", "stream", "volume", "stop", "r", "rs", "rnc", "schedule",
            "latex", "say", "logout",
        ] {
            assert!(registry.contains(name), "missing command {name}");
        }
    }

    #[test]
    fn test_build_registry_includes_configured_autoreplies() {
        let registry = full_registry();
        // The default configuration ships one sample autoreply.
        assert!(registry.contains("AmICool?"));
    }
}
