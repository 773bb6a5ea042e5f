//! Command registry and dispatch.
//!
//! Commands are looked up by their bare name after the configured prefix.
//! Dispatch owns the whole policy around a handler: the owner gate, the
//! voice guard, and turning errors into replies (or into silence).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::commands::context::CommandContext;
use crate::errors::CommandError;

/// Gate that runs before a command body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    None,
    /// Connect to the invoker's channel, or cut off current playback.
    Voice,
}

/// One chat command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Bare name the command is invoked by.
    fn name(&self) -> &str;

    /// Argument shape shown in help, e.g. `"play <path>"`.
    fn usage(&self) -> &str {
        self.name()
    }

    fn description(&self) -> &str;

    fn owner_only(&self) -> bool {
        false
    }

    fn guard(&self) -> Guard {
        Guard::None
    }

    /// Execute with the rest of the line as `args` (trimmed, may be empty).
    /// The returned string, if any, is sent as the reply.
    async fn run(&self, ctx: &CommandContext, args: &str) -> Result<Option<String>, CommandError>;
}

pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command, replacing any existing one with the same name.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name().to_string();
        if self.commands.insert(name.clone(), command).is_some() {
            debug!("Replaced command '{}'", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// Split `content` into command name and argument rest.
    ///
    /// Returns `None` for anything that is not a command: no prefix, a bare
    /// prefix, or whitespace between prefix and name.
    pub fn parse<'a>(content: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
        let rest = content.trim().strip_prefix(prefix)?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return None;
        }
        match rest.split_once(char::is_whitespace) {
            Some((name, args)) => Some((name, args.trim())),
            None => Some((rest, "")),
        }
    }

    /// Serve one invocation end to end. Returns the reply text, if any.
    pub async fn dispatch(&self, ctx: &CommandContext) -> Option<String> {
        let prefix = &ctx.config.bot.command_prefix;
        let (name, args) = Self::parse(&ctx.invocation.content, prefix)?;

        if name == "help" {
            return Some(self.help_text(prefix));
        }

        let Some(command) = self.get(name) else {
            debug!("Unknown command '{}' from {}", name, ctx.invocation.sender);
            return None;
        };

        if command.owner_only() && !ctx.config.is_owner(&ctx.invocation.sender) {
            info!(
                "Denied owner-only command '{}' to {}",
                name, ctx.invocation.sender
            );
            return None;
        }

        if command.guard() == Guard::Voice {
            let session = ctx.obtain_session();
            if let Err(e) = session.ensure_voice(ctx.invoker_voice()).await {
                let err = CommandError::Internal(e);
                info!(
                    "Command '{}' from {} blocked: {}",
                    name, ctx.invocation.sender, err
                );
                return err.user_message();
            }
        }

        match command.run(ctx, args).await {
            Ok(reply) => reply,
            Err(e) => {
                match &e {
                    CommandError::Internal(inner) if e.is_internal() => error!(
                        "Command '{}' from {} failed: {:#}",
                        name, ctx.invocation.sender, inner
                    ),
                    _ => info!(
                        "Command '{}' from {} rejected: {}",
                        name, ctx.invocation.sender, e
                    ),
                }
                e.user_message()
            }
        }
    }

    /// The built-in `help` reply: every command with usage and description.
    pub fn help_text(&self, prefix: &str) -> String {
        let mut names: Vec<&String> = self.commands.keys().collect();
        names.sort();
        let mut lines = vec!["Commands:".to_string()];
        for name in names {
            if let Some(command) = self.commands.get(name) {
                lines.push(format!(
                    "  {}{} - {}",
                    prefix,
                    command.usage(),
                    command.description()
                ));
            }
        }
        lines.join("\n")
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
