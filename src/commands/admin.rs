//! Owner-only administrative commands.

use async_trait::async_trait;
use tracing::info;

use crate::commands::context::CommandContext;
use crate::commands::registry::Command;
use crate::errors::CommandError;

/// `say <message>`: repeat a message as the bot.
pub struct SayCommand;

#[async_trait]
impl Command for SayCommand {
    fn name(&self) -> &str {
        "say"
    }

    fn usage(&self) -> &str {
        "say <message>"
    }

    fn description(&self) -> &str {
        "Repeats a message."
    }

    fn owner_only(&self) -> bool {
        true
    }

    async fn run(&self, _ctx: &CommandContext, args: &str) -> Result<Option<String>, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage().to_string()));
        }
        Ok(Some(args.to_string()))
    }
}

/// `logout`: announce shutdown and stop the process.
pub struct LogoutCommand;

#[async_trait]
impl Command for LogoutCommand {
    fn name(&self) -> &str {
        "logout"
    }

    fn description(&self) -> &str {
        "Shuts the bot down."
    }

    fn owner_only(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &CommandContext, _args: &str) -> Result<Option<String>, CommandError> {
        info!("Shutdown requested by {}", ctx.invocation.sender);
        ctx.shutdown.cancel();
        Ok(Some("Logging out!".to_string()))
    }
}
