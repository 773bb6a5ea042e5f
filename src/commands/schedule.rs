//! Class schedule command.

use async_trait::async_trait;

use crate::commands::context::CommandContext;
use crate::commands::registry::Command;
use crate::errors::CommandError;

/// `schedule`: print the configured weekly schedule block.
pub struct ScheduleCommand {
    text: String,
}

impl ScheduleCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Command for ScheduleCommand {
    fn name(&self) -> &str {
        "schedule"
    }

    fn description(&self) -> &str {
        "Shows the class schedule."
    }

    async fn run(&self, _ctx: &CommandContext, _args: &str) -> Result<Option<String>, CommandError> {
        Ok(Some(self.text.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::context;
    use crate::config::Config;

    #[tokio::test]
    async fn test_schedule_returns_configured_block() {
        let cmd = ScheduleCommand::new("Monday: raid night");
        let ctx = context("!schedule");
        let reply = cmd.run(&ctx, "").await.unwrap();
        assert_eq!(reply.as_deref(), Some("Monday: raid night"));
    }

    #[tokio::test]
    async fn test_default_schedule_lists_every_block() {
        let cmd = ScheduleCommand::new(Config::default().schedule_text);
        let ctx = context("!schedule");
        let reply = cmd.run(&ctx, "").await.unwrap().unwrap();
        for block in 1..=5 {
            assert!(
                reply.contains(&format!("Block {block}:")),
                "missing block {block} in default schedule"
            );
        }
        assert!(reply.contains("Wednesday clubs"));
    }
}
