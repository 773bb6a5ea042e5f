//! Fixed-text commands defined in configuration.

use async_trait::async_trait;

use crate::commands::context::CommandContext;
use crate::commands::registry::Command;
use crate::errors::CommandError;

/// A command that always replies with the same configured text.
pub struct AutoreplyCommand {
    name: String,
    text: String,
}

impl AutoreplyCommand {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl Command for AutoreplyCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Replies with a fixed message."
    }

    async fn run(&self, _ctx: &CommandContext, _args: &str) -> Result<Option<String>, CommandError> {
        Ok(Some(self.text.clone()))
    }
}
