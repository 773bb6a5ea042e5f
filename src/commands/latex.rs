//! LaTeX rendering command.

use std::sync::Arc;

use async_trait::async_trait;

use crate::bus::Reply;
use crate::commands::context::CommandContext;
use crate::commands::registry::Command;
use crate::errors::CommandError;
use crate::render::LatexRenderer;

/// `latex <markup>`: compile markup to PNG pages and attach them.
pub struct LatexCommand {
    renderer: Arc<LatexRenderer>,
}

impl LatexCommand {
    pub fn new(renderer: Arc<LatexRenderer>) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl Command for LatexCommand {
    fn name(&self) -> &str {
        "latex"
    }

    fn usage(&self) -> &str {
        "latex <markup>"
    }

    fn description(&self) -> &str {
        "Renders LaTeX markup as images."
    }

    fn owner_only(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &CommandContext, args: &str) -> Result<Option<String>, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage().to_string()));
        }
        let pages = self.renderer.render(args).await?;
        ctx.send(Reply::to(&ctx.invocation, "").with_attachments(pages));
        Ok(None)
    }
}
