//! Bot runtime: wires configuration, voice, commands, and gateways together
//! and runs until shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bus::{MessageBus, Reply};
use crate::commands::{build_registry, CommandContext, CommandRegistry};
use crate::config::Config;
use crate::gateway::GatewayManager;
use crate::media::YtDlpResolver;
use crate::render::LatexRenderer;
use crate::voice::local::LocalConnector;
use crate::voice::{FfmpegSourceBuilder, SessionRegistry};

/// Run the bot until ctrl-c or a `logout` command.
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);
    let media_dir = config.media_path();

    let sessions = SessionRegistry::new(
        Arc::new(LocalConnector::new(config.voice.sink.clone())),
        Arc::new(YtDlpResolver::new(
            config.resolver.clone(),
            media_dir.clone(),
        )),
        Arc::new(FfmpegSourceBuilder),
        config.voice.default_volume,
    );
    let renderer = Arc::new(LatexRenderer::new(config.latex.clone(), &media_dir));
    let registry = Arc::new(build_registry(&config, renderer));

    let bus = MessageBus::new();
    let shutdown = CancellationToken::new();

    let manager = GatewayManager::new(&config, bus.clone(), shutdown.clone());
    manager.start_all().await;

    // Reply fan-out to gateway subscribers.
    let outbound = {
        let bus = bus.clone();
        tokio::spawn(async move {
            bus.dispatch_outbound().await;
        })
    };

    // Invocation dispatch: each command runs on its own task so one guild's
    // slow command never stalls another's.
    let dispatch = {
        let bus = bus.clone();
        let config = config.clone();
        let registry = registry.clone();
        let sessions = sessions.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                let invocation = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    inv = bus.consume_inbound() => match inv {
                        Some(inv) => inv,
                        None => break,
                    },
                };
                let ctx = CommandContext {
                    invocation,
                    config: config.clone(),
                    sessions: sessions.clone(),
                    bus: bus.clone(),
                    shutdown: shutdown.clone(),
                };
                let registry = registry.clone();
                tokio::spawn(async move {
                    serve(&registry, ctx).await;
                });
            }
        })
    };

    info!(
        "quaver running, prefix '{}', gateways: {}",
        config.bot.command_prefix,
        manager.enabled_gateways().join(", ")
    );

    tokio::select! {
        _ = shutdown.cancelled() => {
            info!("Shutdown requested");
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
            shutdown.cancel();
        }
    }

    // Let in-flight replies ("Logging out!") reach the gateways first.
    tokio::time::sleep(Duration::from_millis(200)).await;

    manager.stop_all().await;
    bus.stop();
    let _ = dispatch.await;
    let _ = outbound.await;

    Ok(())
}

async fn serve(registry: &CommandRegistry, ctx: CommandContext) {
    if let Some(text) = registry.dispatch(&ctx).await {
        ctx.send(Reply::to(&ctx.invocation, text));
    }
}
