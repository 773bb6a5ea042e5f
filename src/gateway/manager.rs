//! Gateway manager.
//!
//! Initialises enabled gateways, starts them, and subscribes each one to the
//! replies addressed to it on the message bus.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex as TokioMutex;
use tracing::{error, info, warn};

use crate::bus::events::Reply;
use crate::bus::{MessageBus, ReplyCallback};
use crate::config::schema::Config;
use crate::gateway::base::Gateway;
use crate::gateway::console::ConsoleGateway;
use tokio_util::sync::CancellationToken;

/// Manages gateways and routes replies back to them.
pub struct GatewayManager {
    gateways: HashMap<String, Arc<TokioMutex<Box<dyn Gateway>>>>,
    bus: MessageBus,
}

impl GatewayManager {
    /// Create a new `GatewayManager`, initialising enabled gateways.
    pub fn new(config: &Config, bus: MessageBus, shutdown: CancellationToken) -> Self {
        let mut gateways: HashMap<String, Arc<TokioMutex<Box<dyn Gateway>>>> = HashMap::new();

        // Console.
        if config.gateways.console.enabled {
            let gw = ConsoleGateway::new(
                config.gateways.console.clone(),
                bus.clone(),
                shutdown.clone(),
            );
            gateways.insert("console".to_string(), Arc::new(TokioMutex::new(Box::new(gw))));
            info!("Console gateway enabled");
        }

        Self { gateways, bus }
    }

    /// Start all enabled gateways and subscribe them to their replies.
    pub async fn start_all(&self) {
        if self.gateways.is_empty() {
            warn!("No gateways enabled");
            return;
        }

        for (name, gateway) in &self.gateways {
            // Start the gateway.
            let gw = gateway.clone();
            let gateway_name = name.clone();
            tokio::spawn(async move {
                let mut guard = gw.lock().await;
                if let Err(e) = guard.start().await {
                    error!("Failed to start {} gateway: {}", gateway_name, e);
                }
            });

            // Route replies addressed to it.
            let gw = gateway.clone();
            let callback: ReplyCallback = Arc::new(move |reply: Reply| {
                let gw = gw.clone();
                Box::pin(async move {
                    let guard = gw.lock().await;
                    if let Err(e) = guard.send(&reply).await {
                        error!("Error sending to {}: {}", reply.gateway, e);
                    }
                })
            });
            self.bus.subscribe_outbound(name.clone(), callback).await;
        }
    }

    /// Stop all gateways.
    pub async fn stop_all(&self) {
        info!("Stopping all gateways...");

        for (name, gateway) in &self.gateways {
            let mut guard = gateway.lock().await;
            if let Err(e) = guard.stop().await {
                error!("Error stopping {} gateway: {}", name, e);
            } else {
                info!("Stopped {} gateway", name);
            }
        }
    }

    /// Get the list of enabled gateway names.
    pub fn enabled_gateways(&self) -> Vec<String> {
        self.gateways.keys().cloned().collect()
    }
}
