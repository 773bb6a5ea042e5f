//! Base trait for chat gateways.

use anyhow::Result;
use async_trait::async_trait;

use crate::bus::events::Reply;

/// Trait that every gateway must implement.
///
/// Gateways are responsible for receiving user messages and forwarding them to
/// the message bus as invocations, and for delivering replies back out.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Gateway name as used in invocation routing (e.g. `"console"`).
    fn name(&self) -> &str;

    /// Start the gateway.
    ///
    /// Implementations should spawn their listener tasks, then return. The
    /// background tasks should keep running until [`stop`](Self::stop) is
    /// called.
    async fn start(&mut self) -> Result<()>;

    /// Stop the gateway gracefully.
    async fn stop(&mut self) -> Result<()>;

    /// Deliver a reply to the user through this gateway.
    async fn send(&self, reply: &Reply) -> Result<()>;

    /// Check whether the gateway is currently running.
    fn is_running(&self) -> bool;
}
