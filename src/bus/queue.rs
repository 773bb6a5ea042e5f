//! Async message queue decoupling gateways from command dispatch.
//!
//! Uses `tokio::sync::mpsc::unbounded_channel` for the inbound/outbound queues
//! and a subscriber callback per gateway for routing replies back out.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::bus::events::{Invocation, Reply};

/// Callback type for reply delivery, one per gateway.
pub type ReplyCallback =
    Arc<dyn Fn(Reply) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Async message bus between gateways and the command dispatcher.
///
/// Gateways push invocations to the inbound queue; the dispatcher processes
/// them and pushes replies to the outbound queue. The bus clones cheaply
/// because all internal state is behind `Arc`.
#[derive(Clone)]
pub struct MessageBus {
    /// Sender half for invocations.
    inbound_tx: UnboundedSender<Invocation>,
    /// Receiver half for invocations (shared so only one consumer drains).
    inbound_rx: Arc<Mutex<UnboundedReceiver<Invocation>>>,
    /// Sender half for replies.
    outbound_tx: UnboundedSender<Reply>,
    /// Receiver half for replies (shared so only one consumer drains).
    outbound_rx: Arc<Mutex<UnboundedReceiver<Reply>>>,
    /// Reply subscribers keyed by gateway name. Subscribing again replaces.
    subscribers: Arc<Mutex<HashMap<String, ReplyCallback>>>,
    /// Flag controlling the dispatch loop.
    running: Arc<AtomicBool>,
}

impl MessageBus {
    /// Create a new `MessageBus`.
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            inbound_tx,
            inbound_rx: Arc::new(Mutex::new(inbound_rx)),
            outbound_tx,
            outbound_rx: Arc::new(Mutex::new(outbound_rx)),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Publish an invocation from a gateway to the dispatcher (inbound).
    pub fn publish_inbound(&self, invocation: Invocation) {
        let _ = self.inbound_tx.send(invocation);
    }

    /// Consume the next invocation (blocks until available).
    ///
    /// Returns `None` if all senders have been dropped.
    pub async fn consume_inbound(&self) -> Option<Invocation> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await
    }

    /// Publish a reply from the dispatcher to gateways (outbound).
    pub fn publish_outbound(&self, reply: Reply) {
        let _ = self.outbound_tx.send(reply);
    }

    /// Consume the next reply (blocks until available).
    ///
    /// Returns `None` if all senders have been dropped.
    pub async fn consume_outbound(&self) -> Option<Reply> {
        let mut rx = self.outbound_rx.lock().await;
        rx.recv().await
    }

    /// Subscribe to replies targeted at a specific gateway.
    ///
    /// The callback is invoked for every reply whose `gateway` field matches.
    pub async fn subscribe_outbound(&self, gateway: impl Into<String>, callback: ReplyCallback) {
        let mut subs = self.subscribers.lock().await;
        subs.insert(gateway.into(), callback);
    }

    /// Dispatch replies to subscribed gateway callbacks.
    ///
    /// Run as a background task (`tokio::spawn`). Loops until
    /// [`stop`](Self::stop) is called.
    pub async fn dispatch_outbound(&self) {
        self.running.store(true, Ordering::SeqCst);

        while self.running.load(Ordering::SeqCst) {
            let reply = {
                let mut rx = self.outbound_rx.lock().await;
                // Timeout so the running flag is checked periodically.
                match tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv()).await {
                    Ok(Some(reply)) => reply,
                    Ok(None) => break,
                    Err(_) => continue,
                }
            };

            let subs = self.subscribers.lock().await;
            match subs.get(&reply.gateway) {
                Some(callback) => {
                    let gateway = reply.gateway.clone();
                    let fut = callback(reply);
                    // Spawned so a panicking gateway send cannot kill the loop.
                    if let Err(e) = tokio::spawn(fut).await {
                        error!("Error dispatching reply to {}: {}", gateway, e);
                    }
                }
                None => {
                    warn!("No gateway subscribed for reply to {}", reply.gateway);
                }
            }
        }
    }

    /// Stop the dispatcher loop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check whether the dispatcher is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
