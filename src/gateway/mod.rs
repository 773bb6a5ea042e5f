//! Gateways: where invocations come from and replies go to.

pub mod base;
pub mod console;
pub mod manager;

pub use base::Gateway;
pub use console::ConsoleGateway;
pub use manager::GatewayManager;
