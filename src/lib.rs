//! quaver library: exposes internal modules for integration tests.

pub mod bus;
pub mod commands;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod media;
pub mod render;
pub mod runtime;
pub mod utils;
pub mod voice;
