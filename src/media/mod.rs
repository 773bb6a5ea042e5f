//! Media resolution: turning queries and URLs into playable audio.

pub mod resolver;
pub mod ytdlp;

pub use resolver::{MediaDescriptor, MediaResolver, PlayableLocator};
pub use ytdlp::YtDlpResolver;
