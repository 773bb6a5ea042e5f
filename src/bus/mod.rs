pub mod events;
pub mod queue;

pub use events::{Invocation, Reply};
pub use queue::{MessageBus, ReplyCallback};
