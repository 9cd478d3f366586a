// Application Layer - Use Cases and Business Logic

pub mod command;
pub mod playback;
pub mod registry;
pub mod worker;

// Re-exports
pub use command::{parse_command, Command, DEFAULT_COMMAND_PREFIX};
pub use playback::{PlaybackPorts, PlaybackService, PlaybackStats, PlayOutcome, PlayRequest};
pub use registry::{Drain, Enqueued, QueueRegistry, Rejected};
pub use worker::{GroupWorker, WorkerPorts, WorkerReport};
