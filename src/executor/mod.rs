//! Running statechart sessions.

pub mod error;
pub mod instance;
pub mod machine;
pub mod queue;

pub use error::ExecutorError;
pub use instance::Instance;
pub use machine::Executor;
pub use queue::EventQueue;
