pub mod result;
pub mod segment;
pub mod tag;

// Re-export commonly used types
pub use result::{ExecutionResult, FailureKind, RunOutput};
pub use segment::{Position, Segment, UnterminatedFragment};
pub use tag::Tag;
