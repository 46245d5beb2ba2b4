// Adapters layer: concrete implementations for external systems (alignment tools, local files).

pub mod blast;
pub mod storage;

pub use blast::{AlignmentCommand, AlignmentRunner, ProcessRunner, SearchSettings, ToolOutput};
pub use storage::LocalStorage;
