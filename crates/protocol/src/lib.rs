pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{DEFAULT_CHUNK_SIZE, TUS_VERSION};
pub use messages::FetchRequest;
pub use types::{HistorySummary, UploadMetadata};
