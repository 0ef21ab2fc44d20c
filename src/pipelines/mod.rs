// Pipeline modules organized by functionality
pub mod emotion;
pub mod utils;

// Re-export pipeline types for convenience
pub use emotion::*;
