//! Consumers of aggregation results

pub mod console;

// Re-export for convenience
pub use console::ConsoleEventHandler;
