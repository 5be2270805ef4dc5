pub mod config;
pub mod error;
pub mod form;
pub mod model;
pub mod preprocessing;
pub mod server;
pub mod telemetry;


// Re-export common types
pub use error::InferenceError;
