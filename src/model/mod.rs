pub mod classifier;
pub mod download;
pub mod loader;
pub mod readiness;
