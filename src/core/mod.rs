pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod monitor;
pub mod notifier;
pub mod peers;
pub mod progress;
