pub mod bt;
pub mod log;
pub mod registry;
pub mod telegram;
