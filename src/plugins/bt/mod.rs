pub mod driver;
pub mod resolver;
