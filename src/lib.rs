pub mod analyzers;
pub mod collector;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod gbfs;
pub mod infra;
pub mod output;
pub mod plots;
pub mod services;
pub mod store;
pub mod window;

pub use errors::LogError;
