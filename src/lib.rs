pub mod cli;
pub mod collector;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod server;
pub mod validity;
