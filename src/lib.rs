pub mod aggregator;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod server;
