pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod ratelimit;
pub mod types;
pub mod youtube;
