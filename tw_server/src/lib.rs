//! Thetawaves HTTP server: auth endpoints, the session gate and the song API.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
