pub mod backends;
pub mod build;
pub mod changes;
pub mod cmdargs;
pub mod config;
pub mod error;
pub mod http;
pub mod interpolate;
pub mod logging;
pub mod server_info;
pub mod service;
