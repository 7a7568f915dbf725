mod apiclient;
mod error;
mod http;
mod models;
mod normalizer;
mod reporter;

#[cfg(test)]
mod tests;

pub use apiclient::*;
pub use error::*;
pub use http::*;
pub use models::*;
pub use normalizer::*;
pub use reporter::*;
