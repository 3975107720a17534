//! Tile source abstraction
//!
//! A [`TileSource`] describes where tiles come from: a URL template
//! with `{z}`/`{x}`/`{y}` placeholders and an optional `{s}` subdomain
//! placeholder for load distribution across mirrors. The [`HttpClient`]
//! trait abstracts the transport so tests can inject mock clients.

mod http;
mod source;
mod types;

pub use http::ReqwestClient;
pub use source::TileSource;
pub use types::{HttpClient, ProviderError};

#[cfg(test)]
pub use http::tests::{MockHttpClient, ScriptedHttpClient};
