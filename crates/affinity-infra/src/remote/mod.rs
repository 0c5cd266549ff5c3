//! HTTP clients for the Affinity Explorer API.

mod http;

pub use http::HttpAffinityApi;
