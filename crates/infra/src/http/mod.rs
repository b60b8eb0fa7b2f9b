//! Physical HTTP layer
//!
//! One call to [`HttpClient::send`] is one physical attempt. Retrying is the
//! resilient transport's job (`crate::api::client`).

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, HttpResponse, TransportError};
