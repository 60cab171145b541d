//! Client core for the Outline VPN server management API.
//!
//! # Overview
//! Manages access keys, data limits, metrics and server settings through the
//! server's REST management API. Every call is one independent HTTPS
//! request/response exchange; nothing is cached or retried.
//!
//! # Design
//! - `OutlineApi` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network, so the operation layer is fully
//!   deterministic and testable.
//! - `endpoint` composes URLs as pure functions of the base URL and a route
//!   template; the base URL is never extended in place.
//! - `Transport` performs the exchange over TLS; `Executor` owns the single
//!   worker thread that drives every call.
//! - `OutlineClient` ties the three together and offers each operation as
//!   `*_async` (a `Deferred`) and as a blocking wrapper over the same path.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod http;
pub mod outline;
pub mod transport;
pub mod types;

pub use client::OutlineApi;
pub use config::{ClientConfig, TlsVerification};
pub use endpoint::Endpoint;
pub use error::ApiError;
pub use executor::Deferred;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use outline::OutlineClient;
pub use types::{AccessKey, CreateAccessKey, DataLimit, ServerInfo, TransferMetrics, UpdateAccessKey};
