//! Client runtime for objectrest generated SDKs.
//!
//! This crate turns calls against generated service descriptors into exactly
//! one HTTP round trip each. It provides:
//!
//! - [`ApiClient`]: shared configuration (base URL, credentials, transport,
//!   type registry) plus the worker pool backing async dispatch
//! - [`ServiceHandle`]: a bound (service, optional instance id) dispatcher
//!   carrying mask, filter and pagination state
//! - [`AsyncServiceHandle`]: the same dispatch as futures or callbacks
//! - [`Transport`]: the minimal HTTP collaborator interface, with
//!   [`HyperTransport`] as the default implementation
//!
//! # Example
//!
//! ```ignore
//! use objectrest_client::{ApiClient, Credentials};
//! use objectrest_core::{MethodSpec, ServiceSpec};
//!
//! static ACCOUNT: ServiceSpec = ServiceSpec { name: "Acme_Account" };
//! static GET_OBJECT: MethodSpec = MethodSpec { name: "getObject", instance_required: false };
//!
//! let client = ApiClient::builder("https://api.example.com/rest/v3/")
//!     .credentials(Credentials::basic("user", "key"))
//!     .build()?;
//!
//! let mut account = client.service(&ACCOUNT, None);
//! account.with_mask().property("id").property("companyName");
//! let result: serde_json::Value = account.invoke(&GET_OBJECT, vec![])?;
//! ```
//!
//! Async shapes derive from a sync handle; the derived handle is a snapshot,
//! so later mutation of either side does not affect the other:
//!
//! ```ignore
//! let future = account.as_async().invoke::<MyEntity>(&GET_OBJECT, vec![])?;
//! let entity = future.into_result()?;
//! ```
//!
//! Concurrent paging needs one handle per page: the result limit and the
//! last-observed total are handle state, not call state.

mod auth;
mod builder;
mod client;
mod dispatch;
mod error;
mod pagination;
mod service;
mod url;

pub mod transport;

pub use auth::Credentials;
pub use builder::{BuildError, ClientBuilder};
pub use client::ApiClient;
pub use dispatch::{ApiFuture, AsyncServiceHandle, CallHandle, Callbacks, ResponseHandler};
pub use error::Error;
pub use pagination::ResultLimit;
pub use service::ServiceHandle;
pub use transport::{
    HyperTransport, HyperTransportBuilder, Transport, TransportRequest, TransportResponse,
};

// Re-export the core types generated code and applications touch directly.
pub use objectrest_core::{
    CodecError, Fault, FaultKind, Mask, MaskRef, MethodSpec, NullableOption, Poly, ServiceSpec,
    TypeRegistry, TypeSpec,
};

/// Protocol marker requesting type-qualified (tagged) polymorphic responses.
pub const INCLUDE_TYPES_HEADER: &str = "x-include-types";

/// Response header carrying the peer's non-paginated total item count.
pub const TOTAL_ITEMS_HEADER: &str = "x-total-items";
