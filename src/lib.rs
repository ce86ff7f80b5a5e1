//! # http-adapter
//!
//! Runs an engine-independent [`RequestDescriptor`] through a blocking HTTP
//! engine and hands back either a [`Response`] or one of three transport
//! errors: timeout, TLS or connection.
//!
//! ```no_run
//! use http_adapter::{Adapter, AdapterRegistry, RequestDescriptor};
//!
//! # fn main() -> http_adapter::Result<()> {
//! let registry = AdapterRegistry::with_defaults()?;
//! let mut request = RequestDescriptor::new("https://example.com/service");
//! request.auth.basic("user", "secret");
//! request.read_timeout = Some(5.0);
//!
//! let adapter = registry.build("reqwest", request)?;
//! let response = adapter.get()?;
//! println!("{} {}", response.code, response.text());
//! # Ok(())
//! # }
//! ```
//!
//! Status codes are never errors: a 404 or a 500 comes back as a `Response`
//! for the caller to inspect.

#[macro_use]
extern crate anyhow;

pub mod adapter;
pub mod engine;
pub mod error;
pub mod output;
pub mod registry;
pub mod request;
pub mod response;

pub use adapter::{Adapter, EngineAdapter};
pub use error::{Error, ErrorKind, Result, TransportError};
pub use registry::AdapterRegistry;
pub use request::{
    Auth, AuthKind, Credentials, Headers, Method, RequestDescriptor, SslVersion, TlsDescriptor,
    VerifyMode,
};
pub use response::Response;
