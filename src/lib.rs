pub mod config;
pub mod cookies;
pub mod descriptor;
pub mod dialect;
pub mod error;
pub mod http;
pub mod namespace;
pub mod nookies;
pub mod resolver;
pub mod session;

mod eval;
mod phase;

#[cfg(feature = "reqwest-client")]
pub mod reqwest_client;

pub use config::{ResolverConfig, ResolverConfigBuilder};
pub use descriptor::ResolvedDescriptor;
pub use error::{NetworkError, NiplError, NiplLoopError, ParseError, ResolveError};
pub use http::{Action, FetchRequest, FetchResponse, HttpClient, Method};
pub use nookies::{InMemoryNookieStore, NookieStore};
pub use resolver::resolve;
pub use session::ProcessorSession;
