//! Proxy module
//!
//! Everything between a canonical request and the upstream socket: header
//! synthesis, provider profiles, credentials and the HTTP client.

pub mod credentials;
pub mod headers;
pub mod overrides;
pub mod profile;
pub mod upstream;

pub use credentials::{Credential, CredentialError, CredentialSource, StaticCredential, TokenStore};
pub use overrides::HeaderOverrides;
pub use profile::{prepare, UpstreamTarget};
pub use upstream::{ByteStream, UpstreamClient};
