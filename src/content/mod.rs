//! Request-side content handling: blacklist, request paths, resolution.
//!
//! Every request passes through these steps before any file is read:
//!
//! 1. [`RequestPath::from_url`] normalizes the raw URL
//! 2. [`AccessGuard::is_forbidden`] rejects blacklisted paths
//! 3. [`PathResolver::resolve`] maps the path into the content root

pub mod access;
mod request;
pub mod resolve;
pub mod sandbox;

pub use access::AccessGuard;
pub use request::RequestPath;
pub use resolve::{PathResolver, ResolvedTarget};
