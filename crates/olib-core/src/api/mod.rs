//! API implementation submodules.
//!
//! Each submodule contains `impl LibraryProxy` blocks. The struct definition
//! remains in `lib.rs`.

mod builder;
mod proxy;

pub use builder::LibraryProxyBuilder;
pub use proxy::ProxyResponse;
