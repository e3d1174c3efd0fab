//! Data models for parsed upstream pages.
//!
//! These are the JSON shapes served to clients; the response assembler adds
//! cache metadata on top of them.

mod listing;
mod model_page;
mod tags;

pub use listing::*;
pub use model_page::*;
pub use tags::*;
