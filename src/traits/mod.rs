//! Trait definitions for FOSSology operations.
//!
//! Entity types implement the traits they support; endpoint quirks such as
//! header-based filters stay inside the implementations.

mod get;
mod list;

pub use get::Get;
pub use list::List;
