//! Request-scoped values flowing through one invocation.
//!
//! Nothing here outlives a single request; the only persisted form of these
//! types is the metadata object written next to the source image.

pub mod request;
pub mod shape;
