//! The two MCP wire transports the gateway exposes on one HTTP listener
//! (spec.md §4.1). Both route into the same [`crate::server::Dispatcher`].

pub mod sse;
pub mod streamable;
