//! Persistent graph containers.
//!
//! A graph maps points to vertex payloads and ordered pairs of points to edge
//! payloads. Graphs are immutable values: every operation of the
//! [`GraphTemplate`](graph::GraphTemplate) trait returns a new graph that
//! shares unchanged structure with its input. See the [`graph`] module for
//! the available representations.

#![warn(clippy::panic)]
#![warn(clippy::expect_used)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod errors;
pub mod graph;
pub mod stream;
pub mod types;
pub mod util;

pub use graph::{
    DeferredGraph, Graph, GraphTemplate, MultiEdgeGraph, Representation, SingleEdgeGraph,
};
pub use types::PointPair;
