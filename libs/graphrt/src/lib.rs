//! Graph execution runtime for streaming frame-metadata pipelines.
//!
//! See [`core::graph`] for graph construction, [`core::runtime`] for the
//! process-wide [`core::runtime::Engine`], and [`core::elements`] for the
//! built-in [`core::elements::Distributer`] / [`core::elements::Converger`]
//! routing elements.

pub mod core;

pub use crate::core::error::{GraphError, GraphErrorKind, Result};
