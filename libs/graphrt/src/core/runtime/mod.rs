//! [`Engine`] — the process-wide registry of live graphs.

mod engine;

pub use engine::{global, Engine};
