//! Error types for graphrt
//!
//! Defines the error taxonomy used throughout the graph runtime. Element
//! implementations may wrap their own errors in [`GraphError::ElementFailure`]
//! when surfacing a `do_work` failure through [`crate::core::observability`].

use thiserror::Error;

/// `Copy` discriminant mirroring spec §7's error taxonomy, carried on
/// [`crate::core::observability::StatusReport`] alongside the formatted
/// `message` so an embedding application can switch on the kind instead of
/// parsing prose — matching `engine.cc`'s `report_status(errorCode)`, which
/// passes the `common::ErrorCode` enum itself, never a rendered string.
/// `Success` has no variant here for the same reason `GraphError` has
/// none: it is represented structurally by the surrounding `Result`/
/// `Option<GraphErrorKind>`, never as a value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphErrorKind {
    ParseConfigureFail,
    NoSuchGraphId,
    NoSuchElementId,
    NoSuchWorker,
    QueueFull,
    Timeout,
    InitFail,
    Unknown,
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("failed to parse element/graph configuration: {0}")]
    ParseConfigureFail(String),

    #[error("no such graph id: {0}")]
    NoSuchGraphId(u64),

    #[error("no such element id: {0} in graph {1}")]
    NoSuchElementId(u64, u64),

    #[error("no such worker: element {0} worker {1}")]
    NoSuchWorker(u64, usize),

    #[error("queue full: port {0} lane {1}")]
    QueueFull(u32, usize),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("element init failed: {0}")]
    InitFail(String),

    #[error("unknown element type: {0}")]
    UnknownElement(String),

    #[error("element {0} failure: {1}")]
    ElementFailure(u64, String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GraphError {
    /// The taxonomy kind this error belongs to, for callers that need to
    /// branch on error identity rather than format a message.
    pub fn kind(&self) -> GraphErrorKind {
        match self {
            GraphError::ParseConfigureFail(_) => GraphErrorKind::ParseConfigureFail,
            GraphError::NoSuchGraphId(_) => GraphErrorKind::NoSuchGraphId,
            GraphError::NoSuchElementId(_, _) => GraphErrorKind::NoSuchElementId,
            GraphError::NoSuchWorker(_, _) => GraphErrorKind::NoSuchWorker,
            GraphError::QueueFull(_, _) => GraphErrorKind::QueueFull,
            GraphError::Timeout(_) => GraphErrorKind::Timeout,
            GraphError::InitFail(_) => GraphErrorKind::InitFail,
            GraphError::UnknownElement(_)
            | GraphError::ElementFailure(_, _)
            | GraphError::Json(_)
            | GraphError::Yaml(_)
            | GraphError::Io(_)
            | GraphError::Other(_) => GraphErrorKind::Unknown,
        }
    }
}

/// Result type that uses [`GraphError`].
pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mirrors_the_named_taxonomy_variants() {
        assert_eq!(GraphError::ParseConfigureFail("x".into()).kind(), GraphErrorKind::ParseConfigureFail);
        assert_eq!(GraphError::NoSuchGraphId(1).kind(), GraphErrorKind::NoSuchGraphId);
        assert_eq!(GraphError::NoSuchElementId(1, 2).kind(), GraphErrorKind::NoSuchElementId);
        assert_eq!(GraphError::NoSuchWorker(1, 0).kind(), GraphErrorKind::NoSuchWorker);
        assert_eq!(GraphError::QueueFull(0, 0).kind(), GraphErrorKind::QueueFull);
        assert_eq!(GraphError::Timeout("x".into()).kind(), GraphErrorKind::Timeout);
        assert_eq!(GraphError::InitFail("x".into()).kind(), GraphErrorKind::InitFail);
        assert_eq!(GraphError::UnknownElement("x".into()).kind(), GraphErrorKind::Unknown);
    }
}
