//! Common imports for implementing a custom element.

pub use crate::core::bus::Connector;
pub use crate::core::element::{BaseElement, Element, ElementConfig, ThreadStatus};
pub use crate::core::error::{GraphError, GraphErrorKind, Result};
pub use crate::core::frames::{BoundingBox, DetectedObject, ObjectMetadata, Payload, TrackedObject};
pub use crate::core::observability::{ListenThread, ReportPhase, StatusReport};
pub use crate::register_element;
