mod metadata;

pub use metadata::{BoundingBox, DetectedObject, ObjectMetadata, Payload, TrackedObject};
