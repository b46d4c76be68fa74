//! [`ObjectMetadata`] — the frame-level payload carried through a graph.
//!
//! A graph never interprets the pixels inside a frame; it only ever reads
//! the channel/frame identifiers, the detection list, and `num_branches`.
//! The actual image buffer (and whatever device handle it lives on) is
//! opaque to the runtime and carried in [`Payload`].

use std::any::Any;
use std::sync::Arc;

/// Opaque, type-erased frame payload (e.g. an image buffer plus a device
/// handle). The runtime never inspects its contents; it only clones the
/// `Arc` as the frame traverses the graph.
#[derive(Clone)]
pub struct Payload {
    inner: Arc<dyn Any + Send + Sync>,
    /// Device the buffer lives on, for element-internal routing. `-1` means
    /// host memory / unspecified.
    pub device_id: i32,
}

impl Payload {
    pub fn new<T: Any + Send + Sync>(value: T, device_id: i32) -> Self {
        Self {
            inner: Arc::new(value),
            device_id,
        }
    }

    pub fn empty() -> Self {
        Self::new((), -1)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload")
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

/// Axis-aligned detection box in the coordinate space of the frame it
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One detection produced by an upstream inference element.
#[derive(Debug, Clone)]
pub struct DetectedObject {
    pub bbox: BoundingBox,
    pub class_label: String,
    pub confidence: f32,
}

/// A tracker's verdict for one sub-object: a persistent identity across
/// frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedObject {
    pub track_id: u64,
}

/// The unit of work carried through the graph.
///
/// Per-detection sub-pipelines (spec §3's "nested ObjectMetadata") are
/// realized by [`ObjectMetadata::sub_for_detection`]: a
/// [`crate::core::elements::Distributer`] emits one independent
/// `ObjectMetadata` per matched detection onto its own branch port rather
/// than nesting it inside the parent, and a
/// [`crate::core::elements::Converger`] joins those branch frames back to
/// the parent by `(channel_id_internal, frame_id)`. A sub-frame never holds
/// a reference back to its parent, so construction is always acyclic.
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    /// Logical stream identifier as supplied by the caller (e.g. a camera id).
    pub channel_id: u64,
    /// Graph-assigned identifier used for every ordering/join decision.
    /// Distributer and Converger key exclusively on this field, never on
    /// `channel_id` — see DESIGN.md for why.
    pub channel_id_internal: u64,
    /// Monotonically increasing per-channel frame sequence number.
    pub frame_id: u64,
    pub is_eos: bool,
    pub payload: Payload,
    pub detections: Vec<DetectedObject>,
    pub tracked: Option<TrackedObject>,
    /// Number of downstream branches that must report before a Converger
    /// may release this frame. Defaults to 1 (no fan-out).
    pub num_branches: u32,
}

impl ObjectMetadata {
    pub fn new(channel_id: u64, channel_id_internal: u64, frame_id: u64, payload: Payload) -> Self {
        Self {
            channel_id,
            channel_id_internal,
            frame_id,
            is_eos: false,
            payload,
            detections: Vec::new(),
            tracked: None,
            num_branches: 1,
        }
    }

    pub fn end_of_stream(channel_id: u64, channel_id_internal: u64, frame_id: u64) -> Self {
        Self {
            is_eos: true,
            num_branches: 1,
            ..Self::new(channel_id, channel_id_internal, frame_id, Payload::empty())
        }
    }

    /// Join key used by Distributer/Converger: canonicalized on the internal
    /// channel id, never the external one.
    pub fn join_key(&self) -> (u64, u64) {
        (self.channel_id_internal, self.frame_id)
    }

    /// Build a sub-ObjectMetadata referencing the same frame as `self` but
    /// carrying exactly one matched detection, for routing to a branch port.
    pub fn sub_for_detection(&self, detection: DetectedObject) -> ObjectMetadata {
        let mut sub = ObjectMetadata::new(
            self.channel_id,
            self.channel_id_internal,
            self.frame_id,
            self.payload.clone(),
        );
        sub.detections.push(detection);
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_key_uses_internal_channel_id() {
        let meta = ObjectMetadata::new(999, 3, 7, Payload::empty());
        assert_eq!(meta.join_key(), (3, 7));
    }

    #[test]
    fn sub_for_detection_preserves_frame_identity() {
        let parent = ObjectMetadata::new(1, 1, 5, Payload::empty());
        let det = DetectedObject {
            bbox: BoundingBox { x: 0.0, y: 0.0, width: 1.0, height: 1.0 },
            class_label: "car".into(),
            confidence: 0.9,
        };
        let sub = parent.sub_for_detection(det);
        assert_eq!(sub.join_key(), parent.join_key());
        assert_eq!(sub.detections.len(), 1);
        assert_eq!(sub.detections[0].class_label, "car");
    }

    #[test]
    fn end_of_stream_has_single_branch() {
        let eos = ObjectMetadata::end_of_stream(1, 1, 10);
        assert!(eos.is_eos);
        assert_eq!(eos.num_branches, 1);
    }

    #[test]
    fn payload_round_trips_through_downcast() {
        let payload = Payload::new(42u32, 0);
        assert_eq!(payload.downcast_ref::<u32>(), Some(&42));
        assert_eq!(payload.downcast_ref::<u64>(), None);
    }
}
