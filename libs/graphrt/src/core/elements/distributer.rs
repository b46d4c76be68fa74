//! [`Distributer`] — fans a frame out to per-class branch ports under a
//! per-route rate limit, propagating on `default_port` unconditionally.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::core::bus::POLL_INTERVAL;
use crate::core::element::{BaseElement, Element};
use crate::core::error::{GraphError, Result};

const INPUT_PORT: u32 = 0;

#[derive(Debug, Deserialize)]
struct RouteConfig {
    port: u32,
    classes: Vec<String>,
    #[serde(default)]
    interval: f64,
}

#[derive(Debug, Deserialize)]
struct DistributerConfig {
    default_port: u32,
    #[serde(default)]
    class_names_file: Option<String>,
    #[serde(default)]
    routes: Vec<RouteConfig>,
}

struct Route {
    port: u32,
    classes: HashSet<String>,
    interval: Duration,
    last_emission: Option<Instant>,
}

/// Routes detections to downstream sub-pipelines by class label, honoring a
/// per-route minimum re-emission interval. See spec §4.6.
#[derive(Default)]
pub struct Distributer {
    default_port: u32,
    routes: Vec<Route>,
}

impl Distributer {
    fn known_classes(path: &str) -> Result<HashSet<String>> {
        let contents = std::fs::read_to_string(path)?;
        let classes: Vec<String> = serde_yaml::from_str(&contents)?;
        Ok(classes.into_iter().collect())
    }
}

impl Element for Distributer {
    fn init_internal(&mut self, _ctx: &BaseElement, configure: &serde_json::Value) -> Result<()> {
        let config: DistributerConfig = serde_json::from_value(configure.clone())
            .map_err(|e| GraphError::ParseConfigureFail(e.to_string()))?;

        let known_classes = match &config.class_names_file {
            Some(path) => Some(Self::known_classes(path)?),
            None => None,
        };

        let mut routes = Vec::with_capacity(config.routes.len());
        for route in config.routes {
            if let Some(known) = &known_classes {
                for class in &route.classes {
                    if !known.contains(class) {
                        return Err(GraphError::InitFail(format!(
                            "distributer route on port {} references unknown class '{}'",
                            route.port, class
                        )));
                    }
                }
            }
            routes.push(Route {
                port: route.port,
                classes: route.classes.into_iter().collect(),
                interval: Duration::from_secs_f64(route.interval.max(0.0)),
                last_emission: None,
            });
        }

        self.default_port = config.default_port;
        self.routes = routes;
        Ok(())
    }

    fn do_work(&mut self, ctx: &BaseElement, worker_index: usize) -> Result<()> {
        let Some(mut frame) = ctx.pop_input_data(INPUT_PORT, worker_index) else {
            std::thread::sleep(POLL_INTERVAL);
            return Ok(());
        };

        if frame.is_eos {
            frame.num_branches = 1;
            return ctx.push_output_data(self.default_port, frame);
        }

        let now = Instant::now();
        let mut branch_frames = Vec::new();
        let mut branches_emitted = 0u32;

        for route in &mut self.routes {
            let matched: Vec<_> = frame
                .detections
                .iter()
                .filter(|d| route.classes.contains(&d.class_label))
                .cloned()
                .collect();
            if matched.is_empty() {
                continue;
            }
            let ready = route
                .last_emission
                .map_or(true, |last| now.duration_since(last) >= route.interval);
            if !ready {
                continue;
            }

            for detection in matched {
                branch_frames.push((route.port, frame.sub_for_detection(detection)));
            }
            route.last_emission = Some(now);
            branches_emitted += 1;
        }

        // num_branches must be final before the parent is pushed — the
        // converger reads it to decide when the join is complete.
        frame.num_branches = 1 + branches_emitted;
        ctx.push_output_data(self.default_port, frame)?;
        for (port, sub) in branch_frames {
            ctx.push_output_data(port, sub)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::Connector;
    use crate::core::frames::{BoundingBox, DetectedObject, ObjectMetadata, Payload};
    use std::sync::Arc;

    fn detection(label: &str) -> DetectedObject {
        DetectedObject {
            bbox: BoundingBox { x: 0.0, y: 0.0, width: 1.0, height: 1.0 },
            class_label: label.to_string(),
            confidence: 0.9,
        }
    }

    fn wire(el: &BaseElement, port: u32) -> Arc<Connector> {
        let connector = Arc::new(Connector::new(1, 8));
        el.bind_output(port, connector.clone());
        connector
    }

    #[test]
    fn eos_propagates_on_default_port_only() {
        let mut d = Distributer::default();
        let ctx = BaseElement::new(1, 1, false, false, -1);
        ctx.bind_input(INPUT_PORT, Arc::new(Connector::new(1, 4)));
        d.init_internal(&ctx, &serde_json::json!({ "default_port": 0 })).unwrap();
        let default_conn = wire(&ctx, 0);

        ctx.push_input_data(INPUT_PORT, 0, ObjectMetadata::end_of_stream(1, 1, 0)).unwrap();
        d.do_work(&ctx, 0).unwrap();

        let emitted = default_conn.pop(0).unwrap();
        assert!(emitted.is_eos);
        assert_eq!(emitted.num_branches, 1);
    }

    #[test]
    fn matched_detection_routes_to_branch_and_sets_num_branches() {
        let mut d = Distributer::default();
        let ctx = BaseElement::new(1, 1, false, false, -1);
        ctx.bind_input(INPUT_PORT, Arc::new(Connector::new(1, 4)));
        d.init_internal(
            &ctx,
            &serde_json::json!({
                "default_port": 0,
                "routes": [{ "port": 1, "classes": ["car"], "interval": 0.0 }]
            }),
        )
        .unwrap();
        let default_conn = wire(&ctx, 0);
        let branch_conn = wire(&ctx, 1);

        let mut frame = ObjectMetadata::new(1, 1, 0, Payload::empty());
        frame.detections.push(detection("car"));
        frame.detections.push(detection("pedestrian"));
        ctx.push_input_data(INPUT_PORT, 0, frame).unwrap();
        d.do_work(&ctx, 0).unwrap();

        let parent = default_conn.pop(0).unwrap();
        assert_eq!(parent.num_branches, 2);
        let branch = branch_conn.pop(0).unwrap();
        assert_eq!(branch.detections.len(), 1);
        assert_eq!(branch.detections[0].class_label, "car");
    }

    #[test]
    fn rate_limit_skips_emission_within_interval() {
        let mut d = Distributer::default();
        let ctx = BaseElement::new(1, 1, false, false, -1);
        ctx.bind_input(INPUT_PORT, Arc::new(Connector::new(1, 8)));
        d.init_internal(
            &ctx,
            &serde_json::json!({
                "default_port": 0,
                "routes": [{ "port": 1, "classes": ["car"], "interval": 100.0 }]
            }),
        )
        .unwrap();
        let default_conn = wire(&ctx, 0);
        let branch_conn = wire(&ctx, 1);

        for frame_id in 0..2u64 {
            let mut frame = ObjectMetadata::new(1, 1, frame_id, Payload::empty());
            frame.detections.push(detection("car"));
            ctx.push_input_data(INPUT_PORT, 0, frame).unwrap();
            d.do_work(&ctx, 0).unwrap();
        }

        assert_eq!(default_conn.pop(0).unwrap().num_branches, 2);
        assert_eq!(default_conn.pop(0).unwrap().num_branches, 1);
        assert!(branch_conn.pop(0).is_some());
        assert!(branch_conn.pop(0).is_none());
    }

    /// A route counts toward `num_branches` once per frame regardless of
    /// how many of its frame's detections it matches — Converger's join
    /// count tracks branch *arrivals* per port, not per-detection matches,
    /// so a route that fans out two sub-frames must still only increment
    /// `num_branches` by one.
    #[test]
    fn route_matching_multiple_detections_increments_num_branches_once() {
        let mut d = Distributer::default();
        let ctx = BaseElement::new(1, 1, false, false, -1);
        ctx.bind_input(INPUT_PORT, Arc::new(Connector::new(1, 4)));
        d.init_internal(
            &ctx,
            &serde_json::json!({
                "default_port": 0,
                "routes": [{ "port": 1, "classes": ["car"], "interval": 0.0 }]
            }),
        )
        .unwrap();
        let default_conn = wire(&ctx, 0);
        let branch_conn = wire(&ctx, 1);

        let mut frame = ObjectMetadata::new(1, 1, 0, Payload::empty());
        frame.detections.push(detection("car"));
        frame.detections.push(detection("car"));
        frame.detections.push(detection("pedestrian"));
        ctx.push_input_data(INPUT_PORT, 0, frame).unwrap();
        d.do_work(&ctx, 0).unwrap();

        let parent = default_conn.pop(0).unwrap();
        assert_eq!(parent.num_branches, 2, "one route fired, regardless of its two matched detections");

        assert!(branch_conn.pop(0).is_some());
        assert!(branch_conn.pop(0).is_some());
        assert!(branch_conn.pop(0).is_none(), "exactly two sub-frames, one per matched detection");
    }

    #[test]
    fn unknown_class_in_route_fails_init() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "- car\n- pedestrian\n").unwrap();
        let mut d = Distributer::default();
        let ctx = BaseElement::new(1, 1, false, false, -1);
        let err = d
            .init_internal(
                &ctx,
                &serde_json::json!({
                    "default_port": 0,
                    "class_names_file": tmp.path().to_str().unwrap(),
                    "routes": [{ "port": 1, "classes": ["bicycle"], "interval": 0.0 }]
                }),
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::InitFail(_)));
    }
}
