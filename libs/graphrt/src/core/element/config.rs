use serde::{Deserialize, Serialize};

/// Configuration shared by every element, regardless of type.
///
/// `name` doubles as the [`crate::core::registry::ElementFactory`] lookup
/// key: the external JSON schema (spec §6) has no separate `type` field, so
/// the element's registered type name and its declared `name` are the same
/// string — see DESIGN.md for this Open Question resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementConfig {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub side: String,
    #[serde(default = "default_device_id")]
    pub device_id: i32,
    #[serde(default = "default_thread_number")]
    pub thread_number: usize,
    #[serde(default)]
    pub is_source: bool,
    #[serde(default)]
    pub is_sink: bool,
    #[serde(default)]
    pub inner_elements: Option<Vec<ElementConfig>>,
    /// Element-type-specific subtree, handed verbatim to `init_internal`.
    #[serde(default)]
    pub configure: serde_json::Value,
}

fn default_device_id() -> i32 {
    -1
}

fn default_thread_number() -> usize {
    1
}
