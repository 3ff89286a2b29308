use serde::{Deserialize, Serialize};

use crate::error::OverlayError;
use crate::geometry::PlacementConfig;
use crate::host::Element;

pub const DEFAULT_ROOT_ID: &str = "__app_overlays";
pub const DEFAULT_STYLESHEET_ID: &str = "__force_allow_scroll";
pub const DEFAULT_MODAL_SELECTOR: &str = r#"[role="dialog"], [data-modal]"#;
pub const DEFAULT_SCROLL_LOCKED_ATTRIBUTE: &str = "data-scroll-locked";
/// One below the 32-bit max so a page-level toast can still sit on top.
pub const DEFAULT_Z_INDEX: i32 = 2_147_483_646;

/// Which self-healing guards get installed with the overlay root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardPolicy {
    pub stylesheet: bool,
    pub head_order: bool,
    pub overflow: bool,
    pub pointer: bool,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            stylesheet: true,
            head_order: true,
            overflow: true,
            pointer: true,
        }
    }
}

impl GuardPolicy {
    /// No reactive healing; every scroll and pointer mutation goes through
    /// the scroll lock only.
    pub fn none() -> Self {
        Self {
            stylesheet: false,
            head_order: false,
            overflow: false,
            pointer: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub root_id: String,
    pub stylesheet_id: String,
    pub z_index: i32,
    pub modal_selector: String,
    pub scroll_locked_attribute: String,
    /// Element whose `overflow` the scroll lock toggles.
    pub scroll_root: Element,
    pub placement: PlacementConfig,
    pub guards: GuardPolicy,
    pub max_guard_notes: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            root_id: DEFAULT_ROOT_ID.to_string(),
            stylesheet_id: DEFAULT_STYLESHEET_ID.to_string(),
            z_index: DEFAULT_Z_INDEX,
            modal_selector: DEFAULT_MODAL_SELECTOR.to_string(),
            scroll_locked_attribute: DEFAULT_SCROLL_LOCKED_ATTRIBUTE.to_string(),
            scroll_root: Element::Body,
            placement: PlacementConfig::default(),
            guards: GuardPolicy::default(),
            max_guard_notes: 64,
        }
    }
}

impl OverlayConfig {
    /// Parse a partial JSON config; missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, OverlayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn stylesheet_css(&self) -> &'static str {
        "\nhtml, body { overflow: auto !important; }\n"
    }

    /// Inline styles of the overlay root container.
    pub fn root_styles(&self) -> Vec<(&'static str, String)> {
        vec![
            ("position", "absolute".into()),
            ("top", "0".into()),
            ("left", "0".into()),
            ("width", "100%".into()),
            ("height", "0".into()),
            ("pointer-events", "none".into()),
            ("z-index", self.z_index.to_string()),
            ("transform", "none".into()),
            ("touch-action", "auto".into()),
            ("overflow", "visible".into()),
        ]
    }
}
