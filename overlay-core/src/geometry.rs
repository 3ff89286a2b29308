use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in CSS pixels, viewport-relative unless stated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Visible window size plus the document scroll offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn scrolled(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Below,
    Above,
}

/// Sizing rules for floating content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Minimum margin kept between the content and the viewport edges.
    pub viewport_padding: f64,
    pub default_width: f64,
    pub desired_height: f64,
    pub min_height: f64,
    /// Distance between trigger and content.
    pub gap: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            viewport_padding: 16.0,
            default_width: 320.0,
            desired_height: 360.0,
            min_height: 120.0,
            gap: 8.0,
        }
    }
}

/// Where floating content goes, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputedPosition {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub max_height: f64,
    pub placement: Placement,
}

fn clamp_band(value: f64, lo: f64, hi: f64) -> f64 {
    // Narrow viewports can invert the band; the leading edge wins.
    if hi < lo {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Place content relative to `trigger` (viewport coordinates).
///
/// Opens below when the desired height fits below the trigger or when there
/// is at least as much room below as above; otherwise opens above. The
/// horizontal position is centered on the trigger and clamped to the
/// viewport padding. The result is shifted by the scroll offsets so the
/// content scrolls with the page instead of chasing the trigger.
pub fn compute_position(
    trigger: &Rect,
    viewport: &Viewport,
    cfg: &PlacementConfig,
) -> ComputedPosition {
    let pad = cfg.viewport_padding;
    let width = cfg
        .default_width
        .min(viewport.width - 2.0 * pad)
        .max(0.0);

    let space_below = viewport.height - trigger.bottom() - cfg.gap - pad;
    let space_above = trigger.top() - cfg.gap - pad;
    let placement = if space_below >= cfg.desired_height || space_below >= space_above {
        Placement::Below
    } else {
        Placement::Above
    };

    let available = match placement {
        Placement::Below => space_below,
        Placement::Above => space_above,
    };
    let max_height = cfg
        .desired_height
        .min(available)
        .max(cfg.min_height.min(cfg.desired_height));

    let raw_top = match placement {
        Placement::Below => trigger.bottom() + cfg.gap,
        Placement::Above => trigger.top() - cfg.gap - max_height,
    };
    let top = clamp_band(raw_top, pad, viewport.height - pad - max_height);

    let raw_left = trigger.center_x() - width / 2.0;
    let left = clamp_band(raw_left, pad, viewport.width - width - pad);

    ComputedPosition {
        top: top + viewport.scroll_y,
        left: left + viewport.scroll_x,
        width,
        max_height,
        placement,
    }
}
