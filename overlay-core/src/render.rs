use crate::geometry::ComputedPosition;

/// Inline style of positioned floating content.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentStyle {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub max_height: f64,
    pub opacity: f64,
}

impl ContentStyle {
    pub fn from_position(pos: &ComputedPosition) -> Self {
        Self {
            top: pos.top,
            left: pos.left,
            width: pos.width,
            max_height: pos.max_height,
            opacity: 1.0,
        }
    }

    /// The same placement against an absolutely-positioned containing block
    /// whose origin sits at `(origin_left, origin_top)` in document
    /// coordinates.
    pub fn relative_to(&self, origin_left: f64, origin_top: f64) -> Self {
        Self {
            top: self.top - origin_top,
            left: self.left - origin_left,
            ..self.clone()
        }
    }

    pub fn declarations(&self) -> Vec<(&'static str, String)> {
        vec![
            ("position", "absolute".into()),
            ("top", format!("{}px", self.top)),
            ("left", format!("{}px", self.left)),
            ("width", format!("{}px", self.width)),
            ("max-height", format!("{}px", self.max_height)),
            ("overflow-y", "auto".into()),
            ("opacity", self.opacity.to_string()),
            // The overlay root disables pointer events for itself only.
            ("pointer-events", "auto".into()),
        ]
    }

    pub fn to_css(&self) -> String {
        self.declarations()
            .into_iter()
            .map(|(k, v)| format!("{k}: {v};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a mounting strategy should do with a popover's content.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPlan {
    /// Closed, or open without a known position yet.
    Hidden,
    /// In normal flow next to the trigger. Coordinates are document-absolute;
    /// a renderer under a positioned ancestor shifts them with
    /// [`ContentStyle::relative_to`].
    Inline(ContentStyle),
    /// Into the shared overlay root.
    Portal(ContentStyle),
}

impl RenderPlan {
    pub fn is_visible(&self) -> bool {
        !matches!(self, RenderPlan::Hidden)
    }

    pub fn style(&self) -> Option<&ContentStyle> {
        match self {
            RenderPlan::Hidden => None,
            RenderPlan::Inline(style) | RenderPlan::Portal(style) => Some(style),
        }
    }
}
