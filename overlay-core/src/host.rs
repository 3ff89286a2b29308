//! Seam between the overlay engine and the document it manipulates.
//!
//! The browser backend implements [`DomHost`] on top of `web_sys`; tests use
//! `fake::FakeDocument`. All methods take `&self`: DOM handles are
//! shared and interior-mutable, and mutation callbacks re-enter the host.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::geometry::{Rect, Viewport};

/// Document-level elements the subsystem touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Html,
    Head,
    Body,
}

impl Element {
    /// The elements whose scroll and pointer state the guards protect.
    pub const SCROLL_ROOTS: [Element; 2] = [Element::Html, Element::Body];

    pub fn tag(&self) -> &'static str {
        match self {
            Element::Html => "html",
            Element::Head => "head",
            Element::Body => "body",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Normal,
    Important,
}

impl Priority {
    pub fn as_css(&self) -> &'static str {
        match self {
            Priority::Normal => "",
            Priority::Important => "important",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList { target: Element, added: usize },
    Attribute { target: Element, name: String },
}

impl MutationRecord {
    pub fn target(&self) -> Element {
        match self {
            MutationRecord::ChildList { target, .. } | MutationRecord::Attribute { target, .. } => {
                *target
            }
        }
    }

    pub fn added_nodes(&self) -> usize {
        match self {
            MutationRecord::ChildList { added, .. } => *added,
            MutationRecord::Attribute { .. } => 0,
        }
    }

    pub fn is_attribute(&self, attr: &str) -> bool {
        matches!(self, MutationRecord::Attribute { name, .. } if name == attr)
    }
}

/// Subset of `MutationObserverInit` the guards need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub attributes: bool,
    /// Empty means every attribute.
    pub attribute_filter: Vec<String>,
}

impl ObserveOptions {
    pub fn child_list() -> Self {
        Self {
            child_list: true,
            ..Self::default()
        }
    }

    pub fn attributes(filter: &[&str]) -> Self {
        Self {
            attributes: true,
            attribute_filter: filter.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &MutationRecord) -> bool {
        match record {
            MutationRecord::ChildList { .. } => self.child_list,
            MutationRecord::Attribute { name, .. } => {
                self.attributes
                    && (self.attribute_filter.is_empty()
                        || self.attribute_filter.iter().any(|f| f == name))
            }
        }
    }
}

pub type MutationCallback = Rc<dyn Fn(&[MutationRecord])>;

pub trait DomHost {
    /// Handle to a mounted node (the overlay root).
    type Node: Clone + PartialEq + fmt::Debug;

    fn has_element(&self, el: Element) -> bool;

    /// Inline style value; empty string when unset.
    fn inline_style(&self, el: Element, prop: &str) -> Result<String, HostError>;

    fn computed_style(&self, el: Element, prop: &str) -> Result<String, HostError>;

    fn set_style(
        &self,
        el: Element,
        prop: &str,
        value: &str,
        priority: Priority,
    ) -> Result<(), HostError>;

    fn clear_style(&self, el: Element, prop: &str) -> Result<(), HostError>;

    fn has_attribute(&self, el: Element, name: &str) -> bool;

    fn remove_attribute(&self, el: Element, name: &str) -> Result<(), HostError>;

    /// Whether any element in the document matches `selector`.
    fn matches_any(&self, selector: &str) -> bool;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Append a `<div id=..>` with the given inline styles to the body.
    fn append_container(
        &self,
        id: &str,
        styles: &[(&'static str, String)],
    ) -> Result<Self::Node, HostError>;

    /// Append `<style id=..>` to the head, or move an existing one to the end.
    fn append_stylesheet(&self, id: &str, css: &str) -> Result<(), HostError>;

    fn is_last_in_head(&self, id: &str) -> bool;

    fn observe(
        &self,
        target: Element,
        options: ObserveOptions,
        callback: MutationCallback,
    ) -> Result<(), HostError>;

    fn viewport(&self) -> Viewport;
}

/// Weak handle to the element that anchors a popover.
pub trait TriggerRef {
    /// Viewport-relative bounds, or `None` once the element is gone.
    fn bounding_rect(&self) -> Option<Rect>;
}

impl TriggerRef for Rect {
    fn bounding_rect(&self) -> Option<Rect> {
        Some(*self)
    }
}

impl<T: TriggerRef> TriggerRef for Option<T> {
    fn bounding_rect(&self) -> Option<Rect> {
        self.as_ref().and_then(TriggerRef::bounding_rect)
    }
}
