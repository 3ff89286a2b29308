//! Self-healing reactions to third-party style mutations.
//!
//! Several floating-UI consumers lock scrolling or block pointer events for
//! their own lifetime. When their open/close sequences overlap the page can
//! be left non-interactive; these reactions revert such leaks.

use std::cell::RefCell;
use std::collections::VecDeque;

use serde::Serialize;

use crate::config::OverlayConfig;
use crate::host::{DomHost, Element, MutationRecord, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
    HeadOrder,
    Overflow,
    Pointer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardNote {
    pub seq: u64,
    pub guard: GuardKind,
    pub target: Element,
    pub detail: String,
}

/// Counters for debugging mutation storms.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GuardStats {
    pub head_reorders: u64,
    pub overflow_reverts: u64,
    pub pointer_reverts: u64,
    pub notes: VecDeque<GuardNote>,
    #[serde(skip)]
    max_notes: usize,
    #[serde(skip)]
    seq: u64,
}

impl GuardStats {
    pub fn new(max_notes: usize) -> Self {
        Self {
            max_notes,
            ..Self::default()
        }
    }

    pub fn record(&mut self, guard: GuardKind, target: Element, detail: impl Into<String>) {
        match guard {
            GuardKind::HeadOrder => self.head_reorders += 1,
            GuardKind::Overflow => self.overflow_reverts += 1,
            GuardKind::Pointer => self.pointer_reverts += 1,
        }
        self.seq += 1;
        if self.max_notes == 0 {
            return;
        }
        if self.notes.len() == self.max_notes {
            self.notes.pop_front();
        }
        self.notes.push_back(GuardNote {
            seq: self.seq,
            guard,
            target,
            detail: detail.into(),
        });
    }

    pub fn total(&self) -> u64 {
        self.head_reorders + self.overflow_reverts + self.pointer_reverts
    }
}

/// Re-append the force-scroll stylesheet when a head insertion pushed it
/// off the end. Skipped when it is still last, so our own re-append does
/// not feed back into the observer.
pub(crate) fn keep_stylesheet_last<H: DomHost>(
    host: &H,
    cfg: &OverlayConfig,
    records: &[MutationRecord],
    stats: &RefCell<GuardStats>,
) {
    if !records.iter().any(|r| r.added_nodes() > 0) {
        return;
    }
    if host.is_last_in_head(&cfg.stylesheet_id) {
        return;
    }
    match host.append_stylesheet(&cfg.stylesheet_id, cfg.stylesheet_css()) {
        Ok(()) => stats
            .borrow_mut()
            .record(GuardKind::HeadOrder, Element::Head, "stylesheet re-appended"),
        Err(err) => tracing::debug!(target: "overlay", %err, "stylesheet re-append failed"),
    }
}

/// Turn `overflow: hidden` on html/body back into `auto`. Elements in
/// `pinned` are held by the scroll lock and are left alone.
pub(crate) fn heal_overflow<H: DomHost>(
    host: &H,
    pinned: &[Element],
    stats: &RefCell<GuardStats>,
) {
    for el in Element::SCROLL_ROOTS {
        if pinned.contains(&el) || !host.has_element(el) {
            continue;
        }
        let current = match host.inline_style(el, "overflow") {
            Ok(v) if !v.is_empty() => v,
            Ok(_) => host.computed_style(el, "overflow").unwrap_or_default(),
            Err(_) => continue,
        };
        if current != "hidden" {
            continue;
        }
        match host.set_style(el, "overflow", "auto", Priority::Normal) {
            Ok(()) => {
                tracing::debug!(target: "overlay", el = el.tag(), "reverted overflow: hidden");
                stats
                    .borrow_mut()
                    .record(GuardKind::Overflow, el, "overflow hidden -> auto");
            }
            Err(err) => tracing::debug!(target: "overlay", %err, "overflow revert failed"),
        }
    }
}

/// Without a modal on screen nothing should hold the page's pointer events
/// or carry the scroll-locked marker.
pub(crate) fn heal_pointer<H: DomHost>(
    host: &H,
    cfg: &OverlayConfig,
    stats: &RefCell<GuardStats>,
) {
    if host.matches_any(&cfg.modal_selector) {
        return;
    }
    if host.has_attribute(Element::Body, &cfg.scroll_locked_attribute) {
        match host.remove_attribute(Element::Body, &cfg.scroll_locked_attribute) {
            Ok(()) => stats.borrow_mut().record(
                GuardKind::Pointer,
                Element::Body,
                format!("removed {}", cfg.scroll_locked_attribute),
            ),
            Err(err) => tracing::debug!(target: "overlay", %err, "marker removal failed"),
        }
    }
    for el in Element::SCROLL_ROOTS {
        let blocked = host
            .inline_style(el, "pointer-events")
            .map(|v| v == "none")
            .unwrap_or(false);
        if !blocked {
            continue;
        }
        match host.clear_style(el, "pointer-events") {
            Ok(()) => {
                tracing::debug!(target: "overlay", el = el.tag(), "restored pointer events");
                stats
                    .borrow_mut()
                    .record(GuardKind::Pointer, el, "pointer-events none cleared");
            }
            Err(err) => tracing::debug!(target: "overlay", %err, "pointer revert failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDocument;

    #[test]
    fn notes_are_bounded() {
        let mut stats = GuardStats::new(2);
        for _ in 0..5 {
            stats.record(GuardKind::Overflow, Element::Body, "x");
        }
        assert_eq!(stats.overflow_reverts, 5);
        assert_eq!(stats.notes.len(), 2);
        assert_eq!(stats.notes.front().map(|n| n.seq), Some(4));
    }

    #[test]
    fn overflow_heal_skips_locked_root() {
        let doc = FakeDocument::new();
        let stats = RefCell::new(GuardStats::new(8));
        doc.external_style(Element::Body, "overflow", "hidden");
        doc.external_style(Element::Html, "overflow", "hidden");
        heal_overflow(&doc, &[Element::Body], &stats);
        assert_eq!(doc.style(Element::Body, "overflow"), "hidden");
        assert_eq!(doc.style(Element::Html, "overflow"), "auto");
        assert_eq!(stats.borrow().overflow_reverts, 1);
    }

    #[test]
    fn pointer_heal_respects_modal() {
        let doc = FakeDocument::new();
        let cfg = OverlayConfig::default();
        let stats = RefCell::new(GuardStats::new(8));
        doc.external_style(Element::Body, "pointer-events", "none");
        doc.external_attribute(Element::Body, "data-scroll-locked");

        doc.set_modal_present(true);
        heal_pointer(&doc, &cfg, &stats);
        assert_eq!(doc.style(Element::Body, "pointer-events"), "none");

        doc.set_modal_present(false);
        heal_pointer(&doc, &cfg, &stats);
        assert_eq!(doc.style(Element::Body, "pointer-events"), "");
        assert!(!doc.attribute_present(Element::Body, "data-scroll-locked"));
        assert_eq!(stats.borrow().pointer_reverts, 2);
    }
}
