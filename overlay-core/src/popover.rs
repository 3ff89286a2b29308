use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geometry::{compute_position, ComputedPosition, PlacementConfig};
use crate::host::{DomHost, TriggerRef};
use crate::render::{ContentStyle, RenderPlan};
use crate::scroll_lock::{ScrollLockCounter, ScrollLockGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PopoverOptions {
    /// Render into the overlay root instead of inline.
    pub portal: bool,
    /// Hold the page scroll lock while open.
    pub lock_scroll: bool,
}

/// Events that can close an open popover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DismissEvent {
    /// A document-level click. Clicks on the trigger are left to
    /// [`PopoverController::activate`], which runs after document listeners.
    Click { inside_content: bool, on_trigger: bool },
    KeyDown(String),
    /// Browser back/forward.
    HistoryNavigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    Resize,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Trigger,
    OutsideClick,
    Escape,
    HistoryNavigation,
    Programmatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Opened,
    Closed(CloseReason),
    Unchanged,
}

/// Anything whose propagation a trigger activation must stop, so nested or
/// overlapping triggers do not both react to one click.
pub trait PropagationControl {
    fn stop_propagation(&self);
}

/// State of one mounted popover: open flag, last computed position and the
/// scroll lock it holds while open.
///
/// `open` only changes through [`toggle`](Self::toggle),
/// [`activate`](Self::activate), [`close`](Self::close) and
/// [`dismiss`](Self::dismiss); positioning never touches it.
pub struct PopoverController<H: DomHost> {
    host: Rc<H>,
    lock: Rc<ScrollLockCounter<H>>,
    placement: PlacementConfig,
    options: PopoverOptions,
    open: bool,
    position: Option<ComputedPosition>,
    lock_guard: Option<ScrollLockGuard<H>>,
}

impl<H: DomHost> PopoverController<H> {
    pub fn new(
        host: Rc<H>,
        lock: Rc<ScrollLockCounter<H>>,
        placement: PlacementConfig,
        options: PopoverOptions,
    ) -> Self {
        Self {
            host,
            lock,
            placement,
            options,
            open: false,
            position: None,
            lock_guard: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn position(&self) -> Option<ComputedPosition> {
        self.position
    }

    pub fn options(&self) -> PopoverOptions {
        self.options
    }

    /// Trigger activation: stops the event and flips the open state.
    pub fn activate(&mut self, event: &dyn PropagationControl, trigger: &dyn TriggerRef) -> Transition {
        event.stop_propagation();
        self.toggle(trigger)
    }

    pub fn toggle(&mut self, trigger: &dyn TriggerRef) -> Transition {
        if self.open {
            self.close(CloseReason::Trigger)
        } else {
            self.open(trigger)
        }
    }

    /// Opens and positions synchronously, before the caller renders.
    pub fn open(&mut self, trigger: &dyn TriggerRef) -> Transition {
        if self.open {
            return Transition::Unchanged;
        }
        self.open = true;
        if self.options.lock_scroll {
            self.lock_guard = Some(ScrollLockCounter::guard(&self.lock));
        }
        self.reposition(trigger);
        Transition::Opened
    }

    pub fn close(&mut self, reason: CloseReason) -> Transition {
        if !self.open {
            return Transition::Unchanged;
        }
        self.open = false;
        self.position = None;
        self.lock_guard = None;
        tracing::trace!(target: "overlay", ?reason, "popover closed");
        Transition::Closed(reason)
    }

    pub fn dismiss(&mut self, event: &DismissEvent) -> Transition {
        let reason = match event {
            DismissEvent::Click {
                inside_content: false,
                on_trigger: false,
            } => CloseReason::OutsideClick,
            DismissEvent::Click { .. } => return Transition::Unchanged,
            DismissEvent::KeyDown(key) if key == "Escape" => CloseReason::Escape,
            DismissEvent::KeyDown(_) => return Transition::Unchanged,
            DismissEvent::HistoryNavigation => CloseReason::HistoryNavigation,
        };
        self.close(reason)
    }

    /// Resize recomputes; scroll deliberately does not, so the content stays
    /// anchored where it opened and scrolls with the page.
    pub fn on_viewport_event(&mut self, event: ViewportEvent, trigger: &dyn TriggerRef) -> bool {
        match event {
            ViewportEvent::Resize => self.reposition(trigger),
            ViewportEvent::Scroll => false,
        }
    }

    /// Whether a resize listener should be attached right now.
    pub fn listens_for_resize(&self) -> bool {
        self.open
    }

    /// Recompute the position. Skipped while closed or when the trigger is
    /// gone; returns whether a new position was stored.
    pub fn reposition(&mut self, trigger: &dyn TriggerRef) -> bool {
        if !self.open {
            return false;
        }
        let Some(rect) = trigger.bounding_rect() else {
            tracing::trace!(target: "overlay", "trigger unavailable, position skipped");
            return false;
        };
        let viewport = self.host.viewport();
        self.position = Some(compute_position(&rect, &viewport, &self.placement));
        true
    }

    pub fn render_plan(&self) -> RenderPlan {
        match (self.open, self.position.as_ref()) {
            (true, Some(pos)) => {
                let style = ContentStyle::from_position(pos);
                if self.options.portal {
                    RenderPlan::Portal(style)
                } else {
                    RenderPlan::Inline(style)
                }
            }
            _ => RenderPlan::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDocument;
    use crate::geometry::{Placement, Rect, Viewport};
    use crate::host::Element;
    use std::cell::Cell;

    fn controller(options: PopoverOptions) -> (Rc<FakeDocument>, PopoverController<FakeDocument>) {
        let doc = Rc::new(FakeDocument::new());
        let lock = Rc::new(ScrollLockCounter::new(Rc::clone(&doc), Element::Body));
        let ctl = PopoverController::new(Rc::clone(&doc), lock, PlacementConfig::default(), options);
        (doc, ctl)
    }

    fn trigger() -> Rect {
        Rect::new(600.0, 100.0, 28.0, 28.0)
    }

    #[derive(Default)]
    struct Click {
        stopped: Cell<bool>,
    }

    impl PropagationControl for Click {
        fn stop_propagation(&self) {
            self.stopped.set(true);
        }
    }

    #[test]
    fn activation_toggles_and_stops_propagation() {
        let (_doc, mut ctl) = controller(PopoverOptions::default());
        let click = Click::default();
        assert_eq!(ctl.activate(&click, &trigger()), Transition::Opened);
        assert!(click.stopped.get());
        assert_eq!(
            ctl.activate(&Click::default(), &trigger()),
            Transition::Closed(CloseReason::Trigger)
        );
        assert!(!ctl.is_open());
    }

    #[test]
    fn renders_nothing_until_positioned() {
        let (_doc, mut ctl) = controller(PopoverOptions::default());
        assert_eq!(ctl.render_plan(), RenderPlan::Hidden);
        let detached: Option<Rect> = None;
        assert_eq!(ctl.toggle(&detached), Transition::Opened);
        assert!(ctl.is_open());
        assert_eq!(ctl.render_plan(), RenderPlan::Hidden);

        assert!(ctl.reposition(&trigger()));
        let plan = ctl.render_plan();
        let style = plan.style().unwrap();
        assert_eq!(style.opacity, 1.0);
        assert_eq!(style.top, 136.0);
        assert!(matches!(plan, RenderPlan::Inline(_)));
    }

    #[test]
    fn portal_flag_selects_target() {
        let (_doc, mut ctl) = controller(PopoverOptions {
            portal: true,
            lock_scroll: false,
        });
        ctl.toggle(&trigger());
        assert!(matches!(ctl.render_plan(), RenderPlan::Portal(_)));
    }

    #[test]
    fn opens_above_near_bottom_of_viewport() {
        let (_doc, mut ctl) = controller(PopoverOptions::default());
        let low = Rect::new(600.0, 760.0, 28.0, 20.0);
        ctl.toggle(&low);
        let pos = ctl.position().unwrap();
        assert_eq!(pos.placement, Placement::Above);
        assert!(pos.top < low.top());
    }

    #[test]
    fn dismissal_rules() {
        let (_doc, mut ctl) = controller(PopoverOptions::default());
        ctl.toggle(&trigger());
        assert_eq!(
            ctl.dismiss(&DismissEvent::Click {
                inside_content: true,
                on_trigger: false,
            }),
            Transition::Unchanged
        );
        assert_eq!(
            ctl.dismiss(&DismissEvent::KeyDown("Enter".into())),
            Transition::Unchanged
        );
        assert!(ctl.is_open());
        assert_eq!(
            ctl.dismiss(&DismissEvent::Click {
                inside_content: false,
                on_trigger: false,
            }),
            Transition::Closed(CloseReason::OutsideClick)
        );

        ctl.toggle(&trigger());
        assert_eq!(
            ctl.dismiss(&DismissEvent::KeyDown("Escape".into())),
            Transition::Closed(CloseReason::Escape)
        );

        ctl.toggle(&trigger());
        assert_eq!(
            ctl.dismiss(&DismissEvent::HistoryNavigation),
            Transition::Closed(CloseReason::HistoryNavigation)
        );
        assert_eq!(ctl.render_plan(), RenderPlan::Hidden);
        assert_eq!(
            ctl.dismiss(&DismissEvent::HistoryNavigation),
            Transition::Unchanged
        );
    }

    // Document listeners see a click before the delegated trigger handler.
    fn click_trigger(ctl: &mut PopoverController<FakeDocument>) -> (Transition, Transition) {
        let from_document = ctl.dismiss(&DismissEvent::Click {
            inside_content: false,
            on_trigger: true,
        });
        let from_trigger = ctl.activate(&Click::default(), &trigger());
        (from_document, from_trigger)
    }

    #[test]
    fn trigger_reclick_closes_in_dispatch_order() {
        let (_doc, mut ctl) = controller(PopoverOptions::default());
        assert_eq!(ctl.activate(&Click::default(), &trigger()), Transition::Opened);
        assert_eq!(
            click_trigger(&mut ctl),
            (Transition::Unchanged, Transition::Closed(CloseReason::Trigger))
        );
        assert!(!ctl.is_open());
        assert_eq!(click_trigger(&mut ctl), (Transition::Unchanged, Transition::Opened));
        assert!(ctl.is_open());
    }

    #[test]
    fn ignored_events_leave_the_plan_untouched() {
        let (_doc, mut ctl) = controller(PopoverOptions {
            portal: true,
            lock_scroll: false,
        });
        ctl.toggle(&trigger());
        let plan = ctl.render_plan();
        for event in [
            DismissEvent::Click {
                inside_content: true,
                on_trigger: false,
            },
            DismissEvent::KeyDown("a".into()),
            DismissEvent::KeyDown("Tab".into()),
        ] {
            assert_eq!(ctl.dismiss(&event), Transition::Unchanged);
            assert_eq!(ctl.render_plan(), plan);
        }
        assert!(!ctl.on_viewport_event(ViewportEvent::Scroll, &trigger()));
        assert_eq!(ctl.render_plan(), plan);
    }

    #[test]
    fn resize_recomputes_scroll_does_not() {
        let (doc, mut ctl) = controller(PopoverOptions::default());
        assert!(!ctl.listens_for_resize());
        ctl.toggle(&trigger());
        assert!(ctl.listens_for_resize());
        let opened_at = ctl.position().unwrap();

        doc.set_viewport(Viewport::new(1280.0, 800.0).scrolled(0.0, 400.0));
        assert!(!ctl.on_viewport_event(ViewportEvent::Scroll, &trigger()));
        assert_eq!(ctl.position(), Some(opened_at));

        doc.set_viewport(Viewport::new(500.0, 800.0));
        assert!(ctl.on_viewport_event(ViewportEvent::Resize, &trigger()));
        assert_ne!(ctl.position(), Some(opened_at));

        ctl.close(CloseReason::Programmatic);
        assert!(!ctl.listens_for_resize());
        assert!(!ctl.on_viewport_event(ViewportEvent::Resize, &trigger()));
    }

    #[test]
    fn scroll_lock_follows_open_state() {
        let (doc, mut ctl) = controller(PopoverOptions {
            portal: true,
            lock_scroll: true,
        });
        ctl.toggle(&trigger());
        assert_eq!(doc.style(Element::Body, "overflow"), "hidden");
        ctl.dismiss(&DismissEvent::KeyDown("Escape".into()));
        assert_eq!(doc.style(Element::Body, "overflow"), "");

        ctl.toggle(&trigger());
        drop(ctl);
        assert_eq!(doc.style(Element::Body, "overflow"), "");
    }

    #[test]
    fn overlapping_popovers_share_the_lock() {
        let doc = Rc::new(FakeDocument::new());
        let lock = Rc::new(ScrollLockCounter::new(Rc::clone(&doc), Element::Body));
        let opts = PopoverOptions {
            portal: true,
            lock_scroll: true,
        };
        let mut a = PopoverController::new(Rc::clone(&doc), Rc::clone(&lock), PlacementConfig::default(), opts);
        let mut b = PopoverController::new(Rc::clone(&doc), Rc::clone(&lock), PlacementConfig::default(), opts);
        a.toggle(&trigger());
        b.toggle(&trigger());
        a.close(CloseReason::Programmatic);
        assert_eq!(doc.style(Element::Body, "overflow"), "hidden");
        b.close(CloseReason::Programmatic);
        assert_eq!(doc.style(Element::Body, "overflow"), "");
        assert_eq!(lock.count(), 0);
    }
}
