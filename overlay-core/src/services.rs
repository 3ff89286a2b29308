use std::rc::Rc;

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::guards::GuardStats;
use crate::host::DomHost;
use crate::popover::{PopoverController, PopoverOptions};
use crate::registry::OverlayRootRegistry;
use crate::scroll_lock::ScrollLockCounter;

/// Everything one page shares between its overlays: the host, the scroll
/// lock and the overlay root registry. Browsers keep one per thread; tests
/// build a fresh one per case.
pub struct OverlayServices<H: DomHost + 'static> {
    host: Rc<H>,
    config: Rc<OverlayConfig>,
    scroll_lock: Rc<ScrollLockCounter<H>>,
    registry: OverlayRootRegistry<H>,
}

impl<H: DomHost + 'static> OverlayServices<H> {
    pub fn new(host: H, config: OverlayConfig) -> Self {
        Self::with_host(Rc::new(host), config)
    }

    pub fn with_host(host: Rc<H>, config: OverlayConfig) -> Self {
        let config = Rc::new(config);
        let scroll_lock = Rc::new(ScrollLockCounter::new(Rc::clone(&host), config.scroll_root));
        let registry =
            OverlayRootRegistry::new(Rc::clone(&host), Rc::clone(&config), Rc::clone(&scroll_lock));
        Self {
            host,
            config,
            scroll_lock,
            registry,
        }
    }

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn scroll_lock(&self) -> &Rc<ScrollLockCounter<H>> {
        &self.scroll_lock
    }

    pub fn overlay_root(&self) -> Result<H::Node, OverlayError> {
        self.registry.overlay_root()
    }

    pub fn guard_stats(&self) -> GuardStats {
        self.registry.stats()
    }

    pub fn guard_stats_json(&self) -> Result<String, OverlayError> {
        self.registry.stats_json()
    }

    /// New popover state bound to this page's host and scroll lock.
    pub fn popover(&self, options: PopoverOptions) -> PopoverController<H> {
        PopoverController::new(
            Rc::clone(&self.host),
            Rc::clone(&self.scroll_lock),
            self.config.placement,
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDocument;
    use crate::geometry::Rect;
    use crate::host::Element;

    #[test]
    fn portal_popover_with_lock_and_guards() {
        let services = OverlayServices::new(FakeDocument::new(), OverlayConfig::default());
        let doc = Rc::clone(services.host());
        services.overlay_root().unwrap();

        let mut pop = services.popover(PopoverOptions {
            portal: true,
            lock_scroll: true,
        });
        pop.toggle(&Rect::new(10.0, 10.0, 20.0, 20.0));
        doc.settle(4);
        assert_eq!(doc.style(Element::Body, "overflow"), "hidden");
        assert_eq!(doc.style(Element::Html, "overflow"), "hidden");
        assert_eq!(services.scroll_lock().count(), 1);

        drop(pop);
        assert_eq!(services.scroll_lock().count(), 0);
        assert_eq!(doc.style(Element::Html, "overflow"), "");

        // A leaked lock from some other widget on <html> is healed.
        doc.external_style(Element::Html, "overflow", "hidden");
        doc.flush();
        assert_eq!(doc.style(Element::Html, "overflow"), "auto");
        assert_eq!(services.guard_stats().overflow_reverts, 1);
    }

    #[test]
    fn fresh_services_start_unlocked() {
        let first = OverlayServices::new(FakeDocument::new(), OverlayConfig::default());
        first.scroll_lock().acquire();
        let second = OverlayServices::new(FakeDocument::new(), OverlayConfig::default());
        assert!(!second.scroll_lock().is_locked());
        assert!(first.scroll_lock().is_locked());
    }
}
