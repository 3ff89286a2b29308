use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::OverlayConfig;
use crate::error::{HostError, OverlayError};
use crate::guards::{self, GuardStats};
use crate::host::{DomHost, Element, MutationCallback, MutationRecord, ObserveOptions};
use crate::scroll_lock::ScrollLockCounter;

/// Owner of the page's single overlay mount point.
///
/// The container is created (or adopted) on the first [`overlay_root`] call
/// and never removed. Guards are installed alongside it exactly once; each
/// installation step fails on its own without affecting the mount point.
///
/// [`overlay_root`]: OverlayRootRegistry::overlay_root
pub struct OverlayRootRegistry<H: DomHost + 'static> {
    host: Rc<H>,
    config: Rc<OverlayConfig>,
    lock: Rc<ScrollLockCounter<H>>,
    root: RefCell<Option<H::Node>>,
    guards_installed: Cell<bool>,
    stats: Rc<RefCell<GuardStats>>,
}

impl<H: DomHost + 'static> OverlayRootRegistry<H> {
    pub fn new(host: Rc<H>, config: Rc<OverlayConfig>, lock: Rc<ScrollLockCounter<H>>) -> Self {
        let stats = Rc::new(RefCell::new(GuardStats::new(config.max_guard_notes)));
        Self {
            host,
            config,
            lock,
            root: RefCell::new(None),
            guards_installed: Cell::new(false),
            stats,
        }
    }

    pub fn overlay_root(&self) -> Result<H::Node, OverlayError> {
        if let Some(node) = self.root.borrow().as_ref() {
            return Ok(node.clone());
        }
        if !self.host.has_element(Element::Body) {
            return Err(OverlayError::NoDocument);
        }
        let node = match self.host.element_by_id(&self.config.root_id) {
            Some(existing) => existing,
            None => self
                .host
                .append_container(&self.config.root_id, &self.config.root_styles())?,
        };
        *self.root.borrow_mut() = Some(node.clone());
        tracing::debug!(target: "overlay", id = %self.config.root_id, "overlay root mounted");
        self.install_guards();
        Ok(node)
    }

    pub fn is_mounted(&self) -> bool {
        self.root.borrow().is_some()
    }

    pub fn stats(&self) -> GuardStats {
        self.stats.borrow().clone()
    }

    pub fn stats_json(&self) -> Result<String, OverlayError> {
        Ok(serde_json::to_string(&*self.stats.borrow())?)
    }

    fn install_guards(&self) {
        if self.guards_installed.replace(true) {
            return;
        }
        let policy = self.config.guards;
        if policy.stylesheet {
            match self.install_stylesheet() {
                Ok(()) if policy.head_order => self.log_failure("head watcher", self.install_head_watcher()),
                Ok(()) => {}
                Err(err) => self.log_failure("stylesheet", Err(err)),
            }
        }
        if policy.overflow {
            self.install_overflow_watcher();
        }
        if policy.pointer {
            self.install_pointer_guard();
        }
    }

    fn log_failure(&self, what: &str, res: Result<(), HostError>) {
        if let Err(err) = res {
            tracing::debug!(target: "overlay", %err, guard = what, "guard not installed");
        }
    }

    fn install_stylesheet(&self) -> Result<(), HostError> {
        self.host
            .append_stylesheet(&self.config.stylesheet_id, self.config.stylesheet_css())
    }

    fn install_head_watcher(&self) -> Result<(), HostError> {
        let host = Rc::clone(&self.host);
        let config = Rc::clone(&self.config);
        let stats = Rc::clone(&self.stats);
        let callback: MutationCallback = Rc::new(move |records: &[MutationRecord]| {
            guards::keep_stylesheet_last(&*host, &config, records, &stats);
        });
        self.host
            .observe(Element::Head, ObserveOptions::child_list(), callback)
    }

    fn install_overflow_watcher(&self) {
        let host = Rc::clone(&self.host);
        let lock = Rc::clone(&self.lock);
        let stats = Rc::clone(&self.stats);
        let heal = move || {
            guards::heal_overflow(&*host, &lock.pinned(), &stats);
        };
        // Normalize whatever state the page is already in.
        heal();
        let heal = Rc::new(heal);
        for el in Element::SCROLL_ROOTS {
            let heal = Rc::clone(&heal);
            let callback: MutationCallback = Rc::new(move |records: &[MutationRecord]| {
                if records.iter().any(|r| r.is_attribute("style")) {
                    heal();
                }
            });
            let res = self
                .host
                .observe(el, ObserveOptions::attributes(&["style"]), callback);
            self.log_failure("overflow watcher", res);
        }
    }

    fn install_pointer_guard(&self) {
        let targets = [
            (Element::Body, ObserveOptions::attributes(&[])),
            (Element::Html, ObserveOptions::attributes(&["style"])),
        ];
        for (el, options) in targets {
            let host = Rc::clone(&self.host);
            let config = Rc::clone(&self.config);
            let stats = Rc::clone(&self.stats);
            let callback: MutationCallback = Rc::new(move |_records: &[MutationRecord]| {
                guards::heal_pointer(&*host, &config, &stats);
            });
            let res = self.host.observe(el, options, callback);
            self.log_failure("pointer guard", res);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardPolicy;
    use crate::fake::{FakeDocument, FakeFailure};
    use crate::host::Priority;

    fn registry_with(
        doc: FakeDocument,
        config: OverlayConfig,
    ) -> (
        Rc<FakeDocument>,
        Rc<ScrollLockCounter<FakeDocument>>,
        OverlayRootRegistry<FakeDocument>,
    ) {
        let doc = Rc::new(doc);
        let config = Rc::new(config);
        let lock = Rc::new(ScrollLockCounter::new(Rc::clone(&doc), config.scroll_root));
        let registry = OverlayRootRegistry::new(Rc::clone(&doc), config, Rc::clone(&lock));
        (doc, lock, registry)
    }

    fn registry(
        doc: FakeDocument,
    ) -> (
        Rc<FakeDocument>,
        Rc<ScrollLockCounter<FakeDocument>>,
        OverlayRootRegistry<FakeDocument>,
    ) {
        registry_with(doc, OverlayConfig::default())
    }

    #[test]
    fn root_is_a_singleton() {
        let (doc, _lock, reg) = registry(FakeDocument::new());
        let first = reg.overlay_root().unwrap();
        for _ in 0..5 {
            assert_eq!(reg.overlay_root().unwrap(), first);
        }
        assert_eq!(doc.count_with_id("__app_overlays"), 1);
        // 1 head watcher + 2 overflow watchers + 2 pointer guards
        assert_eq!(doc.observer_count(), 5);
    }

    #[test]
    fn adopts_existing_container() {
        let (doc, _lock, reg) = registry(FakeDocument::new());
        let existing = doc.append_container("__app_overlays", &[]).unwrap();
        assert_eq!(reg.overlay_root().unwrap(), existing);
        assert_eq!(doc.count_with_id("__app_overlays"), 1);
    }

    #[test]
    fn no_body_means_no_root() {
        let (_doc, _lock, reg) = registry(FakeDocument::new().without(Element::Body));
        assert!(matches!(reg.overlay_root(), Err(OverlayError::NoDocument)));
        assert!(!reg.is_mounted());
    }

    #[test]
    fn stylesheet_stays_last_in_head() {
        let (doc, _lock, reg) = registry(FakeDocument::new());
        doc.insert_head_node("vendor-a");
        reg.overlay_root().unwrap();
        doc.insert_head_node("vendor-b");
        doc.flush();
        assert_eq!(
            doc.head_order(),
            vec!["vendor-a", "vendor-b", "__force_allow_scroll"]
        );
        // The re-append itself must not keep the watcher busy.
        assert!(doc.settle(10) <= 2);
        assert_eq!(reg.stats().head_reorders, 1);
    }

    #[test]
    fn external_overflow_hidden_is_reverted_within_one_tick() {
        let (doc, _lock, reg) = registry(FakeDocument::new());
        reg.overlay_root().unwrap();
        doc.settle(4);
        doc.external_style(Element::Body, "overflow", "hidden");
        doc.external_style(Element::Html, "overflow", "hidden");
        doc.flush();
        assert_eq!(doc.style(Element::Body, "overflow"), "auto");
        assert_eq!(doc.style(Element::Html, "overflow"), "auto");
        assert_eq!(reg.stats().overflow_reverts, 2);
    }

    #[test]
    fn install_normalizes_existing_leak() {
        let (doc, _lock, reg) = registry(FakeDocument::new());
        doc.external_style(Element::Html, "overflow", "hidden");
        reg.overlay_root().unwrap();
        assert_eq!(doc.style(Element::Html, "overflow"), "auto");
    }

    #[test]
    fn sanctioned_scroll_lock_survives_the_guard() {
        let (doc, lock, reg) = registry(FakeDocument::new());
        reg.overlay_root().unwrap();
        lock.acquire();
        doc.settle(4);
        assert_eq!(doc.style(Element::Body, "overflow"), "hidden");
        assert_eq!(doc.style(Element::Html, "overflow"), "hidden");
        for el in Element::SCROLL_ROOTS {
            assert_eq!(doc.style_priority(el, "overflow"), Some(Priority::Important));
        }
        lock.release();
        doc.settle(4);
        assert_eq!(doc.style(Element::Body, "overflow"), "");
        assert_eq!(doc.style(Element::Html, "overflow"), "");
        assert_eq!(reg.stats().overflow_reverts, 0);
    }

    #[test]
    fn pointer_guard_reverts_without_modal() {
        let (doc, _lock, reg) = registry(FakeDocument::new());
        reg.overlay_root().unwrap();
        doc.settle(4);
        doc.external_attribute(Element::Body, "data-scroll-locked");
        doc.external_style(Element::Body, "pointer-events", "none");
        doc.external_style(Element::Html, "pointer-events", "none");
        doc.flush();
        assert!(!doc.attribute_present(Element::Body, "data-scroll-locked"));
        assert_eq!(doc.style(Element::Body, "pointer-events"), "");
        assert_eq!(doc.style(Element::Html, "pointer-events"), "");
    }

    #[test]
    fn pointer_guard_leaves_modals_alone() {
        let (doc, _lock, reg) = registry(FakeDocument::new());
        reg.overlay_root().unwrap();
        doc.set_modal_present(true);
        doc.external_attribute(Element::Body, "data-scroll-locked");
        doc.external_style(Element::Body, "pointer-events", "none");
        doc.flush();
        assert!(doc.attribute_present(Element::Body, "data-scroll-locked"));
        assert_eq!(doc.style(Element::Body, "pointer-events"), "none");
    }

    #[test]
    fn guard_failures_do_not_block_the_root() {
        let doc = FakeDocument::new()
            .failing(FakeFailure::Observe)
            .failing(FakeFailure::Stylesheet);
        let (doc, _lock, reg) = registry(doc);
        assert!(reg.overlay_root().is_ok());
        assert_eq!(doc.observer_count(), 0);
        assert!(doc.head_order().is_empty());
    }

    #[test]
    fn container_failure_surfaces() {
        let (_doc, _lock, reg) = registry(FakeDocument::new().failing(FakeFailure::Container));
        assert!(matches!(reg.overlay_root(), Err(OverlayError::Host(_))));
    }

    #[test]
    fn disabled_guards_install_nothing() {
        let config = OverlayConfig {
            guards: GuardPolicy::none(),
            ..OverlayConfig::default()
        };
        let (doc, _lock, reg) = registry_with(FakeDocument::new(), config);
        reg.overlay_root().unwrap();
        assert_eq!(doc.observer_count(), 0);
        doc.external_style(Element::Body, "overflow", "hidden");
        doc.flush();
        assert_eq!(doc.style(Element::Body, "overflow"), "hidden");
    }

    #[test]
    fn stats_serialize() {
        let (doc, _lock, reg) = registry(FakeDocument::new());
        reg.overlay_root().unwrap();
        doc.external_style(Element::Body, "overflow", "hidden");
        doc.flush();
        let json = reg.stats_json().unwrap();
        assert!(json.contains(r#""overflow_reverts":1"#));
        assert!(json.contains(r#""guard":"overflow""#));
    }
}
