use std::cell::RefCell;
use std::rc::Rc;

use crate::host::{DomHost, Element, Priority};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollLockState {
    pub count: usize,
    /// Elements pinned by the current lock with their inline `overflow`
    /// from before the first acquire.
    pub saved_overflow: Vec<(Element, Option<String>)>,
}

/// Reference-counted page scroll lock shared by every open overlay.
///
/// Only the 0 -> 1 acquire touches the style (saving the previous inline
/// values) and only the 1 -> 0 release restores it. The scroll root is
/// pinned together with `<html>`: a non-visible overflow on the root element
/// is what the viewport uses, so locking `<body>` alone leaves the page
/// scrollable under the force-scroll stylesheet. Style writes are best
/// effort; a missing scroll root turns every call into a no-op.
pub struct ScrollLockCounter<H: DomHost> {
    host: Rc<H>,
    root: Element,
    state: RefCell<ScrollLockState>,
}

impl<H: DomHost> ScrollLockCounter<H> {
    pub fn new(host: Rc<H>, root: Element) -> Self {
        Self {
            host,
            root,
            state: RefCell::new(ScrollLockState::default()),
        }
    }

    fn targets(&self) -> Vec<Element> {
        Element::SCROLL_ROOTS
            .into_iter()
            .filter(|el| *el == self.root || (*el == Element::Html && self.host.has_element(*el)))
            .collect()
    }

    pub fn acquire(&self) {
        if !self.host.has_element(self.root) {
            tracing::trace!(target: "overlay", root = self.root.tag(), "scroll root missing, lock skipped");
            return;
        }
        let first = {
            let mut st = self.state.borrow_mut();
            st.count += 1;
            st.count == 1
        };
        if !first {
            tracing::trace!(target: "overlay", count = self.count(), "scroll lock nested");
            return;
        }

        let targets = self.targets();
        let saved = targets
            .iter()
            .map(|el| {
                let value = match self.host.inline_style(*el, "overflow") {
                    Ok(v) if !v.is_empty() => Some(v),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::debug!(target: "overlay", %err, el = el.tag(), "reading overflow failed");
                        None
                    }
                };
                (*el, value)
            })
            .collect();
        self.state.borrow_mut().saved_overflow = saved;
        for el in targets {
            // Important so it wins over the force-scroll stylesheet.
            if let Err(err) = self
                .host
                .set_style(el, "overflow", "hidden", Priority::Important)
            {
                tracing::debug!(target: "overlay", %err, el = el.tag(), "locking scroll failed");
            }
        }
        tracing::trace!(target: "overlay", "scroll locked");
    }

    pub fn release(&self) {
        if !self.host.has_element(self.root) {
            return;
        }
        let restore = {
            let mut st = self.state.borrow_mut();
            if st.count == 0 {
                tracing::trace!(target: "overlay", "unbalanced scroll lock release ignored");
                return;
            }
            st.count -= 1;
            if st.count == 0 {
                std::mem::take(&mut st.saved_overflow)
            } else {
                return;
            }
        };
        for (el, saved) in restore {
            let res = match saved {
                Some(value) => self
                    .host
                    .set_style(el, "overflow", &value, Priority::Normal),
                None => self.host.clear_style(el, "overflow"),
            };
            if let Err(err) = res {
                tracing::debug!(target: "overlay", %err, el = el.tag(), "restoring overflow failed");
            }
        }
        tracing::trace!(target: "overlay", "scroll unlocked");
    }

    /// Elements whose overflow the lock currently holds.
    pub fn pinned(&self) -> Vec<Element> {
        let st = self.state.borrow();
        if st.count == 0 {
            return Vec::new();
        }
        st.saved_overflow.iter().map(|(el, _)| *el).collect()
    }

    /// Acquire and hand back a guard that releases on drop.
    pub fn guard(counter: &Rc<Self>) -> ScrollLockGuard<H> {
        counter.acquire();
        ScrollLockGuard {
            counter: Rc::clone(counter),
        }
    }

    pub fn root(&self) -> Element {
        self.root
    }

    pub fn count(&self) -> usize {
        self.state.borrow().count
    }

    pub fn is_locked(&self) -> bool {
        self.count() > 0
    }

    pub fn state(&self) -> ScrollLockState {
        self.state.borrow().clone()
    }
}

pub struct ScrollLockGuard<H: DomHost> {
    counter: Rc<ScrollLockCounter<H>>,
}

impl<H: DomHost> Drop for ScrollLockGuard<H> {
    fn drop(&mut self) {
        self.counter.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeDocument, FakeFailure};
    use proptest::prelude::*;

    fn counter(doc: FakeDocument) -> (Rc<FakeDocument>, Rc<ScrollLockCounter<FakeDocument>>) {
        let doc = Rc::new(doc);
        let lock = Rc::new(ScrollLockCounter::new(Rc::clone(&doc), Element::Body));
        (doc, lock)
    }

    #[test]
    fn first_acquire_saves_last_release_restores() {
        let (doc, lock) = counter(FakeDocument::new());
        doc.external_style(Element::Body, "overflow", "scroll");
        lock.acquire();
        lock.acquire();
        assert_eq!(doc.style(Element::Body, "overflow"), "hidden");
        assert_eq!(
            doc.style_priority(Element::Body, "overflow"),
            Some(Priority::Important)
        );
        lock.release();
        assert_eq!(doc.style(Element::Body, "overflow"), "hidden");
        assert!(lock.is_locked());
        lock.release();
        assert_eq!(doc.style(Element::Body, "overflow"), "scroll");
        assert_eq!(lock.state(), ScrollLockState::default());
    }

    #[test]
    fn pins_html_together_with_body() {
        let (doc, lock) = counter(FakeDocument::new());
        doc.external_style(Element::Html, "overflow", "auto");
        lock.acquire();
        for el in Element::SCROLL_ROOTS {
            assert_eq!(doc.style(el, "overflow"), "hidden");
            assert_eq!(doc.style_priority(el, "overflow"), Some(Priority::Important));
        }
        assert_eq!(lock.pinned(), vec![Element::Html, Element::Body]);
        lock.release();
        assert_eq!(doc.style(Element::Html, "overflow"), "auto");
        assert_eq!(doc.style_priority(Element::Html, "overflow"), Some(Priority::Normal));
        assert_eq!(doc.style(Element::Body, "overflow"), "");
        assert!(lock.pinned().is_empty());
    }

    #[test]
    fn html_root_is_pinned_once() {
        let doc = Rc::new(FakeDocument::new());
        let lock = ScrollLockCounter::new(Rc::clone(&doc), Element::Html);
        lock.acquire();
        assert_eq!(lock.pinned(), vec![Element::Html]);
        assert_eq!(doc.style(Element::Body, "overflow"), "");
        lock.release();
        assert_eq!(doc.style(Element::Html, "overflow"), "");
    }

    #[test]
    fn clears_override_when_nothing_was_saved() {
        let (doc, lock) = counter(FakeDocument::new());
        lock.acquire();
        lock.release();
        assert_eq!(doc.style(Element::Body, "overflow"), "");
        assert_eq!(doc.style_priority(Element::Body, "overflow"), None);
    }

    #[test]
    fn extra_release_never_goes_negative() {
        let (doc, lock) = counter(FakeDocument::new());
        lock.release();
        assert_eq!(lock.count(), 0);
        lock.acquire();
        assert_eq!(lock.count(), 1);
        lock.release();
        lock.release();
        assert_eq!(lock.count(), 0);
        assert_eq!(doc.style(Element::Body, "overflow"), "");
    }

    #[test]
    fn missing_root_is_a_no_op() {
        let (_doc, lock) = counter(FakeDocument::new().without(Element::Body));
        lock.acquire();
        assert_eq!(lock.count(), 0);
        lock.release();
        assert_eq!(lock.count(), 0);
    }

    #[test]
    fn failed_style_write_still_counts() {
        let (doc, lock) = counter(FakeDocument::new().failing(FakeFailure::Style));
        lock.acquire();
        assert!(lock.is_locked());
        assert_eq!(doc.style(Element::Body, "overflow"), "");
        lock.release();
        assert!(!lock.is_locked());
    }

    #[test]
    fn guard_releases_on_drop() {
        let (doc, lock) = counter(FakeDocument::new());
        {
            let _a = ScrollLockCounter::guard(&lock);
            let _b = ScrollLockCounter::guard(&lock);
            assert_eq!(lock.count(), 2);
        }
        assert_eq!(lock.count(), 0);
        assert_eq!(doc.style(Element::Body, "overflow"), "");
    }

    proptest! {
        #[test]
        fn balanced_sequences_restore_prior_overflow(
            ops in proptest::collection::vec(any::<bool>(), 0..40),
            prior in prop_oneof![Just(""), Just("auto"), Just("scroll")],
        ) {
            let (doc, lock) = counter(FakeDocument::new());
            if !prior.is_empty() {
                doc.external_style(Element::Body, "overflow", prior);
            }
            // Each `true` opens a holder; each `false` closes one if any is open.
            let mut open = 0usize;
            for op in ops {
                if op {
                    lock.acquire();
                    open += 1;
                } else if open > 0 {
                    lock.release();
                    open -= 1;
                }
                let expected_locked = open > 0;
                prop_assert_eq!(lock.is_locked(), expected_locked);
                if expected_locked {
                    prop_assert_eq!(doc.style(Element::Body, "overflow"), "hidden");
                    prop_assert_eq!(doc.style(Element::Html, "overflow"), "hidden");
                }
            }
            for _ in 0..open {
                lock.release();
            }
            prop_assert_eq!(doc.style(Element::Body, "overflow"), prior);
            prop_assert_eq!(doc.style(Element::Html, "overflow"), "");
        }
    }
}
