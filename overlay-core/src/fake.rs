//! In-memory [`DomHost`] for tests. Outside this crate it is available
//! behind the `testing` feature.
//!
//! Mutations made through the host (or the `external_*` helpers standing in
//! for third-party scripts) are queued as records; [`FakeDocument::flush`]
//! delivers them to observers the way one mutation-observer tick would.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::config::DEFAULT_MODAL_SELECTOR;
use crate::error::HostError;
use crate::geometry::Viewport;
use crate::host::{
    DomHost, Element, MutationCallback, MutationRecord, ObserveOptions, Priority,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Operations that can be made to fail, simulating restricted DOM APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeFailure {
    Observe,
    Stylesheet,
    Style,
    Container,
}

struct FakeState {
    missing: HashSet<Element>,
    styles: HashMap<(Element, String), (String, Priority)>,
    computed_defaults: HashMap<String, String>,
    attributes: HashMap<Element, BTreeSet<String>>,
    body_children: Vec<(NodeId, String)>,
    head_children: Vec<String>,
    matching: HashSet<String>,
    next_node: u32,
    viewport: Viewport,
    pending: Vec<MutationRecord>,
    observers: Vec<(Element, ObserveOptions, MutationCallback)>,
    failing: HashSet<FakeFailure>,
}

pub struct FakeDocument {
    state: RefCell<FakeState>,
}

impl Default for FakeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDocument {
    pub fn new() -> Self {
        let computed_defaults = [("overflow", "visible"), ("pointer-events", "auto")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            state: RefCell::new(FakeState {
                missing: HashSet::new(),
                styles: HashMap::new(),
                computed_defaults,
                attributes: HashMap::new(),
                body_children: Vec::new(),
                head_children: Vec::new(),
                matching: HashSet::new(),
                next_node: 1,
                viewport: Viewport::new(1280.0, 800.0),
                pending: Vec::new(),
                observers: Vec::new(),
                failing: HashSet::new(),
            }),
        }
    }

    /// Document without `el` (e.g. a detached or headless document).
    pub fn without(self, el: Element) -> Self {
        self.state.borrow_mut().missing.insert(el);
        self
    }

    pub fn failing(self, failure: FakeFailure) -> Self {
        self.state.borrow_mut().failing.insert(failure);
        self
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.state.borrow_mut().viewport = viewport;
    }

    pub fn set_modal_present(&self, present: bool) {
        let mut st = self.state.borrow_mut();
        if present {
            st.matching.insert(DEFAULT_MODAL_SELECTOR.to_string());
        } else {
            st.matching.remove(DEFAULT_MODAL_SELECTOR);
        }
    }

    /// Style written by code outside the overlay subsystem.
    pub fn external_style(&self, el: Element, prop: &str, value: &str) {
        let mut st = self.state.borrow_mut();
        st.styles
            .insert((el, prop.to_string()), (value.to_string(), Priority::Normal));
        st.pending.push(MutationRecord::Attribute {
            target: el,
            name: "style".into(),
        });
    }

    pub fn external_attribute(&self, el: Element, name: &str) {
        let mut st = self.state.borrow_mut();
        st.attributes.entry(el).or_default().insert(name.to_string());
        st.pending.push(MutationRecord::Attribute {
            target: el,
            name: name.to_string(),
        });
    }

    /// Another library inserting a `<style>`/`<link>` into the head.
    pub fn insert_head_node(&self, id: &str) {
        let mut st = self.state.borrow_mut();
        st.head_children.push(id.to_string());
        st.pending.push(MutationRecord::ChildList {
            target: Element::Head,
            added: 1,
        });
    }

    /// Deliver queued records to matching observers; one observer tick.
    /// Returns the number of callbacks invoked.
    pub fn flush(&self) -> usize {
        let (pending, observers) = {
            let mut st = self.state.borrow_mut();
            (std::mem::take(&mut st.pending), st.observers.clone())
        };
        let mut invoked = 0;
        for (target, options, callback) in observers {
            let records: Vec<MutationRecord> = pending
                .iter()
                .filter(|r| r.target() == target && options.matches(r))
                .cloned()
                .collect();
            if !records.is_empty() {
                callback(&records);
                invoked += 1;
            }
        }
        invoked
    }

    /// Flush until quiet, up to `max_ticks`. Returns ticks that did work.
    pub fn settle(&self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.has_pending() {
            self.flush();
            ticks += 1;
        }
        ticks
    }

    pub fn has_pending(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    pub fn style(&self, el: Element, prop: &str) -> String {
        self.state
            .borrow()
            .styles
            .get(&(el, prop.to_string()))
            .map(|(v, _)| v.clone())
            .unwrap_or_default()
    }

    pub fn style_priority(&self, el: Element, prop: &str) -> Option<Priority> {
        self.state
            .borrow()
            .styles
            .get(&(el, prop.to_string()))
            .map(|(_, p)| *p)
    }

    pub fn attribute_present(&self, el: Element, name: &str) -> bool {
        self.has_attribute(el, name)
    }

    pub fn count_with_id(&self, id: &str) -> usize {
        self.state
            .borrow()
            .body_children
            .iter()
            .filter(|(_, child)| child == id)
            .count()
    }

    pub fn head_order(&self) -> Vec<String> {
        self.state.borrow().head_children.clone()
    }

    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    fn check(&self, failure: FakeFailure, what: &str) -> Result<(), HostError> {
        if self.state.borrow().failing.contains(&failure) {
            Err(HostError::Rejected(what.to_string()))
        } else {
            Ok(())
        }
    }

    fn require(&self, el: Element) -> Result<(), HostError> {
        if self.has_element(el) {
            Ok(())
        } else {
            Err(HostError::Unavailable(el.tag().to_string()))
        }
    }
}

impl DomHost for FakeDocument {
    type Node = NodeId;

    fn has_element(&self, el: Element) -> bool {
        !self.state.borrow().missing.contains(&el)
    }

    fn inline_style(&self, el: Element, prop: &str) -> Result<String, HostError> {
        self.require(el)?;
        Ok(self.style(el, prop))
    }

    fn computed_style(&self, el: Element, prop: &str) -> Result<String, HostError> {
        let inline = self.inline_style(el, prop)?;
        if !inline.is_empty() {
            return Ok(inline);
        }
        Ok(self
            .state
            .borrow()
            .computed_defaults
            .get(prop)
            .cloned()
            .unwrap_or_default())
    }

    fn set_style(
        &self,
        el: Element,
        prop: &str,
        value: &str,
        priority: Priority,
    ) -> Result<(), HostError> {
        self.require(el)?;
        self.check(FakeFailure::Style, "style write")?;
        let mut st = self.state.borrow_mut();
        let key = (el, prop.to_string());
        let next = (value.to_string(), priority);
        if st.styles.get(&key) != Some(&next) {
            st.styles.insert(key, next);
            st.pending.push(MutationRecord::Attribute {
                target: el,
                name: "style".into(),
            });
        }
        Ok(())
    }

    fn clear_style(&self, el: Element, prop: &str) -> Result<(), HostError> {
        self.require(el)?;
        self.check(FakeFailure::Style, "style write")?;
        let mut st = self.state.borrow_mut();
        if st.styles.remove(&(el, prop.to_string())).is_some() {
            st.pending.push(MutationRecord::Attribute {
                target: el,
                name: "style".into(),
            });
        }
        Ok(())
    }

    fn has_attribute(&self, el: Element, name: &str) -> bool {
        self.state
            .borrow()
            .attributes
            .get(&el)
            .is_some_and(|attrs| attrs.contains(name))
    }

    fn remove_attribute(&self, el: Element, name: &str) -> Result<(), HostError> {
        self.require(el)?;
        let mut st = self.state.borrow_mut();
        let removed = st
            .attributes
            .get_mut(&el)
            .is_some_and(|attrs| attrs.remove(name));
        if removed {
            st.pending.push(MutationRecord::Attribute {
                target: el,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn matches_any(&self, selector: &str) -> bool {
        self.state.borrow().matching.contains(selector)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.state
            .borrow()
            .body_children
            .iter()
            .find(|(_, child)| child == id)
            .map(|(node, _)| *node)
    }

    fn append_container(
        &self,
        id: &str,
        _styles: &[(&'static str, String)],
    ) -> Result<NodeId, HostError> {
        self.require(Element::Body)?;
        self.check(FakeFailure::Container, "container append")?;
        let mut st = self.state.borrow_mut();
        let node = NodeId(st.next_node);
        st.next_node += 1;
        st.body_children.push((node, id.to_string()));
        st.pending.push(MutationRecord::ChildList {
            target: Element::Body,
            added: 1,
        });
        Ok(node)
    }

    fn append_stylesheet(&self, id: &str, _css: &str) -> Result<(), HostError> {
        self.require(Element::Head)?;
        self.check(FakeFailure::Stylesheet, "stylesheet append")?;
        let mut st = self.state.borrow_mut();
        st.head_children.retain(|child| child != id);
        st.head_children.push(id.to_string());
        st.pending.push(MutationRecord::ChildList {
            target: Element::Head,
            added: 1,
        });
        Ok(())
    }

    fn is_last_in_head(&self, id: &str) -> bool {
        self.state
            .borrow()
            .head_children
            .last()
            .is_some_and(|last| last == id)
    }

    fn observe(
        &self,
        target: Element,
        options: ObserveOptions,
        callback: MutationCallback,
    ) -> Result<(), HostError> {
        self.require(target)?;
        self.check(FakeFailure::Observe, "mutation observer")?;
        self.state
            .borrow_mut()
            .observers
            .push((target, options, callback));
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }
}
