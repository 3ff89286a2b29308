use std::cell::RefCell;

use js_sys::Array;
use overlay_core::{
    DomHost, Element, HostError, MutationCallback, MutationRecord, ObserveOptions, Priority,
    PropagationControl, Rect, TriggerRef, Viewport,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, MutationObserver, MutationObserverInit, Node, Window};

type ObserverClosure = Closure<dyn FnMut(Array, MutationObserver)>;

fn js_err(what: &'static str) -> impl Fn(JsValue) -> HostError {
    move |err| HostError::Rejected(format!("{what}: {err:?}"))
}

/// `DomHost` over the live browser document.
pub struct WebDocument {
    window: Window,
    document: Document,
    // Observers and their callbacks live as long as the page.
    observers: RefCell<Vec<(MutationObserver, ObserverClosure)>>,
}

impl WebDocument {
    pub fn from_window() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self {
            window,
            document,
            observers: RefCell::new(Vec::new()),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn element(&self, el: Element) -> Option<HtmlElement> {
        match el {
            Element::Html => self
                .document
                .document_element()
                .and_then(|e| e.dyn_into::<HtmlElement>().ok()),
            Element::Head => self.document.head().map(|h| h.unchecked_into()),
            Element::Body => self.document.body(),
        }
    }

    fn require(&self, el: Element) -> Result<HtmlElement, HostError> {
        self.element(el)
            .ok_or_else(|| HostError::Unavailable(el.tag().to_string()))
    }
}

fn element_of(doc: &Document, node: &Node) -> Option<Element> {
    let same = |candidate: Option<HtmlElement>| {
        candidate.is_some_and(|c| c.is_same_node(Some(node)))
    };
    if same(doc.body()) {
        Some(Element::Body)
    } else if same(doc.head().map(|h| h.unchecked_into())) {
        Some(Element::Head)
    } else if doc
        .document_element()
        .is_some_and(|e| e.is_same_node(Some(node)))
    {
        Some(Element::Html)
    } else {
        None
    }
}

fn convert_record(doc: &Document, record: &web_sys::MutationRecord) -> Option<MutationRecord> {
    let target = element_of(doc, &record.target()?)?;
    match record.type_().as_str() {
        "childList" => Some(MutationRecord::ChildList {
            target,
            added: record.added_nodes().length() as usize,
        }),
        "attributes" => Some(MutationRecord::Attribute {
            target,
            name: record.attribute_name()?,
        }),
        _ => None,
    }
}

impl DomHost for WebDocument {
    type Node = HtmlElement;

    fn has_element(&self, el: Element) -> bool {
        self.element(el).is_some()
    }

    fn inline_style(&self, el: Element, prop: &str) -> Result<String, HostError> {
        self.require(el)?
            .style()
            .get_property_value(prop)
            .map_err(js_err("style read"))
    }

    fn computed_style(&self, el: Element, prop: &str) -> Result<String, HostError> {
        let node = self.require(el)?;
        let decl = self
            .window
            .get_computed_style(&node)
            .map_err(js_err("computed style"))?
            .ok_or_else(|| HostError::Unavailable("computed style".into()))?;
        decl.get_property_value(prop).map_err(js_err("computed style"))
    }

    fn set_style(
        &self,
        el: Element,
        prop: &str,
        value: &str,
        priority: Priority,
    ) -> Result<(), HostError> {
        self.require(el)?
            .style()
            .set_property_with_priority(prop, value, priority.as_css())
            .map_err(js_err("style write"))
    }

    fn clear_style(&self, el: Element, prop: &str) -> Result<(), HostError> {
        self.require(el)?
            .style()
            .remove_property(prop)
            .map(|_| ())
            .map_err(js_err("style write"))
    }

    fn has_attribute(&self, el: Element, name: &str) -> bool {
        self.element(el).is_some_and(|node| node.has_attribute(name))
    }

    fn remove_attribute(&self, el: Element, name: &str) -> Result<(), HostError> {
        self.require(el)?
            .remove_attribute(name)
            .map_err(js_err("attribute removal"))
    }

    fn matches_any(&self, selector: &str) -> bool {
        matches!(self.document.query_selector(selector), Ok(Some(_)))
    }

    fn element_by_id(&self, id: &str) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
    }

    fn append_container(
        &self,
        id: &str,
        styles: &[(&'static str, String)],
    ) -> Result<HtmlElement, HostError> {
        let body = self.require(Element::Body)?;
        let div = self
            .document
            .create_element("div")
            .map_err(js_err("create div"))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| HostError::Rejected("div cast failed".into()))?;
        div.set_id(id);
        let style = div.style();
        for (prop, value) in styles {
            style
                .set_property(prop, value)
                .map_err(js_err("container style"))?;
        }
        body.append_child(&div).map_err(js_err("append container"))?;
        Ok(div)
    }

    fn append_stylesheet(&self, id: &str, css: &str) -> Result<(), HostError> {
        let head = self.require(Element::Head)?;
        let sheet = match self.document.get_element_by_id(id) {
            Some(existing) => existing,
            None => {
                let sheet = self
                    .document
                    .create_element("style")
                    .map_err(js_err("create style"))?;
                sheet.set_id(id);
                sheet.set_text_content(Some(css));
                sheet
            }
        };
        // appendChild on an attached node moves it to the end.
        head.append_child(&sheet).map_err(js_err("append style"))?;
        Ok(())
    }

    fn is_last_in_head(&self, id: &str) -> bool {
        self.element(Element::Head)
            .and_then(|head| head.last_element_child())
            .is_some_and(|last| last.id() == id)
    }

    fn observe(
        &self,
        target: Element,
        options: ObserveOptions,
        callback: MutationCallback,
    ) -> Result<(), HostError> {
        let node = self.require(target)?;
        let doc = self.document.clone();
        let closure = ObserverClosure::new(move |records: Array, _observer: MutationObserver| {
            let mapped: Vec<MutationRecord> = records
                .iter()
                .filter_map(|r| convert_record(&doc, r.unchecked_ref()))
                .collect();
            if !mapped.is_empty() {
                callback(&mapped);
            }
        });
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())
            .map_err(js_err("mutation observer"))?;

        let init = MutationObserverInit::new();
        init.set_child_list(options.child_list);
        init.set_attributes(options.attributes);
        if !options.attribute_filter.is_empty() {
            let filter = Array::new();
            for name in &options.attribute_filter {
                filter.push(&JsValue::from_str(name));
            }
            init.set_attribute_filter(&filter);
        }
        observer
            .observe_with_options(&node, &init)
            .map_err(js_err("observe"))?;
        self.observers.borrow_mut().push((observer, closure));
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        let px = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport {
            width: px(self.window.inner_width()),
            height: px(self.window.inner_height()),
            scroll_x: self.window.scroll_x().unwrap_or(0.0),
            scroll_y: self.window.scroll_y().unwrap_or(0.0),
        }
    }
}

/// Trigger anchored to a DOM element; yields no rect once detached.
#[derive(Clone, Default)]
pub struct ElementTrigger(pub Option<web_sys::Element>);

impl TriggerRef for ElementTrigger {
    fn bounding_rect(&self) -> Option<Rect> {
        let el = self.0.as_ref()?;
        if !el.is_connected() {
            return None;
        }
        let r = el.get_bounding_client_rect();
        Some(Rect::new(r.left(), r.top(), r.width(), r.height()))
    }
}

pub struct BrowserEvent<'a>(pub &'a web_sys::Event);

impl PropagationControl for BrowserEvent<'_> {
    fn stop_propagation(&self) {
        self.0.stop_propagation();
    }
}
