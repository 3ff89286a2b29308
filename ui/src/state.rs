use std::cell::RefCell;
use std::rc::Rc;

use leptos::*;
use overlay_core::{PopoverController, PopoverOptions, RenderPlan};
use overlay_shell::{ElementTrigger, WebDocument};

/// Shared by one `Popover` and its trigger/content children.
#[derive(Clone)]
pub struct PopoverCtx {
    pub controller: Rc<RefCell<PopoverController<WebDocument>>>,
    pub open: RwSignal<bool>,
    pub plan: RwSignal<RenderPlan>,
    pub trigger: NodeRef<html::Button>,
}

impl PopoverCtx {
    /// Run `f` against the controller, then mirror its state into signals.
    /// The controller borrow ends before any signal fires, and signals only
    /// fire on an actual change so ignored keys and clicks leave the content
    /// subtree alone.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut PopoverController<WebDocument>) -> R) -> R {
        let out = f(&mut self.controller.borrow_mut());
        let (open, plan) = {
            let ctl = self.controller.borrow();
            (ctl.is_open(), ctl.render_plan())
        };
        if self.plan.with_untracked(|current| *current != plan) {
            self.plan.set(plan);
        }
        if self.open.get_untracked() != open {
            self.open.set(open);
        }
        out
    }

    /// Document origin of the trigger's positioned containing block, when
    /// there is one. Inline content shares the trigger's ancestors.
    pub fn inline_origin(&self) -> Option<(f64, f64)> {
        let button = self.trigger.get_untracked()?;
        let el: &web_sys::HtmlElement = &button;
        let parent = el.offset_parent()?;
        let tag = parent.tag_name();
        if tag.eq_ignore_ascii_case("body") || tag.eq_ignore_ascii_case("html") {
            return None;
        }
        let window = web_sys::window()?;
        let rect = parent.get_bounding_client_rect();
        let left = rect.left() + window.scroll_x().unwrap_or(0.0) + f64::from(parent.client_left())
            - f64::from(parent.scroll_left());
        let top = rect.top() + window.scroll_y().unwrap_or(0.0) + f64::from(parent.client_top())
            - f64::from(parent.scroll_top());
        Some((left, top))
    }

    pub fn trigger_ref(&self) -> ElementTrigger {
        ElementTrigger(self.trigger.get_untracked().map(|button| {
            let el: &web_sys::Element = &button;
            el.clone()
        }))
    }
}

pub fn provide_popover_ctx(options: PopoverOptions) -> Option<PopoverCtx> {
    let services = match overlay_shell::services() {
        Ok(services) => services,
        Err(err) => {
            web_sys::console::error_1(&err);
            return None;
        }
    };
    let ctx = PopoverCtx {
        controller: Rc::new(RefCell::new(services.popover(options))),
        open: create_rw_signal(false),
        plan: create_rw_signal(RenderPlan::Hidden),
        trigger: create_node_ref::<html::Button>(),
    };
    provide_context(ctx.clone());
    Some(ctx)
}

pub fn use_popover() -> Option<PopoverCtx> {
    use_context::<PopoverCtx>()
}
