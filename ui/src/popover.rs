use std::cell::Cell;
use std::rc::Rc;

use leptos::*;
use overlay_core::{CloseReason, DismissEvent, PopoverOptions, RenderPlan, ViewportEvent};
use overlay_shell::BrowserEvent;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{KeyboardEvent, MouseEvent};

use crate::state::{provide_popover_ctx, use_popover, PopoverCtx};

type Listener = Closure<dyn FnMut(web_sys::Event)>;

/// Dismissal listeners of one popover. Created once per content node and
/// only attached while open; a listener may detach itself mid-dispatch, so
/// the closures must outlive any single open cycle.
struct DismissListeners {
    click: Listener,
    keydown: Listener,
    popstate: Listener,
    resize: Listener,
    attached: Cell<bool>,
}

impl DismissListeners {
    fn new(ctx: PopoverCtx, content: NodeRef<html::Div>) -> Self {
        let click = {
            let ctx = ctx.clone();
            Listener::wrap(Box::new(move |ev: web_sys::Event| {
                let target = ev.target();
                let target = target.as_ref().and_then(|t| t.dyn_ref::<web_sys::Node>());
                let inside_content = content.get_untracked().is_some_and(|node| {
                    let node: &web_sys::Node = &node;
                    node.contains(target)
                });
                // The trigger's own handler runs after this one and toggles.
                let on_trigger = ctx.trigger.get_untracked().is_some_and(|button| {
                    let node: &web_sys::Node = &button;
                    node.contains(target)
                });
                ctx.with_controller(|c| {
                    c.dismiss(&DismissEvent::Click {
                        inside_content,
                        on_trigger,
                    })
                });
            }))
        };
        let keydown = {
            let ctx = ctx.clone();
            Listener::wrap(Box::new(move |ev: web_sys::Event| {
                if let Some(key_ev) = ev.dyn_ref::<KeyboardEvent>() {
                    let key = key_ev.key();
                    ctx.with_controller(|c| c.dismiss(&DismissEvent::KeyDown(key)));
                }
            }))
        };
        let popstate = {
            let ctx = ctx.clone();
            Listener::wrap(Box::new(move |_ev: web_sys::Event| {
                ctx.with_controller(|c| c.dismiss(&DismissEvent::HistoryNavigation));
            }))
        };
        let resize = Listener::wrap(Box::new(move |_ev: web_sys::Event| {
            let trigger = ctx.trigger_ref();
            ctx.with_controller(|c| c.on_viewport_event(ViewportEvent::Resize, &trigger));
        }));
        Self {
            click,
            keydown,
            popstate,
            resize,
            attached: Cell::new(false),
        }
    }

    fn attach(&self) {
        if self.attached.replace(true) {
            return;
        }
        let Some(win) = web_sys::window() else {
            return;
        };
        if let Some(doc) = win.document() {
            let _ = doc.add_event_listener_with_callback("click", self.click.as_ref().unchecked_ref());
            let _ = doc
                .add_event_listener_with_callback("keydown", self.keydown.as_ref().unchecked_ref());
        }
        let _ = win.add_event_listener_with_callback("popstate", self.popstate.as_ref().unchecked_ref());
        let _ = win.add_event_listener_with_callback("resize", self.resize.as_ref().unchecked_ref());
    }

    fn detach(&self) {
        if !self.attached.replace(false) {
            return;
        }
        let Some(win) = web_sys::window() else {
            return;
        };
        if let Some(doc) = win.document() {
            let _ = doc
                .remove_event_listener_with_callback("click", self.click.as_ref().unchecked_ref());
            let _ = doc.remove_event_listener_with_callback(
                "keydown",
                self.keydown.as_ref().unchecked_ref(),
            );
        }
        let _ = win
            .remove_event_listener_with_callback("popstate", self.popstate.as_ref().unchecked_ref());
        let _ = win
            .remove_event_listener_with_callback("resize", self.resize.as_ref().unchecked_ref());
    }
}

/// Groups a trigger and its floating content.
#[component]
pub fn Popover(
    /// Render the content into the shared overlay root.
    #[prop(optional)]
    portal: bool,
    /// Hold the page scroll lock while open.
    #[prop(optional)]
    lock_scroll: bool,
    children: Children,
) -> impl IntoView {
    if let Some(ctx) = provide_popover_ctx(PopoverOptions {
        portal,
        lock_scroll,
    }) {
        on_cleanup(move || {
            ctx.with_controller(|c| c.close(CloseReason::Programmatic));
        });
    }
    children()
}

/// Handles for wiring a consumer-rendered button as the trigger, for when
/// `PopoverTrigger`'s own `<button>` does not fit the markup.
#[derive(Clone, Copy)]
pub struct TriggerBinding {
    pub node_ref: NodeRef<html::Button>,
    pub on_click: Callback<MouseEvent>,
}

/// Binding for the enclosing `Popover`'s trigger. Call inside its children.
pub fn use_popover_trigger() -> Option<TriggerBinding> {
    let ctx = use_popover()?;
    let node_ref = ctx.trigger;
    let on_click = Callback::new(move |ev: MouseEvent| {
        let trigger = ctx.trigger_ref();
        ctx.with_controller(|c| {
            c.activate(&BrowserEvent(&ev), &trigger);
        });
    });
    Some(TriggerBinding { node_ref, on_click })
}

#[component]
pub fn PopoverTrigger(
    #[prop(optional, into)] label: Option<String>,
    #[prop(optional, into)] class: String,
    children: Children,
) -> impl IntoView {
    let binding = use_popover_trigger();
    let node_ref = binding
        .map(|b| b.node_ref)
        .unwrap_or_else(create_node_ref::<html::Button>);
    let on_click = move |ev: MouseEvent| {
        if let Some(binding) = binding {
            binding.on_click.call(ev);
        }
    };
    view! {
        <button type="button" class=class aria-label=label node_ref=node_ref on:click=on_click>
            {children()}
        </button>
    }
}

/// Floating content. Renders nothing until a position is known.
#[component]
pub fn PopoverContent(
    #[prop(optional, into)] class: String,
    children: ChildrenFn,
) -> impl IntoView {
    let Some(ctx) = use_popover() else {
        return ().into_view();
    };
    let content_ref = create_node_ref::<html::Div>();
    let listeners = Rc::new(DismissListeners::new(ctx.clone(), content_ref));
    {
        let listeners = Rc::clone(&listeners);
        let open = ctx.open;
        create_effect(move |_| {
            if open.get() {
                listeners.attach();
            } else {
                listeners.detach();
            }
        });
    }
    on_cleanup(move || listeners.detach());

    let class = format!("popover-content {class}");
    let plan = ctx.plan;
    // Only a change of mount target rebuilds the subtree; position updates
    // land on the style attribute.
    let target = create_memo(move |_| match plan.get() {
        RenderPlan::Hidden => None,
        RenderPlan::Inline(_) => Some(false),
        RenderPlan::Portal(_) => Some(true),
    });
    let style = {
        let ctx = ctx.clone();
        move || {
            plan.with(|p| match p {
                RenderPlan::Hidden => String::new(),
                RenderPlan::Inline(s) => match ctx.inline_origin() {
                    Some((left, top)) => s.relative_to(left, top).to_css(),
                    None => s.to_css(),
                },
                RenderPlan::Portal(s) => s.to_css(),
            })
        }
    };
    (move || {
        let Some(portal) = target.get() else {
            return ().into_view();
        };
        let class = class.clone();
        let style = style.clone();
        let children = children.clone();
        let content = move || {
            view! {
                <div node_ref=content_ref class=class.clone() style=style.clone() data-popover-content="">
                    {children()}
                </div>
            }
        };
        let root = if portal {
            overlay_shell::services()
                .ok()
                .and_then(|s| s.overlay_root().ok())
        } else {
            None
        };
        match root {
            Some(root) => {
                let mount: web_sys::Element = root.into();
                view! { <Portal mount=mount>{content()}</Portal> }.into_view()
            }
            None => content().into_view(),
        }
    })
    .into_view()
}
