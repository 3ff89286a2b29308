use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use overlay_core::{OverlayConfig, OverlayServices};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::dom::WebDocument;
use crate::logging;

pub type WebServices = OverlayServices<WebDocument>;

thread_local! {
    static PENDING_CONFIG: RefCell<Option<OverlayConfig>> = const { RefCell::new(None) };
    static SERVICES: OnceCell<Rc<WebServices>> = const { OnceCell::new() };
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// The page's overlay services, created on first use.
pub fn services() -> Result<Rc<WebServices>, JsValue> {
    SERVICES.with(|cell| {
        if let Some(existing) = cell.get() {
            return Ok(Rc::clone(existing));
        }
        let config = PENDING_CONFIG
            .with(|pending| pending.borrow_mut().take())
            .unwrap_or_default();
        let created = Rc::new(OverlayServices::new(WebDocument::from_window()?, config));
        let _ = cell.set(Rc::clone(&created));
        Ok(created)
    })
}

/// Replace the default config. Only honoured before the first overlay is
/// created.
#[wasm_bindgen]
pub fn configure_overlays(json: &str) -> Result<(), JsValue> {
    let config = OverlayConfig::from_json(json).map_err(to_js)?;
    if SERVICES.with(|cell| cell.get().is_some()) {
        return Err(JsValue::from_str("overlay services already initialized"));
    }
    PENDING_CONFIG.with(|pending| *pending.borrow_mut() = Some(config));
    Ok(())
}

#[wasm_bindgen]
pub fn overlay_root() -> Result<HtmlElement, JsValue> {
    services()?.overlay_root().map_err(to_js)
}

#[wasm_bindgen]
pub fn acquire_scroll_lock() -> Result<(), JsValue> {
    services()?.scroll_lock().acquire();
    Ok(())
}

#[wasm_bindgen]
pub fn release_scroll_lock() -> Result<(), JsValue> {
    services()?.scroll_lock().release();
    Ok(())
}

#[wasm_bindgen]
pub fn scroll_lock_count() -> Result<u32, JsValue> {
    Ok(services()?.scroll_lock().count() as u32)
}

/// Guard counters and recent notes as JSON.
#[wasm_bindgen]
pub fn overlay_guard_stats() -> Result<String, JsValue> {
    services()?.guard_stats_json().map_err(to_js)
}

#[wasm_bindgen]
pub fn init_overlay_logging(level: &str) -> bool {
    logging::init(logging::parse_level(level))
}
