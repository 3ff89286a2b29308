//! Browser backend for `overlay-core`: the `web_sys` document host, the
//! per-page service singleton and its `wasm_bindgen` surface.

pub mod logging;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod services;

#[cfg(target_arch = "wasm32")]
pub use dom::{BrowserEvent, ElementTrigger, WebDocument};
#[cfg(target_arch = "wasm32")]
pub use services::{services, WebServices};
