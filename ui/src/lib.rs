pub mod app;
#[cfg(target_arch = "wasm32")]
pub mod chart;
#[cfg(target_arch = "wasm32")]
pub mod popover;
#[cfg(target_arch = "wasm32")]
pub mod state;
pub mod theme;

pub use app::App;

#[cfg(all(feature = "csr", target_arch = "wasm32"))]
use leptos::*;
#[cfg(all(feature = "csr", target_arch = "wasm32"))]
use wasm_bindgen::prelude::*;

#[cfg(all(feature = "csr", target_arch = "wasm32"))]
#[wasm_bindgen]
pub fn start() {
    console_error_panic_hook::set_once();
    overlay_shell::services::init_overlay_logging("info");
    leptos::mount_to_body(|| view! { <App/> });
}
