use leptos::*;

#[cfg(target_arch = "wasm32")]
use crate::{
    chart::ChartCard,
    popover::{Popover, PopoverContent, PopoverTrigger},
    theme::GLOBAL_CSS,
};
#[cfg(target_arch = "wasm32")]
use leptos_meta::*;

/// Date ranges offered by the dashboard toolbar.
pub const DATE_RANGES: [(&str, &str); 4] = [
    ("7d", "Last 7 days"),
    ("30d", "Last 30 days"),
    ("90d", "Last 90 days"),
    ("12m", "Last 12 months"),
];

pub fn range_label(key: &str) -> &'static str {
    DATE_RANGES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
        .unwrap_or("Custom range")
}

#[cfg(not(target_arch = "wasm32"))]
#[component]
pub fn App() -> impl IntoView {
    view! { <div>UI available in browser build.</div> }
}

#[cfg(target_arch = "wasm32")]
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let (range, set_range) = create_signal("30d".to_string());

    view! {
        <Style>{GLOBAL_CSS}</Style>
        <div class="dashboard-toolbar">
            // A menu long enough to scroll on phones, so it holds the scroll lock.
            <Popover portal=true lock_scroll=true>
                <PopoverTrigger class="range-picker">
                    {move || range_label(&range.get())}
                </PopoverTrigger>
                <PopoverContent class="range-menu">
                    {DATE_RANGES
                        .iter()
                        .map(|(key, label)| {
                            let key = key.to_string();
                            view! {
                                <button
                                    type="button"
                                    class="range-option"
                                    on:click=move |_| set_range.set(key.clone())
                                >
                                    {*label}
                                </button>
                            }
                        })
                        .collect_view()}
                </PopoverContent>
            </Popover>
        </div>
        <main class="dashboard">
            <ChartCard title="Revenue" info="Gross revenue per day in the selected store's currency.">
                <p>{move || format!("Revenue, {}", range_label(&range.get()).to_lowercase())}</p>
            </ChartCard>
            <ChartCard title="Orders" info="Completed orders per day; refunds are excluded.">
                <p>{move || format!("Orders, {}", range_label(&range.get()).to_lowercase())}</p>
            </ChartCard>
            <ChartCard title="Returning customers" info="Share of orders placed by customers with a previous purchase.">
                <p>"Returning customer share"</p>
            </ChartCard>
        </main>
    }
}
