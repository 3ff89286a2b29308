use leptos::*;

use crate::popover::{use_popover_trigger, Popover, PopoverContent};

/// Round "i" button bound to the enclosing popover.
#[component]
fn InfoButton(label: String) -> impl IntoView {
    let Some(binding) = use_popover_trigger() else {
        return ().into_view();
    };
    view! {
        <button
            type="button"
            class="chart-info-trigger"
            aria-label=label
            node_ref=binding.node_ref
            on:click=move |ev| binding.on_click.call(ev)
        >
            <span class="chart-info-glyph">"i"</span>
        </button>
    }
    .into_view()
}

/// The "i" bubble next to a chart title explaining what the chart shows.
#[component]
pub fn ChartInfo(#[prop(into)] title: String, children: ChildrenFn) -> impl IntoView {
    let label = format!("About {title}");
    view! {
        <Popover portal=true>
            <InfoButton label=label/>
            <PopoverContent class="chart-info-card">
                <h4 class="chart-info-title">{title.clone()}</h4>
                <div class="chart-info-body">{children()}</div>
            </PopoverContent>
        </Popover>
    }
}

/// Card frame used by every dashboard chart.
#[component]
pub fn ChartCard(
    #[prop(into)] title: String,
    #[prop(into)] info: String,
    children: Children,
) -> impl IntoView {
    let heading = title.clone();
    view! {
        <section class="chart-card">
            <header class="chart-card-header">
                <span class="chart-card-title">{heading}</span>
                <ChartInfo title=title>
                    <p>{info.clone()}</p>
                </ChartInfo>
            </header>
            <div class="chart-card-body">{children()}</div>
        </section>
    }
}
