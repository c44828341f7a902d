//! Leptos bindings: a reactive hydration flag and small status components.

use leptos::prelude::*;

use crate::page::{ChunkState, ChunkStatus};

/// Reactive hydration flag for a component.
///
/// Starts `false` and flips to `true` inside an effect. Effects only run in
/// an interactive client, so during server rendering the flag stays `false`.
pub fn use_hydration(unit: &str) -> ReadSignal<bool> {
    let hydrated = RwSignal::new(false);
    let unit = unit.to_string();
    Effect::new(move |_| {
        if !hydrated.get_untracked() {
            tracing::debug!(unit = %unit, "Component hydrated");
            hydrated.set(true);
        }
    });
    hydrated.read_only()
}

/// Badge text for a hydration flag.
pub fn badge_label(hydrated: bool) -> &'static str {
    if hydrated {
        "Hydrated & Interactive"
    } else {
        "SSR Only"
    }
}

fn chunk_class(state: ChunkState) -> &'static str {
    match state {
        ChunkState::Loaded => "chunk chunk--loaded",
        ChunkState::Loading => "chunk chunk--loading",
        ChunkState::NotLoaded => "chunk chunk--not-loaded",
    }
}

/// Shows whether the surrounding component is interactive yet.
#[component]
pub fn HydrationBadge(#[prop(into)] unit: String) -> impl IntoView {
    let hydrated = use_hydration(&unit);

    let class = move || {
        if hydrated.get() {
            "hydration-badge hydration-badge--active"
        } else {
            "hydration-badge hydration-badge--pending"
        }
    };

    view! {
        <span class=class data-unit=unit>
            {move || badge_label(hydrated.get())}
        </span>
    }
}

/// Per-island chunk status table.
#[component]
pub fn ChunkReport(report: Vec<ChunkStatus>) -> impl IntoView {
    view! {
        <table class="chunk-report">
            <thead>
                <tr>
                    <th>"Island"</th>
                    <th>"Trigger"</th>
                    <th>"Chunk"</th>
                    <th>"Hydration"</th>
                </tr>
            </thead>
            <tbody>
                {report
                    .into_iter()
                    .map(|row| {
                        view! {
                            <tr class=chunk_class(row.chunk)>
                                <td>{row.title}</td>
                                <td>{row.trigger}</td>
                                <td>{row.chunk.to_string()}</td>
                                <td>{row.hydration}</td>
                            </tr>
                        }
                    })
                    .collect_view()}
            </tbody>
        </table>
    }
}
