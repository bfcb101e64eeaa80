//! Serializable snapshot of the grouping tree, for reports and debugging.

use crate::grouping::container::{ParameterContainer, WidgetKind};

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct WidgetView {
    pub address: String,
    pub label: String,
    pub style: String,
    pub order: f64,
    /// None for headers.
    pub value_address: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub menu_labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub address: String,
    pub label: String,

    /// Widgets sorted by display order, then address.
    pub widgets: Vec<WidgetView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerView {
    pub address: String,
    pub path: String,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupingView {
    pub containers: Vec<ContainerView>,
    pub totals: TotalsView,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TotalsView {
    pub containers: usize,
    pub sections: usize,
    pub widgets: usize,
}

pub fn build_grouping_view<'a>(
    containers: impl IntoIterator<Item = &'a ParameterContainer>,
) -> GroupingView {
    let mut totals = TotalsView::default();
    let mut views = Vec::new();

    for container in containers {
        let mut sections = Vec::new();
        for section in container.sections() {
            let mut widgets: Vec<WidgetView> = section
                .widgets
                .iter()
                .filter_map(|addr| container.widget(addr.as_str()))
                .map(|w| {
                    let (min, max, menu_labels) = match &w.kind {
                        WidgetKind::Slider { min, max } => (*min, *max, Vec::new()),
                        WidgetKind::Menu { labels } => (None, None, labels.clone()),
                        WidgetKind::Header | WidgetKind::Toggle => (None, None, Vec::new()),
                    };
                    WidgetView {
                        address: w.address.to_string(),
                        label: w.label.clone(),
                        style: w.style.to_string(),
                        order: w.order,
                        value_address: w.value_address().map(|a| a.to_string()),
                        min,
                        max,
                        menu_labels,
                    }
                })
                .collect();

            // Sort by display order, then address (stable, deterministic).
            widgets.sort_by(|a, b| {
                a.order
                    .partial_cmp(&b.order)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.address.cmp(&b.address))
            });

            totals.widgets += widgets.len();
            sections.push(SectionView {
                address: section.address.to_string(),
                label: section.label.clone(),
                widgets,
            });
        }

        totals.sections += sections.len();
        views.push(ContainerView {
            address: container.address().to_string(),
            path: container.path().to_string(),
            sections,
        });
    }

    totals.containers = views.len();
    GroupingView {
        containers: views,
        totals,
    }
}
