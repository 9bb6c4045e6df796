//! Per-visualization view state and the rebuild pipeline behind it.
//!
//! A [`ControlPanel`] owns one raw payload for its whole life. The payload is normalized once;
//! every state change (chart kind, series visibility, stacked flag) rebuilds the dataset and the
//! rendered description from that cached table.

use crate::dataset::{ChartDataset, SeriesVisibility, build, palette_color};
use crate::export;
use crate::models::VisualizationPayload;
use crate::normalize::{NormalizedTable, normalize};
use crate::viz::{ChartKind, RenderOptions, Rendered, render};

/// The only mutable state of a visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub chart_kind: ChartKind,
    pub visibility: SeriesVisibility,
    pub stacked: bool,
}

/// One row of the series picker.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub visible: bool,
    /// Swatch by original position, independent of which series are hidden.
    pub swatch: &'static str,
}

#[derive(Debug, Clone)]
pub struct ControlPanel {
    raw: VisualizationPayload,
    table: NormalizedTable,
    state: ViewState,
    dataset: ChartDataset,
    rendered: Rendered,
}

impl ControlPanel {
    /// Start with the hinted kind (or `bar`), every series visible, not stacked.
    pub fn new(raw: VisualizationPayload, hint: Option<&str>) -> Self {
        let table = normalize(&raw);
        let state = ViewState {
            chart_kind: ChartKind::from_hint(hint),
            visibility: SeriesVisibility::from_labels(raw.values.iter().map(|s| s.label.as_str())),
            stacked: false,
        };
        let dataset = build(&table, &state.visibility, state.chart_kind);
        let rendered = render(&dataset, state.chart_kind, &RenderOptions::stacked(state.stacked));
        Self {
            raw,
            table,
            state,
            dataset,
            rendered,
        }
    }

    pub fn select_chart_kind(&mut self, kind: ChartKind) {
        self.state.chart_kind = kind;
        self.rebuild();
    }

    /// Flip one series. Returns its new visibility.
    pub fn toggle_series(&mut self, label: &str) -> bool {
        let visible = self.state.visibility.toggle(label);
        self.rebuild();
        visible
    }

    /// The flag survives kind changes; only bar kinds read it.
    pub fn toggle_stacked(&mut self) -> bool {
        self.state.stacked = !self.state.stacked;
        self.rebuild();
        self.state.stacked
    }

    fn rebuild(&mut self) {
        log::debug!(
            "rebuild: kind={} stacked={}",
            self.state.chart_kind,
            self.state.stacked
        );
        self.dataset = build(&self.table, &self.state.visibility, self.state.chart_kind);
        self.rendered = render(
            &self.dataset,
            self.state.chart_kind,
            &RenderOptions::stacked(self.state.stacked),
        );
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn chart_kind(&self) -> ChartKind {
        self.state.chart_kind
    }

    pub fn stacked(&self) -> bool {
        self.state.stacked
    }

    /// Whether the stacked toggle should be offered for the current kind.
    pub fn stacked_available(&self) -> bool {
        self.state.chart_kind == ChartKind::Bar
    }

    pub fn raw(&self) -> &VisualizationPayload {
        &self.raw
    }

    pub fn table(&self) -> &NormalizedTable {
        &self.table
    }

    pub fn dataset(&self) -> &ChartDataset {
        &self.dataset
    }

    pub fn rendered(&self) -> &Rendered {
        &self.rendered
    }

    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        self.raw
            .values
            .iter()
            .enumerate()
            .map(|(i, s)| LegendEntry {
                label: s.label.clone(),
                visible: self.state.visibility.is_visible(&s.label),
                swatch: palette_color(i),
            })
            .collect()
    }

    /// CSV of the original payload; view state has no effect.
    pub fn export_csv(&self) -> String {
        export::export_csv(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Series;

    fn panel(hint: Option<&str>) -> ControlPanel {
        ControlPanel::new(
            VisualizationPayload::new(
                vec!["Q1".into(), "Q2".into()],
                vec![
                    Series::new("North", vec![1.0, 2.0]),
                    Series::new("South", vec![3.0, 4.0]),
                ],
            ),
            hint,
        )
    }

    #[test]
    fn initial_state_follows_hint() {
        let p = panel(Some("line"));
        assert_eq!(p.chart_kind(), ChartKind::Line);
        assert!(!p.stacked());
        assert!(p.legend_entries().iter().all(|e| e.visible));
        assert_eq!(panel(Some("radar")).chart_kind(), ChartKind::Bar);
    }

    #[test]
    fn stacked_flag_survives_kind_changes() {
        let mut p = panel(None);
        assert!(p.stacked_available());
        assert!(p.toggle_stacked());
        p.select_chart_kind(ChartKind::Line);
        assert!(!p.stacked_available());
        assert!(p.stacked());
        p.select_chart_kind(ChartKind::HorizontalBar);
        let scales = p.rendered().chart().unwrap().options.scales.clone().unwrap();
        assert!(scales.x.stacked && scales.y.stacked);
    }

    #[test]
    fn legend_swatches_ignore_filtering() {
        let mut p = panel(None);
        assert!(!p.toggle_series("North"));
        let entries = p.legend_entries();
        assert_eq!(entries[0].swatch, "#8884d8");
        assert!(!entries[0].visible);
        assert_eq!(entries[1].swatch, "#82ca9d");
        assert_eq!(p.dataset().dataset_count(), 1);
    }

    #[test]
    fn export_ignores_view_state() {
        let mut p = panel(None);
        let before = p.export_csv();
        p.toggle_series("South");
        p.select_chart_kind(ChartKind::Pie);
        assert_eq!(p.export_csv(), before);
        assert_eq!(before, "label,North,South\nQ1,1,3\nQ2,2,4");
    }
}
