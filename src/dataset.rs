//! Chart-ready datasets: filter visible series, assign palette colors, shape per chart kind.

use crate::normalize::{EmptyReason, NormalizedTable, TableSeries};
use crate::viz::types::{ChartKind, IndexAxis};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Series palette. Colors are assigned by position *after* visibility filtering.
pub const PALETTE: [&str; 10] = [
    "#8884d8", "#82ca9d", "#ffc658", "#ff7300", "#a4de6c", "#d0ed57", "#83a6ed", "#8dd1e1",
    "#82ca9d", "#c49c94",
];

/// Get a color from the palette.
#[inline]
pub fn palette_color(idx: usize) -> &'static str {
    PALETTE[idx % PALETTE.len()]
}

/// Per-series visibility, keyed by series label. Unknown labels count as hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesVisibility(AHashMap<String, bool>);

impl SeriesVisibility {
    /// Every series visible.
    pub fn all_visible(series: &[TableSeries]) -> Self {
        Self::from_labels(series.iter().map(|s| s.label.as_str()))
    }

    /// Every listed label visible.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        Self(labels.into_iter().map(|l| (l.to_string(), true)).collect())
    }

    pub fn is_visible(&self, label: &str) -> bool {
        self.0.get(label).copied().unwrap_or(false)
    }

    pub fn set(&mut self, label: &str, visible: bool) {
        self.0.insert(label.to_string(), visible);
    }

    /// Flip one label; returns the new state.
    pub fn toggle(&mut self, label: &str) -> bool {
        let entry = self.0.entry(label.to_string()).or_insert(false);
        *entry = !*entry;
        *entry
    }
}

/// One dataset for bar, horizontal bar, and line charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDataset {
    pub label: String,
    pub data: Vec<f64>,
    pub background_color: String,
    pub border_color: String,
    pub border_width: u32,
}

/// The single pie dataset: one color per label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieDataset {
    pub label: String,
    pub data: Vec<f64>,
    pub background_color: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterDataset {
    pub label: String,
    pub data: Vec<ScatterPoint>,
    pub background_color: String,
}

/// Output of [`build`]. The shape differs per chart kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ChartDataset {
    /// Bar, horizontal bar, and line: one dataset per visible series.
    Series {
        labels: Vec<String>,
        datasets: Vec<SeriesDataset>,
        index_axis: IndexAxis,
    },
    /// `dataset` is `None` (and `labels` empty) when no series is visible.
    Pie {
        labels: Vec<String>,
        dataset: Option<PieDataset>,
    },
    /// `None` when no series is visible.
    Scatter { dataset: Option<ScatterDataset> },
    /// The normalized table was the empty sentinel.
    NoData { reason: EmptyReason },
}

impl ChartDataset {
    /// Number of drawable datasets.
    pub fn dataset_count(&self) -> usize {
        match self {
            ChartDataset::Series { datasets, .. } => datasets.len(),
            ChartDataset::Pie { dataset, .. } => dataset.iter().count(),
            ChartDataset::Scatter { dataset } => dataset.iter().count(),
            ChartDataset::NoData { .. } => 0,
        }
    }
}

/// Build the chart-ready dataset for `kind` from the visible series of `table`.
pub fn build(
    table: &NormalizedTable,
    visibility: &SeriesVisibility,
    kind: ChartKind,
) -> ChartDataset {
    if let Some(reason) = table.empty_reason() {
        return ChartDataset::NoData { reason };
    }

    let visible: Vec<&TableSeries> = table
        .series()
        .iter()
        .filter(|s| visibility.is_visible(&s.label))
        .collect();
    log::debug!(
        "building {kind} dataset: {}/{} series visible, {} rows",
        visible.len(),
        table.series().len(),
        table.len()
    );

    match kind {
        ChartKind::Bar | ChartKind::HorizontalBar | ChartKind::Line => {
            let index_axis = if kind == ChartKind::HorizontalBar {
                IndexAxis::Y
            } else {
                IndexAxis::X
            };
            ChartDataset::Series {
                labels: table.labels().to_vec(),
                datasets: series_datasets(&visible),
                index_axis,
            }
        }
        ChartKind::Pie => pie_dataset(table.labels(), &visible),
        ChartKind::Scatter => ChartDataset::Scatter {
            dataset: scatter_dataset(&visible),
        },
    }
}

fn series_datasets(visible: &[&TableSeries]) -> Vec<SeriesDataset> {
    visible
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let color = palette_color(idx).to_string();
            SeriesDataset {
                label: s.label.clone(),
                data: s.data.clone(),
                border_color: color.clone(),
                background_color: color,
                border_width: 1,
            }
        })
        .collect()
}

fn pie_dataset(labels: &[String], visible: &[&TableSeries]) -> ChartDataset {
    match visible.first() {
        None => ChartDataset::Pie {
            labels: Vec::new(),
            dataset: None,
        },
        Some(first) => ChartDataset::Pie {
            labels: labels.to_vec(),
            dataset: Some(PieDataset {
                label: first.label.clone(),
                data: first.data.clone(),
                background_color: (0..labels.len())
                    .map(|i| palette_color(i).to_string())
                    .collect(),
            }),
        },
    }
}

// Pairs only the first two visible series; any further ones are ignored.
fn scatter_dataset(visible: &[&TableSeries]) -> Option<ScatterDataset> {
    match visible {
        [] => None,
        [only] => Some(ScatterDataset {
            label: only.label.clone(),
            data: only
                .data
                .iter()
                .enumerate()
                .map(|(i, v)| ScatterPoint { x: i as f64, y: *v })
                .collect(),
            background_color: palette_color(0).to_string(),
        }),
        [a, b, ..] => Some(ScatterDataset {
            label: format!("{} vs {}", a.label, b.label),
            data: a
                .data
                .iter()
                .enumerate()
                .map(|(i, x)| ScatterPoint {
                    x: *x,
                    y: b.data.get(i).copied().unwrap_or(0.0),
                })
                .collect(),
            background_color: palette_color(0).to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Series, VisualizationPayload};
    use crate::normalize::normalize;

    fn table() -> NormalizedTable {
        normalize(&VisualizationPayload::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                Series::new("A", vec![1.0, 2.0, 3.0]),
                Series::new("B", vec![10.0, 20.0]),
                Series::new("C", vec![5.0, 5.0, 5.0]),
            ],
        ))
    }

    #[test]
    fn toggle_flips_and_unknown_is_hidden() {
        let t = table();
        let mut vis = SeriesVisibility::all_visible(t.series());
        assert!(vis.is_visible("A"));
        assert!(!vis.toggle("A"));
        assert!(vis.toggle("A"));
        assert!(!vis.is_visible("nope"));
    }

    #[test]
    fn horizontal_bar_sets_index_axis() {
        let t = table();
        let vis = SeriesVisibility::all_visible(t.series());
        match build(&t, &vis, ChartKind::HorizontalBar) {
            ChartDataset::Series { index_axis, datasets, .. } => {
                assert_eq!(index_axis, IndexAxis::Y);
                assert_eq!(datasets.len(), 3);
                assert!(datasets.iter().all(|d| d.border_width == 1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scatter_ignores_third_series() {
        let t = table();
        let vis = SeriesVisibility::all_visible(t.series());
        let ChartDataset::Scatter { dataset: Some(ds) } = build(&t, &vis, ChartKind::Scatter) else {
            panic!("expected scatter dataset");
        };
        assert_eq!(ds.label, "A vs B");
        assert_eq!(ds.data.len(), 3);
        assert_eq!(ds.data[2], ScatterPoint { x: 3.0, y: 0.0 });
    }

    #[test]
    fn serializes_with_chartjs_field_names() {
        let t = table();
        let vis = SeriesVisibility::all_visible(t.series());
        let v = serde_json::to_value(build(&t, &vis, ChartKind::Line)).unwrap();
        assert_eq!(v["shape"], "series");
        assert_eq!(v["datasets"][0]["backgroundColor"], "#8884d8");
        assert_eq!(v["index_axis"], "x");
    }
}
