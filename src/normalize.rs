//! Series normalization: align labels and series into a rectangular table.
//!
//! Upstream payloads routinely disagree on lengths (a label list of 3 and a series of 4, or two
//! series of different lengths). Every renderer in this crate consumes a [`NormalizedTable`],
//! which can only be obtained through [`normalize`], so its shape never has to be re-checked.

use crate::models::{Series, VisualizationPayload};
use serde::{Deserialize, Serialize};

/// Why a table has nothing to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The payload carried no labels.
    NoLabels,
    /// The payload carried labels but no series.
    NoSeries,
}

impl EmptyReason {
    /// Notice shown in place of a chart.
    pub fn notice(self) -> &'static str {
        match self {
            EmptyReason::NoLabels => "No data to visualize",
            EmptyReason::NoSeries => "No series to visualize",
        }
    }
}

/// One series of a [`NormalizedTable`]: holes resolved, padded to the table length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSeries {
    pub label: String,
    pub data: Vec<f64>,
}

/// Rectangular label/series table. `labels.len() == series[i].data.len()` for every `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    labels: Vec<String>,
    series: Vec<TableSeries>,
    empty: Option<EmptyReason>,
}

impl NormalizedTable {
    /// The empty sentinel.
    pub fn empty(reason: EmptyReason) -> Self {
        Self {
            labels: Vec::new(),
            series: Vec::new(),
            empty: Some(reason),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn series(&self) -> &[TableSeries] {
        &self.series
    }

    /// Common row length `L`.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.empty.is_some()
    }

    /// Set when this is the empty sentinel.
    pub fn empty_reason(&self) -> Option<EmptyReason> {
        self.empty
    }

    /// Rebuild a payload from the table (e.g. to feed it through `normalize` again).
    pub fn to_payload(&self) -> VisualizationPayload {
        VisualizationPayload::new(
            self.labels.clone(),
            self.series
                .iter()
                .map(|s| Series::new(s.label.clone(), s.data.clone()))
                .collect(),
        )
    }
}

/// Pad labels with `""` and series data with `0` up to
/// `L = max(labels.len(), longest series)`. Holes in the data become `0` as well.
/// Never truncates, never fails.
pub fn normalize(raw: &VisualizationPayload) -> NormalizedTable {
    if raw.labels.is_empty() {
        return NormalizedTable::empty(EmptyReason::NoLabels);
    }
    if raw.values.is_empty() {
        return NormalizedTable::empty(EmptyReason::NoSeries);
    }

    let len = raw
        .values
        .iter()
        .map(|s| s.data.len())
        .chain(std::iter::once(raw.labels.len()))
        .max()
        .unwrap_or(0);

    let mut labels = raw.labels.clone();
    labels.resize(len, String::new());

    let series = raw
        .values
        .iter()
        .map(|s| {
            let mut data: Vec<f64> = s.data.iter().map(|v| v.unwrap_or(0.0)).collect();
            data.resize(len, 0.0);
            TableSeries {
                label: s.label.clone(),
                data,
            }
        })
        .collect();

    NormalizedTable {
        labels,
        series,
        empty: None,
    }
}
