//! Public types and constants for the visualization module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chart kinds this crate can render. Wire names: `bar`, `horizontal_bar`, `line`, `pie`, `scatter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Vertical bars, grouped or stacked (default).
    #[default]
    Bar,
    /// Bars along the y index axis.
    HorizontalBar,
    /// One line per series over the label axis.
    Line,
    /// One slice per label, taken from the first visible series.
    Pie,
    /// Index-vs-value, or first-vs-second visible series.
    Scatter,
}

impl ChartKind {
    pub const ALL: [Self; 5] = [
        Self::Bar,
        Self::HorizontalBar,
        Self::Line,
        Self::Pie,
        Self::Scatter,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::HorizontalBar => "horizontal_bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Scatter => "scatter",
        }
    }

    /// Human-readable name for selectors.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Bar => "Bar",
            Self::HorizontalBar => "Horizontal Bar",
            Self::Line => "Line",
            Self::Pie => "Pie",
            Self::Scatter => "Scatter",
        }
    }

    /// Initial kind from an upstream suggestion: `bar` when absent or unsupported.
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint.map(str::trim).filter(|h| !h.is_empty()) {
            None => Self::default(),
            Some(h) => h.parse().unwrap_or_else(|e: UnsupportedKind| {
                log::debug!("{e}; falling back to {}", Self::default());
                Self::default()
            }),
        }
    }

    /// Kinds whose axes honour the stacked flag.
    pub fn is_bar(self) -> bool {
        matches!(self, Self::Bar | Self::HorizontalBar)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = UnsupportedKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnsupportedKind(s.to_string()))
    }
}

/// A chart kind string outside [`ChartKind`]; carries the offending value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported visualization type: {0}")]
pub struct UnsupportedKind(pub String);

/// Which axis carries the categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexAxis {
    #[default]
    X,
    Y,
}

/// Display options passed alongside a built dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Stack bars instead of grouping them. Only bar kinds read it.
    #[serde(default)]
    pub stacked: bool,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    CHART_HEIGHT_PX
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            stacked: false,
            width: default_width(),
            height: default_height(),
        }
    }
}

impl RenderOptions {
    pub fn stacked(stacked: bool) -> Self {
        Self {
            stacked,
            ..Self::default()
        }
    }
}

/// Fixed chart container height.
pub const CHART_HEIGHT_PX: u32 = 420;
/// Axis tick label color.
pub const TICK_COLOR: &str = "#9ca3af";
/// X tick label rotation bounds in degrees.
pub const X_TICK_MIN_ROTATION: u32 = 0;
pub const X_TICK_MAX_ROTATION: u32 = 45;
/// Legend placement. Not data-dependent.
pub const LEGEND_POSITION: &str = "top";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for k in ChartKind::ALL {
            assert_eq!(k.as_str().parse::<ChartKind>(), Ok(k));
        }
    }

    #[test]
    fn unknown_kind_carries_name() {
        let err = "radar".parse::<ChartKind>().unwrap_err();
        assert_eq!(err, UnsupportedKind("radar".into()));
        assert_eq!(err.to_string(), "Unsupported visualization type: radar");
    }

    #[test]
    fn hint_falls_back_to_bar() {
        assert_eq!(ChartKind::from_hint(None), ChartKind::Bar);
        assert_eq!(ChartKind::from_hint(Some("")), ChartKind::Bar);
        assert_eq!(ChartKind::from_hint(Some("table")), ChartKind::Bar);
        assert_eq!(ChartKind::from_hint(Some(" pie ")), ChartKind::Pie);
    }
}
