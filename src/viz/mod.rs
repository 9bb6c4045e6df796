//! Chart rendering: turn a built [`ChartDataset`] into a chart description, and draw that
//! description to **SVG**, **PNG**, or an in-memory RGB buffer.
//!
//! - Five kinds: `bar`, `horizontal_bar`, `line`, `pie`, `scatter`
//! - Unknown kind names and empty tables produce explicit notices, never a blank chart
//! - Fixed presentation: legend on top, no title, gray tick labels, 420 px tall container

pub mod legend;
pub mod types;
pub mod util;

// Re-export types for public API
pub use types::{ChartKind, IndexAxis, RenderOptions, UnsupportedKind};

use crate::dataset::{ChartDataset, PieDataset, ScatterDataset, SeriesDataset, palette_color};
use crate::normalize::EmptyReason;
use anyhow::{Result, anyhow};
use serde::Serialize;

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::LineSeries;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;
use std::sync::Once;

use legend::{draw_legend, legend_height_px};
use types::{LEGEND_POSITION, TICK_COLOR, X_TICK_MAX_ROTATION, X_TICK_MIN_ROTATION};
use util::{category_tick, format_value_tick, hex_color, truncate_to_width, value_range};

/// One-time registration for a fallback "sans-serif" font when using the `ab_glyph` text path.
/// Required because `ab_glyph` doesn't discover OS fonts.
static INIT_FONTS: Once = Once::new();

/// [`TICK_COLOR`] as a plotters color; text styles borrow it for `'static`.
static TICK_RGB: RGBColor = RGBColor(0x9c, 0xa3, 0xaf);

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let _ = plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
    });
}

/// Per-axis presentation options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisOptions {
    pub stacked: bool,
    pub tick_color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rotation: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rotation: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scales {
    pub x: AxisOptions,
    pub y: AxisOptions,
}

/// Display options of a rendered chart. Only `index_axis`, `stacked` and the aspect flag vary
/// with the chart kind; the rest are fixed defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub legend_position: &'static str,
    pub title_display: bool,
    pub index_axis: IndexAxis,
    /// `None` for pie charts, which have no axes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scales: Option<Scales>,
    pub height_px: u32,
}

/// A renderable chart: kind, chart-ready data, and display options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDescription {
    pub kind: ChartKind,
    pub data: ChartDataset,
    pub options: ChartOptions,
}

/// Outcome of [`render`]. Notices replace the chart; they are not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Chart(Box<ChartDescription>),
    NoData(EmptyReason),
    Unsupported(UnsupportedKind),
}

impl Rendered {
    pub fn chart(&self) -> Option<&ChartDescription> {
        match self {
            Rendered::Chart(c) => Some(c),
            _ => None,
        }
    }

    /// Text shown instead of a chart, if any.
    pub fn notice(&self) -> Option<String> {
        match self {
            Rendered::Chart(_) => None,
            Rendered::NoData(reason) => Some(reason.notice().to_string()),
            Rendered::Unsupported(e) => Some(e.to_string()),
        }
    }
}

/// Render `dataset` as `kind`. `dataset` is expected to have been built for the same kind.
pub fn render(dataset: &ChartDataset, kind: ChartKind, options: &RenderOptions) -> Rendered {
    if let ChartDataset::NoData { reason } = dataset {
        return Rendered::NoData(*reason);
    }

    let index_axis = if kind == ChartKind::HorizontalBar {
        IndexAxis::Y
    } else {
        IndexAxis::X
    };
    let stacked = options.stacked && kind.is_bar();
    let scales = (kind != ChartKind::Pie).then(|| Scales {
        x: AxisOptions {
            stacked,
            tick_color: TICK_COLOR,
            min_rotation: Some(X_TICK_MIN_ROTATION),
            max_rotation: Some(X_TICK_MAX_ROTATION),
        },
        y: AxisOptions {
            stacked,
            tick_color: TICK_COLOR,
            min_rotation: None,
            max_rotation: None,
        },
    });

    Rendered::Chart(Box::new(ChartDescription {
        kind,
        data: dataset.clone(),
        options: ChartOptions {
            responsive: true,
            maintain_aspect_ratio: kind == ChartKind::Pie,
            legend_position: LEGEND_POSITION,
            title_display: false,
            index_axis,
            scales,
            height_px: options.height,
        },
    }))
}

/// Like [`render`], but takes the kind's wire name. Unknown names yield
/// [`Rendered::Unsupported`] carrying the name.
pub fn render_named(dataset: &ChartDataset, kind: &str, options: &RenderOptions) -> Rendered {
    match kind.parse::<ChartKind>() {
        Ok(k) => render(dataset, k, options),
        Err(e) => {
            log::warn!("{e}");
            Rendered::Unsupported(e)
        }
    }
}

/// Draw `rendered` to `out_path`; `.svg` selects the SVG backend, anything else PNG.
pub fn plot_chart<P: AsRef<Path>>(
    rendered: &Rendered,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_rendered(root, rendered)?;
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_rendered(root, rendered)?;
    }
    log::debug!("wrote chart to {}", out_path.display());
    Ok(())
}

/// Draw `rendered` into an SVG document held in memory.
pub fn svg_string(rendered: &Rendered, width: u32, height: u32) -> Result<String> {
    ensure_fonts_registered();
    let mut out = String::new();
    {
        let root = SVGBackend::with_string(&mut out, (width, height)).into_drawing_area();
        draw_rendered(root, rendered)?;
    }
    Ok(out)
}

/// Draw `rendered` into a packed RGB8 buffer of `width * height * 3` bytes.
pub fn draw_rgb(rendered: &Rendered, width: u32, height: u32) -> Result<Vec<u8>> {
    ensure_fonts_registered();
    let mut buf = vec![0u8; (width as usize) * (height as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        draw_rendered(root, rendered)?;
    }
    Ok(buf)
}

/// Helper that draws to any Plotters backend.
fn draw_rendered<DB>(root: DrawingArea<DB, Shift>, rendered: &Rendered) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    match rendered {
        Rendered::Chart(desc) => draw_description(&root, desc)?,
        other => draw_notice(&root, &other.notice().unwrap_or_default())?,
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

fn draw_notice<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, text: &str) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    let style = TextStyle::from((FontFamily::SansSerif, 16))
        .color(&TICK_RGB)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(text, (w as i32 / 2, h as i32 / 2), style))
        .map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

fn legend_items(data: &ChartDataset) -> Vec<(String, RGBColor)> {
    match data {
        ChartDataset::Series { datasets, .. } => datasets
            .iter()
            .map(|d| (d.label.clone(), hex_color(&d.background_color)))
            .collect(),
        ChartDataset::Pie {
            labels,
            dataset: Some(ds),
        } => labels
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let color = ds
                    .background_color
                    .get(i)
                    .map(|c| hex_color(c))
                    .unwrap_or_else(|| hex_color(palette_color(i)));
                (l.clone(), color)
            })
            .collect(),
        ChartDataset::Scatter { dataset: Some(ds) } => {
            vec![(ds.label.clone(), hex_color(&ds.background_color))]
        }
        _ => Vec::new(),
    }
}

fn draw_description<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    desc: &ChartDescription,
) -> Result<()> {
    let (root_w, root_h) = root.dim_in_pixel();
    let items = legend_items(&desc.data);
    let labels: Vec<String> = items.iter().map(|(l, _)| l.clone()).collect();
    let legend_h = legend_height_px(&labels, root_w as i32).min(root_h as i32 / 2);

    let (legend_area, plot_area) = root.split_vertically(legend_h);
    if legend_h > 0 {
        draw_legend(&legend_area, &items)?;
    }

    let stacked = desc
        .options
        .scales
        .as_ref()
        .map(|s| s.y.stacked)
        .unwrap_or(false);

    match (&desc.data, desc.kind) {
        (ChartDataset::Series { labels, datasets, .. }, ChartKind::Line) => {
            draw_lines(&plot_area, labels, datasets)
        }
        (
            ChartDataset::Series {
                labels,
                datasets,
                index_axis,
            },
            _,
        ) => draw_bars(
            &plot_area,
            labels,
            datasets,
            *index_axis == IndexAxis::Y,
            stacked,
        ),
        (ChartDataset::Pie { labels, dataset }, _) => {
            draw_pie(&plot_area, labels.len(), dataset.as_ref())
        }
        (ChartDataset::Scatter { dataset }, _) => draw_scatter(&plot_area, dataset.as_ref()),
        (ChartDataset::NoData { reason }, _) => draw_notice(&plot_area, reason.notice()),
    }
}

fn tick_style() -> TextStyle<'static> {
    TextStyle::from((FontFamily::SansSerif, 12)).color(&TICK_RGB)
}

fn short_labels(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .map(|l| truncate_to_width(l, 12, 110))
        .collect()
}

fn category_range(n: usize) -> std::ops::Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

fn draw_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    labels: &[String],
    datasets: &[SeriesDataset],
    horizontal: bool,
    stacked: bool,
) -> Result<()> {
    let n_cat = labels.len();

    // Extent of the value axis: per-category sums when stacked, raw values otherwise.
    let extent: Vec<f64> = if stacked {
        (0..n_cat)
            .flat_map(|i| {
                let (pos, neg) = datasets.iter().filter_map(|d| d.data.get(i)).fold(
                    (0.0f64, 0.0f64),
                    |(p, n), v| if *v >= 0.0 { (p + v, n) } else { (p, n + v) },
                );
                [pos, neg]
            })
            .collect()
    } else {
        datasets.iter().flat_map(|d| d.data.iter().copied()).collect()
    };
    let (vmin, vmax) = value_range(extent, true);

    // Horizontal bars list the first category at the top.
    let cat_labels: Vec<String> = if horizontal {
        short_labels(labels).into_iter().rev().collect()
    } else {
        short_labels(labels)
    };
    let cat_pos = |i: usize| -> f64 {
        if horizontal {
            (n_cat - 1 - i) as f64
        } else {
            i as f64
        }
    };
    let cat_fmt = |v: &f64| category_tick(&cat_labels, *v);
    let val_fmt = |v: &f64| format_value_tick(*v);

    let (x_range, y_range) = if horizontal {
        (vmin..vmax, category_range(n_cat))
    } else {
        (category_range(n_cat), vmin..vmax)
    };

    let mut chart = ChartBuilder::on(area)
        .margin(16)
        .set_label_area_size(LabelAreaPosition::Left, if horizontal { 120 } else { 64 })
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| anyhow!("{:?}", e))?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.label_style(tick_style())
            .light_line_style(RGBColor(229, 231, 235).mix(0.5));
        if horizontal {
            mesh.y_labels(n_cat.max(1))
                .y_label_formatter(&cat_fmt)
                .x_labels(10)
                .x_label_formatter(&val_fmt)
                .disable_y_mesh();
        } else {
            mesh.x_labels(n_cat.max(1))
                .x_label_formatter(&cat_fmt)
                .y_labels(10)
                .y_label_formatter(&val_fmt)
                .disable_x_mesh();
        }
        mesh.draw().map_err(|e| anyhow!("{:?}", e))?;
    }

    let n_series = datasets.len().max(1);
    let group_width = 0.8f64;
    let bar_w = if stacked {
        group_width
    } else {
        group_width / n_series as f64
    };
    let mut pos_cum = vec![0.0f64; n_cat];
    let mut neg_cum = vec![0.0f64; n_cat];

    for (idx, ds) in datasets.iter().enumerate() {
        let color = hex_color(&ds.background_color);
        let mut rects = Vec::with_capacity(ds.data.len());
        for (i, v) in ds.data.iter().enumerate().take(n_cat) {
            let center = cat_pos(i);
            let (c0, c1) = if stacked {
                (center - group_width / 2.0, center + group_width / 2.0)
            } else {
                let c0 = center - group_width / 2.0 + idx as f64 * bar_w;
                (c0, c0 + bar_w)
            };
            let (v0, v1) = if stacked {
                let cum = if *v >= 0.0 {
                    &mut pos_cum[i]
                } else {
                    &mut neg_cum[i]
                };
                let base = *cum;
                *cum += v;
                (base, *cum)
            } else {
                (0.0f64.min(*v), 0.0f64.max(*v))
            };
            let corners = if horizontal {
                [(v0, c0), (v1, c1)]
            } else {
                [(c0, v0), (c1, v1)]
            };
            rects.push(Rectangle::new(corners, color.filled()));
        }
        chart
            .draw_series(rects)
            .map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}

fn draw_lines<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    labels: &[String],
    datasets: &[SeriesDataset],
) -> Result<()> {
    let n_cat = labels.len();
    let (vmin, vmax) = value_range(datasets.iter().flat_map(|d| d.data.iter().copied()), false);
    let cat_labels = short_labels(labels);
    let cat_fmt = |v: &f64| category_tick(&cat_labels, *v);
    let val_fmt = |v: &f64| format_value_tick(*v);

    let mut chart = ChartBuilder::on(area)
        .margin(16)
        .set_label_area_size(LabelAreaPosition::Left, 64)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(category_range(n_cat), vmin..vmax)
        .map_err(|e| anyhow!("{:?}", e))?;

    chart
        .configure_mesh()
        .x_labels(n_cat.max(1))
        .x_label_formatter(&cat_fmt)
        .y_labels(10)
        .y_label_formatter(&val_fmt)
        .label_style(tick_style())
        .light_line_style(RGBColor(229, 231, 235).mix(0.5))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    for ds in datasets {
        let color = hex_color(&ds.border_color);
        let pts: Vec<(f64, f64)> = ds
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect();
        let style = ShapeStyle {
            color: color.to_rgba(),
            filled: false,
            stroke_width: 2,
        };
        chart
            .draw_series(LineSeries::new(pts.clone(), style))
            .map_err(|e| anyhow!("{:?}", e))?;
        chart
            .draw_series(
                pts.iter()
                    .map(|(x, y)| Circle::new((*x, *y), 3, color.filled())),
            )
            .map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    dataset: Option<&ScatterDataset>,
) -> Result<()> {
    let points = dataset.map(|d| d.data.as_slice()).unwrap_or(&[]);
    let (xmin, xmax) = value_range(points.iter().map(|p| p.x), false);
    let (ymin, ymax) = value_range(points.iter().map(|p| p.y), false);
    let val_fmt = |v: &f64| format_value_tick(*v);

    let mut chart = ChartBuilder::on(area)
        .margin(16)
        .set_label_area_size(LabelAreaPosition::Left, 64)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(xmin..xmax, ymin..ymax)
        .map_err(|e| anyhow!("{:?}", e))?;

    chart
        .configure_mesh()
        .x_labels(10)
        .y_labels(10)
        .x_label_formatter(&val_fmt)
        .y_label_formatter(&val_fmt)
        .label_style(tick_style())
        .light_line_style(RGBColor(229, 231, 235).mix(0.5))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    if let Some(ds) = dataset {
        let color = hex_color(&ds.background_color);
        chart
            .draw_series(
                ds.data
                    .iter()
                    .map(|p| Circle::new((p.x, p.y), 4, color.filled())),
            )
            .map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}

/// Slices run clockwise from twelve o'clock; magnitudes are used, zero totals draw nothing.
fn draw_pie<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    n_labels: usize,
    dataset: Option<&PieDataset>,
) -> Result<()> {
    let Some(ds) = dataset else {
        return Ok(());
    };
    let values: Vec<f64> = ds
        .data
        .iter()
        .take(n_labels)
        .map(|v| if v.is_finite() { v.abs() } else { 0.0 })
        .collect();
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Ok(());
    }

    let (w, h) = area.dim_in_pixel();
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = ((w.min(h) as f64) / 2.0 - 16.0).max(8.0);
    let at = |theta: f64| -> (i32, i32) {
        (
            (cx + radius * theta.sin()).round() as i32,
            (cy - radius * theta.cos()).round() as i32,
        )
    };

    let mut start = 0.0f64;
    for (i, v) in values.iter().enumerate() {
        let sweep = v / total * std::f64::consts::TAU;
        if sweep <= 0.0 {
            continue;
        }
        let steps = ((sweep.to_degrees() / 2.0).ceil() as usize).max(1);
        let mut poly = Vec::with_capacity(steps + 2);
        poly.push((cx.round() as i32, cy.round() as i32));
        for s in 0..=steps {
            poly.push(at(start + sweep * s as f64 / steps as f64));
        }
        let color = ds
            .background_color
            .get(i)
            .map(|c| hex_color(c))
            .unwrap_or_else(|| hex_color(palette_color(i)));
        area.draw(&Polygon::new(poly.clone(), color.filled()))
            .map_err(|e| anyhow!("{:?}", e))?;
        poly.push(poly[0]);
        area.draw(&PathElement::new(poly, WHITE.stroke_width(1)))
            .map_err(|e| anyhow!("{:?}", e))?;
        start += sweep;
    }
    Ok(())
}
