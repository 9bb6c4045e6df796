//! Legend band drawn above the plot area.
//!
//! Items are packed greedily into centered rows. Labels wider than a third of the band are
//! truncated with an ellipsis. The height estimator and the drawing pass share [`layout_rows`],
//! so the band is never clipped.

use anyhow::Result;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::util::{estimate_text_width_px, truncate_to_width};

const FONT_PX: u32 = 14;
const LINE_H: i32 = FONT_PX as i32 + 4;
const ROW_GAP: i32 = 4;
const PAD_BAND: i32 = 8;
const SWATCH_W: i32 = 28;
const SWATCH_H: i32 = 10;
const SWATCH_TO_TEXT: i32 = 6;
const TRAILING_GAP: i32 = 16;

struct LegendRow {
    items: Vec<(String, i32)>,
    width: i32,
}

fn layout_rows<'a>(labels: impl IntoIterator<Item = &'a str>, band_w: i32) -> Vec<LegendRow> {
    let usable = (band_w - 2 * PAD_BAND).max(60);
    let text_cap = ((usable as f32) * 0.33).max(60.0) as u32;

    let mut rows: Vec<LegendRow> = Vec::new();
    let mut cur = LegendRow {
        items: Vec::new(),
        width: 0,
    };
    for label in labels {
        let text = truncate_to_width(label, FONT_PX, text_cap);
        let block_w =
            SWATCH_W + SWATCH_TO_TEXT + estimate_text_width_px(&text, FONT_PX) as i32 + TRAILING_GAP;
        if cur.width + block_w > usable && !cur.items.is_empty() {
            rows.push(std::mem::replace(
                &mut cur,
                LegendRow {
                    items: Vec::new(),
                    width: 0,
                },
            ));
        }
        cur.width += block_w;
        cur.items.push((text, block_w));
    }
    if !cur.items.is_empty() {
        rows.push(cur);
    }
    rows
}

/// Height in pixels of the legend band for `labels` at `band_w` width. Zero when empty.
pub fn legend_height_px(labels: &[String], band_w: i32) -> i32 {
    let rows = layout_rows(labels.iter().map(String::as_str), band_w);
    if rows.is_empty() {
        return 0;
    }
    let n = rows.len() as i32;
    2 * PAD_BAND + n * LINE_H + (n - 1) * ROW_GAP
}

/// Draw the legend band: a filled swatch followed by the label, rows centered horizontally.
pub fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    items: &[(String, RGBColor)],
) -> Result<()> {
    let (w, _) = area.dim_in_pixel();
    let rows = layout_rows(items.iter().map(|(l, _)| l.as_str()), w as i32);
    let label_style =
        TextStyle::from((FontFamily::SansSerif, FONT_PX)).pos(Pos::new(HPos::Left, VPos::Center));

    let mut colors = items.iter().map(|(_, c)| *c);
    let mut y_top = PAD_BAND;
    for row in rows {
        let y_center = y_top + LINE_H / 2;
        let mut x = ((w as i32) - row.width).max(0) / 2;
        for (text, block_w) in row.items {
            let color = colors.next().unwrap_or(BLACK);
            area.draw(&Rectangle::new(
                [
                    (x, y_center - SWATCH_H / 2),
                    (x + SWATCH_W, y_center + SWATCH_H / 2),
                ],
                color.filled(),
            ))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            area.draw(&Text::new(
                text,
                (x + SWATCH_W + SWATCH_TO_TEXT, y_center),
                label_style.clone(),
            ))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            x += block_w;
        }
        y_top += LINE_H + ROW_GAP;
    }
    Ok(())
}
